//! Event bus
//!
//! An explicit subscription registry: each subscriber gets an unbounded
//! channel and a numbered handle to unsubscribe with. Publishing never
//! blocks; receivers that have been dropped are pruned on the next
//! publish.

use std::collections::HashMap;
use std::sync::Mutex;

use templar_domain::{ResolvedVariable, VariableStatus};
use tokio::sync::mpsc;

/// One per-variable state transition.
#[derive(Debug, Clone)]
pub struct VariableEvent {
    /// Name of the variable that changed.
    pub variable: String,
    /// Status after the transition.
    pub status: VariableStatus,
    /// Full state after the transition.
    pub resolved: ResolvedVariable,
}

/// Handle identifying one subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::UnboundedSender<VariableEvent>>,
}

/// Per-session subscription registry for variable state transitions.
#[derive(Default)]
pub struct EventBus {
    registry: Mutex<Registry>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and returns its handle and receiving end.
    pub fn subscribe(
        &self,
    ) -> (SubscriptionHandle, mpsc::UnboundedReceiver<VariableEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, tx);
        (SubscriptionHandle(id), rx)
    }

    /// Removes a subscription. Unknown handles are ignored.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut registry = self.registry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        registry.subscribers.remove(&handle.0);
    }

    /// Publishes an event to every live subscriber.
    pub fn publish(&self, event: &VariableEvent) {
        let mut registry = self.registry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        registry
            .subscribers
            .retain(|_, tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let registry = self.registry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        registry.subscribers.len()
    }
}
