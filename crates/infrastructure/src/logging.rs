//! Event-stream logging.

use templar_application::VariableEvent;
use templar_domain::VariableStatus;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Drains an engine event subscription into structured log records.
///
/// Runs until the sending side (the engine) is dropped. The returned
/// handle lets a host await orderly shutdown.
pub fn spawn_event_logger(mut events: UnboundedReceiver<VariableEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let current = event
                .resolved
                .current
                .as_ref()
                .map(|option| option.text.clone());
            match event.status {
                VariableStatus::Error => tracing::warn!(
                    variable = event.variable,
                    error = event.resolved.error.as_deref().unwrap_or("unknown"),
                    "variable failed"
                ),
                status => tracing::info!(
                    variable = event.variable,
                    status = ?status,
                    options = event.resolved.options.len(),
                    ?current,
                    "variable transitioned"
                ),
            }
        }
        tracing::debug!("event stream closed");
    })
}
