//! Resolution engine
//!
//! `VariableEngine` owns the variable store and orchestrates everything
//! that mutates it: wave-parallel initialization, user selection updates
//! with cascading re-resolution, and context-driven refresh. One engine
//! instance exists per session; nothing here is process-global.

mod store;

pub use store::VariableSnapshot;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use templar_domain::{
    ExecutionContext, RefreshTrigger, ResolvedVariable, ScopedVars, VariableDefinition,
    VariableKind, VariableOption, VariableStatus, validate_definitions,
};
use tokio::sync::{Mutex, RwLock, mpsc};

use crate::error::{EngineError, EngineResult};
use crate::events::{EventBus, SubscriptionHandle, VariableEvent};
use crate::graph::DependencyGraph;
use crate::interpolate::Interpolator;
use crate::ports::{DataSourceRegistry, QueryExecutor};
use crate::postprocess::postprocess;
use crate::resolvers::{ResolveDeps, resolver_for};

/// Per-variable outcome of [`VariableEngine::initialize_all`].
#[derive(Debug, Clone, Default)]
pub struct InitSummary {
    /// Final status of every variable after initialization.
    pub statuses: HashMap<String, VariableStatus>,
}

impl InitSummary {
    /// Status of one variable.
    #[must_use]
    pub fn status_of(&self, name: &str) -> Option<VariableStatus> {
        self.statuses.get(name).copied()
    }

    /// True when every variable reached `Done`.
    #[must_use]
    pub fn all_done(&self) -> bool {
        self.statuses.values().all(|s| *s == VariableStatus::Done)
    }
}

/// The per-session resolver/scheduler. Single writer of the store; all
/// reads go through [`VariableEngine::snapshot`].
pub struct VariableEngine {
    graph: DependencyGraph,
    store: RwLock<HashMap<String, ResolvedVariable>>,
    /// Per-variable resolution generation, for last-request-wins
    /// supersession. Lock ordering: generations before store.
    generations: Mutex<HashMap<String, u64>>,
    bus: EventBus,
    query_executor: Arc<dyn QueryExecutor>,
    datasources: Arc<dyn DataSourceRegistry>,
}

impl VariableEngine {
    /// Validates definitions, builds the dependency graph, and seeds the
    /// store with `NotStarted` entries.
    ///
    /// # Errors
    ///
    /// Returns a domain error on invalid or duplicate names, or
    /// [`EngineError::CyclicDependency`] when the references cycle. No
    /// partial state is committed on failure.
    pub fn new(
        definitions: Vec<VariableDefinition>,
        query_executor: Arc<dyn QueryExecutor>,
        datasources: Arc<dyn DataSourceRegistry>,
    ) -> EngineResult<Self> {
        validate_definitions(&definitions).map_err(EngineError::Domain)?;
        let graph = DependencyGraph::build(&definitions)?;

        let store: HashMap<String, ResolvedVariable> = definitions
            .into_iter()
            .map(|def| (def.name.clone(), ResolvedVariable::not_started(def)))
            .collect();

        Ok(Self {
            graph,
            store: RwLock::new(store),
            generations: Mutex::new(HashMap::new()),
            bus: EventBus::new(),
            query_executor,
            datasources,
        })
    }

    /// Resolves every variable wave by wave, in parallel within a wave.
    ///
    /// Collaborator failures never fail the call; they are reported as
    /// per-variable `Error` statuses in the summary.
    pub async fn initialize_all(&self, ctx: &ExecutionContext) -> InitSummary {
        self.complete_ad_hoc().await;

        let must_resolve: HashSet<String> = self.graph.members().iter().cloned().collect();
        self.run_waves(&must_resolve, HashSet::new(), ctx).await;

        let store = self.store.read().await;
        InitSummary {
            statuses: store
                .iter()
                .map(|(name, var)| (name.clone(), var.status))
                .collect(),
        }
    }

    /// Sets the current selection of `name`, then re-resolves its direct
    /// and transitive dependents. A reselection of the same value does
    /// not cascade.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownVariable`] for an unknown name and
    /// [`EngineError::SelectionNotAnOption`] when the selection value is
    /// not among the variable's options. Collaborator failures during the
    /// cascade are recorded as state, never returned.
    pub async fn update_value(
        &self,
        name: &str,
        option: VariableOption,
        ctx: &ExecutionContext,
    ) -> EngineResult<()> {
        let (changed, event) = {
            let mut generations = self.generations.lock().await;
            let mut store = self.store.write().await;
            let var = store
                .get_mut(name)
                .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))?;

            if !selection_matches_options(var, &option) {
                return Err(EngineError::SelectionNotAnOption {
                    variable: name.to_string(),
                    value: option.value.to_string(),
                });
            }

            // A direct selection supersedes any in-flight resolution of
            // this variable; that result must not land on top of the
            // newer selection.
            *generations.entry(name.to_string()).or_insert(0) += 1;

            let changed = var.current.as_ref().map(|c| &c.value) != Some(&option.value);
            let selected: Vec<String> = option.value.to_vec();
            for opt in &mut var.options {
                opt.selected = opt.value.values().any(|v| selected.iter().any(|s| s == v));
            }
            var.current = Some(option.selected());

            let event = VariableEvent {
                variable: name.to_string(),
                status: var.status,
                resolved: var.clone(),
            };
            (changed, event)
        };
        self.bus.publish(&event);

        if changed {
            let mut seeds = HashSet::new();
            seeds.insert(name.to_string());
            self.run_waves(&HashSet::new(), seeds, ctx).await;
        } else {
            tracing::debug!(variable = name, "selection unchanged, no cascade");
        }
        Ok(())
    }

    /// Re-resolves exactly the variables flagged `OnTimeRangeChange`,
    /// plus their transitive dependents whose inputs actually changed.
    pub async fn refresh_for_context_change(&self, ctx: &ExecutionContext) {
        let must_resolve: HashSet<String> = {
            let store = self.store.read().await;
            store
                .values()
                .filter(|v| v.definition.refresh == RefreshTrigger::OnTimeRangeChange)
                .map(|v| v.definition.name.clone())
                .collect()
        };
        self.run_waves(&must_resolve, HashSet::new(), ctx).await;
    }

    /// Takes a consistent read view of every variable.
    pub async fn snapshot(&self) -> VariableSnapshot {
        let store = self.store.read().await;
        VariableSnapshot::from_vars(store.clone())
    }

    /// Current state of one variable.
    pub async fn get(&self, name: &str) -> Option<ResolvedVariable> {
        self.store.read().await.get(name).cloned()
    }

    /// Interpolates reference tokens in `text` against the current store.
    pub async fn interpolate(&self, text: &str, ctx: &ExecutionContext) -> String {
        Interpolator::interpolate(text, &self.snapshot().await, ctx)
    }

    /// Interpolation with a request-local scoped overlay.
    pub async fn interpolate_scoped(
        &self,
        text: &str,
        ctx: &ExecutionContext,
        scoped: &ScopedVars,
    ) -> String {
        Interpolator::interpolate_scoped(text, &self.snapshot().await, ctx, scoped)
    }

    /// Subscribes to per-variable state transitions.
    pub fn subscribe(
        &self,
    ) -> (SubscriptionHandle, mpsc::UnboundedReceiver<VariableEvent>) {
        self.bus.subscribe()
    }

    /// Removes a subscription.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.bus.unsubscribe(handle);
    }

    /// Ad-hoc variables take no part in resolution; they complete
    /// immediately at initialization.
    async fn complete_ad_hoc(&self) {
        let mut events = Vec::new();
        {
            let mut store = self.store.write().await;
            for var in store.values_mut() {
                if var.definition.kind == VariableKind::AdHoc
                    && var.status == VariableStatus::NotStarted
                {
                    var.complete(Vec::new(), None);
                    events.push(VariableEvent {
                        variable: var.definition.name.clone(),
                        status: var.status,
                        resolved: var.clone(),
                    });
                }
            }
        }
        for event in &events {
            self.bus.publish(event);
        }
    }

    /// Walks the topological waves, resolving every member that either
    /// must resolve or has a direct dependency whose value changed.
    /// Members of one wave resolve concurrently.
    async fn run_waves(
        &self,
        must_resolve: &HashSet<String>,
        mut changed: HashSet<String>,
        ctx: &ExecutionContext,
    ) {
        for wave in self.graph.waves() {
            let batch: Vec<&String> = wave
                .iter()
                .filter(|name| {
                    must_resolve.contains(*name)
                        || self
                            .graph
                            .depends_on(name)
                            .iter()
                            .any(|dep| changed.contains(dep))
                })
                .collect();
            if batch.is_empty() {
                continue;
            }
            tracing::debug!(wave = ?batch, "resolving wave");

            let results = join_all(batch.iter().map(|name| self.resolve_one(name, ctx))).await;
            for (name, outcome) in batch.into_iter().zip(results) {
                if outcome == Some(true) {
                    changed.insert(name.clone());
                }
            }
        }
    }

    /// Resolves one variable end to end: Loading transition, kind
    /// resolution, post-processing, commit, events.
    ///
    /// Returns `Some(true)` when the committed selection value differs
    /// from the previous one, `Some(false)` otherwise, and `None` when
    /// the result was superseded by a newer resolution and discarded.
    async fn resolve_one(&self, name: &str, ctx: &ExecutionContext) -> Option<bool> {
        let my_generation = {
            let mut generations = self.generations.lock().await;
            let entry = generations.entry(name.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        let (def, prev_current, loading_event) = {
            let mut store = self.store.write().await;
            let var = store.get_mut(name)?;
            var.begin_loading();
            (
                var.definition.clone(),
                var.current.clone(),
                VariableEvent {
                    variable: name.to_string(),
                    status: var.status,
                    resolved: var.clone(),
                },
            )
        };
        self.bus.publish(&loading_event);

        let snapshot = self.snapshot().await;
        let previous = snapshot.get(name).cloned();
        let deps = ResolveDeps {
            query_executor: self.query_executor.as_ref(),
            datasources: self.datasources.as_ref(),
            snapshot: &snapshot,
            previous: previous.as_ref(),
        };
        let result = resolver_for(def.kind).resolve(&def, &deps, ctx).await;

        let generations = self.generations.lock().await;
        if generations.get(name).copied() != Some(my_generation) {
            tracing::debug!(variable = name, "stale resolution discarded");
            return None;
        }

        let (changed, event) = {
            let mut store = self.store.write().await;
            let var = store.get_mut(name)?;
            let changed = match result {
                Ok(raw) => {
                    let (options, current) = postprocess(raw, &def, prev_current.as_ref());
                    let changed = current.as_ref().map(|c| &c.value)
                        != prev_current.as_ref().map(|c| &c.value);
                    var.complete(options, current);
                    changed
                }
                Err(err) => {
                    tracing::warn!(variable = name, error = %err, "resolution failed");
                    var.fail(err.to_string());
                    // An error with an unchanged value does not cascade.
                    false
                }
            };
            (
                changed,
                VariableEvent {
                    variable: name.to_string(),
                    status: var.status,
                    resolved: var.clone(),
                },
            )
        };
        drop(generations);
        self.bus.publish(&event);
        Some(changed)
    }
}

/// A selection is valid when every value is a member of the resolved
/// options. Text-box variables carry free text, a not-yet-resolved option
/// list cannot be checked, and the multi "none selected" sentinel is
/// always allowed.
fn selection_matches_options(var: &ResolvedVariable, option: &VariableOption) -> bool {
    if var.definition.kind == VariableKind::TextBox || var.options.is_empty() {
        return true;
    }
    if option.is_none_sentinel() {
        return true;
    }
    option
        .value
        .values()
        .all(|value| var.options.iter().any(|o| o.value.contains(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{DataSourceInfo, MetricFindValue};
    use crate::resolvers::testsupport::{MockExecutor, MockRegistry};
    use pretty_assertions::assert_eq;
    use templar_domain::{OptionValue, SortMode};

    fn engine_with(
        definitions: Vec<VariableDefinition>,
        executor: MockExecutor,
        registry: MockRegistry,
    ) -> (VariableEngine, Arc<MockExecutor>) {
        let executor = Arc::new(executor);
        let engine = VariableEngine::new(
            definitions,
            Arc::clone(&executor) as Arc<dyn QueryExecutor>,
            Arc::new(registry),
        )
        .unwrap();
        (engine, executor)
    }

    fn call_count(executor: &MockExecutor) -> usize {
        executor.calls.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let defs = vec![
            VariableDefinition::custom("region", "eu,us").with_sort(SortMode::AlphabeticalAsc),
            VariableDefinition::constant("env", "prod"),
        ];
        let (engine, _) = engine_with(defs, MockExecutor::default(), MockRegistry::default());
        let ctx = ExecutionContext::fixed();

        let first = engine.initialize_all(&ctx).await;
        assert!(first.all_done());
        let snap_a = engine.snapshot().await;

        let second = engine.initialize_all(&ctx).await;
        assert!(second.all_done());
        let snap_b = engine.snapshot().await;

        for name in ["region", "env"] {
            assert_eq!(snap_a.get(name).unwrap().options, snap_b.get(name).unwrap().options);
            assert_eq!(snap_a.get(name).unwrap().current, snap_b.get(name).unwrap().current);
        }
    }

    #[tokio::test]
    async fn test_cycle_fails_construction_wholesale() {
        let defs = vec![
            VariableDefinition::custom("a", "$b"),
            VariableDefinition::custom("b", "$a"),
        ];
        let err = VariableEngine::new(
            defs,
            Arc::new(MockExecutor::default()),
            Arc::new(MockRegistry::default()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, EngineError::CyclicDependency { .. }));
    }

    #[tokio::test]
    async fn test_update_cascades_to_dependents_only() {
        let mut executor = MockExecutor::default();
        executor
            .responses
            .insert("metrics_a".to_string(), vec![MetricFindValue::new("m1")]);
        executor
            .responses
            .insert("metrics_b".to_string(), vec![MetricFindValue::new("m2")]);
        executor
            .responses
            .insert("unrelated".to_string(), vec![MetricFindValue::new("u")]);

        let defs = vec![
            VariableDefinition::custom("sel", "a,b"),
            VariableDefinition::query("dep", "metrics_$sel", "uid"),
            VariableDefinition::query("other", "unrelated", "uid"),
        ];
        let (engine, executor) = engine_with(defs, executor, MockRegistry::default());
        let ctx = ExecutionContext::fixed();

        engine.initialize_all(&ctx).await;
        // One call each for dep and other.
        assert_eq!(call_count(&executor), 2);

        engine
            .update_value("sel", VariableOption::from_value("b"), &ctx)
            .await
            .unwrap();

        // Only dep re-resolved; other untouched.
        assert_eq!(call_count(&executor), 3);
        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.last().unwrap().0, "metrics_b");
        drop(calls);

        let dep = engine.get("dep").await.unwrap();
        assert_eq!(dep.current.unwrap().value, OptionValue::from("m2"));
    }

    #[tokio::test]
    async fn test_noop_reselection_does_not_cascade() {
        let mut executor = MockExecutor::default();
        executor
            .responses
            .insert("metrics_a".to_string(), vec![MetricFindValue::new("m1")]);
        let defs = vec![
            VariableDefinition::custom("sel", "a,b"),
            VariableDefinition::query("dep", "metrics_$sel", "uid"),
        ];
        let (engine, executor) = engine_with(defs, executor, MockRegistry::default());
        let ctx = ExecutionContext::fixed();

        engine.initialize_all(&ctx).await;
        let initial = call_count(&executor);

        // "a" is already the current selection after initialization.
        engine
            .update_value("sel", VariableOption::from_value("a"), &ctx)
            .await
            .unwrap();
        assert_eq!(call_count(&executor), initial);
    }

    #[tokio::test]
    async fn test_unknown_variable_update_is_an_error() {
        let (engine, _) = engine_with(
            vec![VariableDefinition::constant("a", "1")],
            MockExecutor::default(),
            MockRegistry::default(),
        );
        let err = engine
            .update_value("ghost", VariableOption::from_value("x"), &ExecutionContext::fixed())
            .await
            .err()
            .unwrap();
        assert_eq!(err, EngineError::UnknownVariable("ghost".to_string()));
    }

    #[tokio::test]
    async fn test_collaborator_failure_is_isolated() {
        let mut executor = MockExecutor::default();
        executor.fail_with = Some("boom".to_string());
        let defs = vec![
            VariableDefinition::query("broken", "q", "uid"),
            VariableDefinition::custom("fine", "a,b"),
        ];
        let (engine, _) = engine_with(defs, executor, MockRegistry::default());
        let ctx = ExecutionContext::fixed();

        let summary = engine.initialize_all(&ctx).await;
        assert_eq!(summary.status_of("broken"), Some(VariableStatus::Error));
        assert_eq!(summary.status_of("fine"), Some(VariableStatus::Done));

        let broken = engine.get("broken").await.unwrap();
        assert_eq!(broken.error.as_deref(), Some("backend error: boom"));
    }

    #[tokio::test]
    async fn test_failed_refresh_retains_previous_options() {
        use std::sync::atomic::{AtomicBool, Ordering};

        /// Succeeds until `fail` is flipped, then errors every call.
        struct FlakyExecutor {
            fail: AtomicBool,
        }

        #[async_trait::async_trait]
        impl QueryExecutor for FlakyExecutor {
            async fn metric_find_query(
                &self,
                _query: &str,
                _datasource: Option<&str>,
                _ctx: &ExecutionContext,
            ) -> Result<Vec<MetricFindValue>, crate::ports::PortError> {
                if self.fail.load(Ordering::SeqCst) {
                    Err(crate::ports::PortError::Timeout)
                } else {
                    Ok(vec![MetricFindValue::new("v1")])
                }
            }
        }

        let executor = Arc::new(FlakyExecutor {
            fail: AtomicBool::new(false),
        });
        let defs = vec![VariableDefinition::query("x", "q", "uid")
            .with_refresh(RefreshTrigger::OnTimeRangeChange)];
        let engine = VariableEngine::new(
            defs,
            Arc::clone(&executor) as Arc<dyn QueryExecutor>,
            Arc::new(MockRegistry::default()),
        )
        .unwrap();
        let ctx = ExecutionContext::fixed();

        engine.initialize_all(&ctx).await;
        assert_eq!(engine.get("x").await.unwrap().options.len(), 1);

        executor.fail.store(true, Ordering::SeqCst);
        engine.refresh_for_context_change(&ctx).await;

        let var = engine.get("x").await.unwrap();
        assert_eq!(var.status, VariableStatus::Error);
        assert_eq!(var.error.as_deref(), Some("collaborator timed out"));
        // Stale options survive a failed refresh.
        assert_eq!(var.options.len(), 1);
        assert_eq!(var.current.unwrap().value, OptionValue::from("v1"));
    }

    #[tokio::test]
    async fn test_refresh_targets_flagged_variables() {
        let mut executor = MockExecutor::default();
        executor
            .responses
            .insert("fresh".to_string(), vec![MetricFindValue::new("f")]);
        executor
            .responses
            .insert("stale".to_string(), vec![MetricFindValue::new("s")]);
        let defs = vec![
            VariableDefinition::query("on_time", "fresh", "uid")
                .with_refresh(RefreshTrigger::OnTimeRangeChange),
            VariableDefinition::query("on_load", "stale", "uid"),
        ];
        let (engine, executor) = engine_with(defs, executor, MockRegistry::default());
        let ctx = ExecutionContext::fixed();

        engine.initialize_all(&ctx).await;
        let after_init = call_count(&executor);

        engine.refresh_for_context_change(&ctx).await;
        // Exactly one extra call, for the flagged variable.
        assert_eq!(call_count(&executor), after_init + 1);
        assert_eq!(executor.calls.lock().unwrap().last().unwrap().0, "fresh");
    }

    #[tokio::test]
    async fn test_datasource_then_query_end_to_end() {
        let mut executor = MockExecutor::default();
        executor.responses.insert(
            "label_values(up,instance)".to_string(),
            vec![MetricFindValue::new("web-01"), MetricFindValue::new("web-02")],
        );
        let registry = MockRegistry {
            entries: vec![
                DataSourceInfo::new("uid-prom", "Prometheus", "prometheus"),
                DataSourceInfo::new("uid-graphite", "Graphite", "graphite"),
            ],
        };
        let defs = vec![
            VariableDefinition::datasource_list("ds", "prometheus"),
            VariableDefinition::query("host", "label_values(up,instance)", "$ds"),
        ];
        let (engine, executor) = engine_with(defs, executor, registry);
        let ctx = ExecutionContext::fixed();

        let summary = engine.initialize_all(&ctx).await;
        assert!(summary.all_done());

        let ds = engine.get("ds").await.unwrap();
        assert_eq!(ds.options.len(), 1);
        assert_eq!(ds.current.unwrap().value, OptionValue::from("uid-prom"));

        // The executor saw the literal uid, not the `$ds` token.
        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls[0].1.as_deref(), Some("uid-prom"));
        drop(calls);

        let host = engine.get("host").await.unwrap();
        assert_eq!(host.options.len(), 2);
        assert_eq!(
            engine.interpolate("up{instance=\"$host\"}", &ctx).await,
            "up{instance=\"web-01\"}"
        );
    }

    #[tokio::test]
    async fn test_events_track_status_transitions() {
        let defs = vec![VariableDefinition::constant("c", "v")];
        let (engine, _) = engine_with(defs, MockExecutor::default(), MockRegistry::default());
        let (handle, mut rx) = engine.subscribe();

        engine.initialize_all(&ExecutionContext::fixed()).await;

        let first = rx.try_recv().unwrap();
        assert_eq!(first.variable, "c");
        assert_eq!(first.status, VariableStatus::Loading);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.status, VariableStatus::Done);
        engine.unsubscribe(handle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_request_wins() {
        use std::time::Duration;

        /// Executor whose response delay and payload depend on the query.
        struct SlowExecutor;

        #[async_trait::async_trait]
        impl QueryExecutor for SlowExecutor {
            async fn metric_find_query(
                &self,
                query: &str,
                _datasource: Option<&str>,
                _ctx: &ExecutionContext,
            ) -> Result<Vec<MetricFindValue>, crate::ports::PortError> {
                let (delay, payload) = match query {
                    "metrics_slow" => (Duration::from_millis(100), "old"),
                    "metrics_fast" => (Duration::from_millis(10), "new"),
                    _ => (Duration::ZERO, "init"),
                };
                tokio::time::sleep(delay).await;
                Ok(vec![MetricFindValue::new(payload)])
            }
        }

        let defs = vec![
            VariableDefinition::custom("speed", "init,slow,fast"),
            VariableDefinition::query("dep", "metrics_$speed", "uid"),
        ];
        let engine = Arc::new(
            VariableEngine::new(
                defs,
                Arc::new(SlowExecutor),
                Arc::new(MockRegistry::default()),
            )
            .unwrap(),
        );
        let ctx = ExecutionContext::fixed();
        engine.initialize_all(&ctx).await;

        let slow = {
            let engine = Arc::clone(&engine);
            let ctx = ctx.clone();
            tokio::spawn(async move {
                engine
                    .update_value("speed", VariableOption::from_value("slow"), &ctx)
                    .await
            })
        };
        // Let the slow cascade reach its collaborator call first.
        tokio::time::sleep(Duration::from_millis(1)).await;
        let fast = {
            let engine = Arc::clone(&engine);
            let ctx = ctx.clone();
            tokio::spawn(async move {
                engine
                    .update_value("speed", VariableOption::from_value("fast"), &ctx)
                    .await
            })
        };

        slow.await.unwrap().unwrap();
        fast.await.unwrap().unwrap();

        // The slow (superseded) result arrived last but was discarded.
        let dep = engine.get("dep").await.unwrap();
        assert_eq!(dep.current.unwrap().value, OptionValue::from("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_selection_survives_in_flight_refresh() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        /// Answers the first call immediately, then delays every later
        /// call long enough for a selection to land mid-flight.
        struct DelayedExecutor {
            calls: AtomicUsize,
        }

        #[async_trait::async_trait]
        impl QueryExecutor for DelayedExecutor {
            async fn metric_find_query(
                &self,
                _query: &str,
                _datasource: Option<&str>,
                _ctx: &ExecutionContext,
            ) -> Result<Vec<MetricFindValue>, crate::ports::PortError> {
                if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Ok(vec![MetricFindValue::new("a"), MetricFindValue::new("b")])
            }
        }

        let defs = vec![VariableDefinition::query("x", "series", "uid")
            .with_refresh(RefreshTrigger::OnTimeRangeChange)];
        let engine = Arc::new(
            VariableEngine::new(
                defs,
                Arc::new(DelayedExecutor {
                    calls: AtomicUsize::new(0),
                }),
                Arc::new(MockRegistry::default()),
            )
            .unwrap(),
        );
        let ctx = ExecutionContext::fixed();
        engine.initialize_all(&ctx).await;
        assert_eq!(
            engine.get("x").await.unwrap().current.unwrap().value,
            OptionValue::from("a")
        );

        let refresh = {
            let engine = Arc::clone(&engine);
            let ctx = ctx.clone();
            tokio::spawn(async move { engine.refresh_for_context_change(&ctx).await })
        };
        // Select while the refresh result is still in flight.
        tokio::time::sleep(Duration::from_millis(10)).await;
        engine
            .update_value("x", VariableOption::from_value("b"), &ctx)
            .await
            .unwrap();
        refresh.await.unwrap();

        // The stale refresh result was discarded, not committed over the
        // newer selection.
        let x = engine.get("x").await.unwrap();
        assert_eq!(x.current.unwrap().value, OptionValue::from("b"));
    }

    #[tokio::test]
    async fn test_selection_must_match_an_option() {
        let (engine, _) = engine_with(
            vec![VariableDefinition::custom("sel", "a,b")],
            MockExecutor::default(),
            MockRegistry::default(),
        );
        let ctx = ExecutionContext::fixed();
        engine.initialize_all(&ctx).await;

        let err = engine
            .update_value("sel", VariableOption::from_value("z"), &ctx)
            .await
            .err()
            .unwrap();
        assert_eq!(
            err,
            EngineError::SelectionNotAnOption {
                variable: "sel".to_string(),
                value: "z".to_string(),
            }
        );
        // The stored selection is untouched by the rejected update.
        assert_eq!(
            engine.get("sel").await.unwrap().current.unwrap().value,
            OptionValue::from("a")
        );
    }

    #[tokio::test]
    async fn test_textbox_accepts_free_text_selection() {
        let (engine, _) = engine_with(
            vec![VariableDefinition::text_box("filter", "*.log")],
            MockExecutor::default(),
            MockRegistry::default(),
        );
        let ctx = ExecutionContext::fixed();
        engine.initialize_all(&ctx).await;

        engine
            .update_value("filter", VariableOption::from_value("error.log"), &ctx)
            .await
            .unwrap();
        assert_eq!(
            engine.get("filter").await.unwrap().current.unwrap().value,
            OptionValue::from("error.log")
        );
    }
}
