//! Full-stack scenarios: engine wired to the in-memory adapters.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use templar_application::{
    DataSourceInfo, DataSourceRegistry, MetricFindValue, QueryExecutor, VariableEngine,
};
use templar_domain::{
    ExecutionContext, OptionValue, RefreshTrigger, ScopedValue, ScopedVars, SortMode,
    VariableDefinition, VariableOption, VariableStatus,
};
use templar_infrastructure::{
    FailingQueryExecutor, InMemoryDataSourceRegistry, StaticQueryExecutor,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("templar=debug")
        .with_test_writer()
        .try_init();
}

fn dashboard_registry() -> InMemoryDataSourceRegistry {
    InMemoryDataSourceRegistry::new(vec![
        DataSourceInfo::new("uid-prom", "Prometheus", "prometheus"),
        DataSourceInfo::new("uid-loki", "Loki", "loki"),
    ])
}

#[tokio::test]
async fn test_datasource_chain_resolves_and_interpolates() {
    init_tracing();
    let mut executor = StaticQueryExecutor::default();
    executor.respond(
        "label_values(up, instance)",
        vec![
            MetricFindValue::new("web-02"),
            MetricFindValue::new("web-01"),
        ],
    );
    let executor = Arc::new(executor);

    let definitions = vec![
        VariableDefinition::datasource_list("ds", "prometheus"),
        VariableDefinition::query("host", "label_values(up, instance)", "$ds")
            .with_sort(SortMode::AlphabeticalAsc)
            .with_multi()
            .with_include_all(None),
    ];
    let engine = VariableEngine::new(
        definitions,
        Arc::clone(&executor) as Arc<dyn QueryExecutor>,
        Arc::new(dashboard_registry()),
    )
    .unwrap();
    let ctx = ExecutionContext::fixed();

    let summary = engine.initialize_all(&ctx).await;
    assert!(summary.all_done());

    // The executor saw the interpolated uid, never the `$ds` token.
    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].datasource.as_deref(), Some("uid-prom"));

    // All option injected up front, remaining options sorted.
    let host = engine.get("host").await.unwrap();
    assert_eq!(host.options[0].text, OptionValue::from("All"));
    assert_eq!(host.options[1].text, OptionValue::from("web-01"));
    assert_eq!(host.options[2].text, OptionValue::from("web-02"));

    // All expands to the real values under a format.
    engine
        .update_value("host", VariableOption::all(None), &ctx)
        .await
        .unwrap();
    assert_eq!(
        engine.interpolate("up{instance=~\"${host:regex}\"}", &ctx).await,
        "up{instance=~\"(web\\-01|web\\-02)\"}"
    );
}

#[tokio::test]
async fn test_selection_cascades_only_where_values_changed() {
    init_tracing();
    let mut executor = StaticQueryExecutor::default();
    executor.respond("apps_in_eu", vec![MetricFindValue::new("checkout")]);
    executor.respond("apps_in_us", vec![MetricFindValue::new("billing")]);
    executor.respond("pods_of_checkout", vec![MetricFindValue::new("pod-1")]);
    executor.respond("pods_of_billing", vec![MetricFindValue::new("pod-9")]);
    executor.respond("version", vec![MetricFindValue::new("v42")]);
    let executor = Arc::new(executor);

    let definitions = vec![
        VariableDefinition::custom("region", "eu,us"),
        VariableDefinition::query("app", "apps_in_$region", "uid-prom"),
        VariableDefinition::query("pod", "pods_of_$app", "uid-prom"),
        VariableDefinition::query("build", "version", "uid-prom"),
    ];
    let engine = VariableEngine::new(
        definitions,
        Arc::clone(&executor) as Arc<dyn QueryExecutor>,
        Arc::new(dashboard_registry()),
    )
    .unwrap();
    let ctx = ExecutionContext::fixed();

    engine.initialize_all(&ctx).await;
    // app, pod, and build each resolved once.
    assert_eq!(executor.calls().len(), 3);

    engine
        .update_value("region", VariableOption::from_value("us"), &ctx)
        .await
        .unwrap();

    // The cascade touched app then pod; build stayed untouched.
    let calls = executor.calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[3].query, "apps_in_us");
    assert_eq!(calls[4].query, "pods_of_billing");

    let pod = engine.get("pod").await.unwrap();
    assert_eq!(pod.current.unwrap().value, OptionValue::from("pod-9"));
}

#[tokio::test]
async fn test_backend_failure_stays_per_variable() {
    let definitions = vec![
        VariableDefinition::query("broken", "anything", "uid-prom"),
        VariableDefinition::custom("region", "eu,us"),
        VariableDefinition::constant("env", "prod"),
    ];
    let engine = VariableEngine::new(
        definitions,
        Arc::new(FailingQueryExecutor::new("prometheus down")),
        Arc::new(dashboard_registry()),
    )
    .unwrap();
    let ctx = ExecutionContext::fixed();

    let summary = engine.initialize_all(&ctx).await;
    assert_eq!(summary.status_of("broken"), Some(VariableStatus::Error));
    assert_eq!(summary.status_of("region"), Some(VariableStatus::Done));
    assert_eq!(summary.status_of("env"), Some(VariableStatus::Done));

    let broken = engine.get("broken").await.unwrap();
    assert_eq!(
        broken.error.as_deref(),
        Some("backend error: prometheus down")
    );

    // Siblings remain fully usable.
    assert_eq!(engine.interpolate("$env/$region", &ctx).await, "prod/eu");
}

#[tokio::test]
async fn test_scoped_overrides_and_builtins() {
    let definitions = vec![VariableDefinition::custom("region", "eu,us")];
    let engine = VariableEngine::new(
        definitions,
        Arc::new(StaticQueryExecutor::default()),
        Arc::new(dashboard_registry()),
    )
    .unwrap();
    let ctx = ExecutionContext::fixed();
    engine.initialize_all(&ctx).await;

    // Built-ins resolve from the context without any stored variable.
    assert_eq!(
        engine.interpolate("rate(up[$__interval])", &ctx).await,
        "rate(up[2m])"
    );

    let mut scoped = ScopedVars::new();
    scoped.insert("region".to_string(), ScopedValue::new("ap-south"));
    assert_eq!(
        engine
            .interpolate_scoped("traffic{region=\"$region\"}", &ctx, &scoped)
            .await,
        "traffic{region=\"ap-south\"}"
    );
    // The stored selection is untouched by scoped interpolation.
    assert_eq!(engine.interpolate("$region", &ctx).await, "eu");
}

#[tokio::test]
async fn test_time_range_refresh_reresolves_flagged_queries() {
    let mut executor = StaticQueryExecutor::default();
    executor.respond("series_live", vec![MetricFindValue::new("s1")]);
    executor.respond("series_static", vec![MetricFindValue::new("s2")]);
    let executor = Arc::new(executor);

    let definitions = vec![
        VariableDefinition::query("live", "series_live", "uid-prom")
            .with_refresh(RefreshTrigger::OnTimeRangeChange),
        VariableDefinition::query("static", "series_static", "uid-prom"),
    ];
    let engine = VariableEngine::new(
        definitions,
        Arc::clone(&executor) as Arc<dyn QueryExecutor>,
        Arc::new(dashboard_registry()),
    )
    .unwrap();

    let ctx = ExecutionContext::fixed();
    engine.initialize_all(&ctx).await;
    assert_eq!(executor.calls().len(), 2);

    let shifted = ExecutionContext::new(ctx.time_range);
    engine.refresh_for_context_change(&shifted).await;

    let calls = executor.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2].query, "series_live");
}

#[tokio::test]
async fn test_registry_port_contract() {
    let registry = dashboard_registry();
    let filtered = registry.list(Some("loki")).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].uid, "uid-loki");
}
