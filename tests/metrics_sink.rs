// tests/metrics_sink.rs
#![cfg(feature = "strict-metrics")]

mod common;

use common::{fixture_json, ScriptedTransport};
use market_pulse::config::PulseConfig;
use market_pulse::observe::TracingSink;
use market_pulse::registry::{SourceKind, SourceRegistry, SourceSpec};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;

#[tokio::test]
async fn pipeline_series_exposed_after_compose() {
    // Install a local recorder for the test
    let handle = PrometheusBuilder::new().install_recorder().expect("recorder");

    let transport = ScriptedTransport::new()
        .script("news", vec![Ok(fixture_json("newsapi_top.json"))]);
    let composer =
        market_pulse::build_composer(&PulseConfig::default(), Arc::new(transport), Arc::new(TracingSink));
    let registry = SourceRegistry::new(vec![
        SourceSpec::new("news", SourceKind::News, "https://news.test/top"),
        // no script → permanent failure
        SourceSpec::new("dead", SourceKind::News, "https://dead.test/"),
    ])
    .unwrap();

    let report = composer.compose(&registry).await;
    assert_eq!(report.results.len(), 2);

    let out = handle.render();
    assert!(out.contains("pulse_fetch_attempts_total"));
    assert!(out.contains("pulse_fetch_failures_total"));
    assert!(out.contains("pulse_source_results_total"));
    assert!(out.contains("pulse_compose_ms"));
}
