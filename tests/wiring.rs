// tests/wiring.rs
// Configuration → composer wiring, without network.

mod common;

use common::{fixture_json, ScriptedTransport};
use market_pulse::config::PulseConfig;
use market_pulse::observe::MemorySink;
use market_pulse::report::{ErrorStage, SourceResult};
use std::io::Write;
use std::sync::Arc;

const CONFIG: &str = r#"
[retry]
max_retries = 0

[sentiment]
keywords = ["rally", "bullish"]

[credentials]
alphavantage = "literal-av-key"

[[sources]]
id = "alphavantage"
kind = "price-series"
endpoint = "https://av.test/query?apikey={credential}"
credential_key = "alphavantage"

[[sources]]
id = "newsapi"
kind = "news"
endpoint = "https://news.test/top?apiKey={credential}"
credential_key = "newsapi"
"#;

#[tokio::test]
async fn config_file_drives_the_composer() {
    let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    f.write_all(CONFIG.as_bytes()).unwrap();
    let cfg = PulseConfig::load_from(f.path()).unwrap();

    let transport = Arc::new(
        ScriptedTransport::new()
            .script("alphavantage", vec![Ok(fixture_json("alphavantage_daily.json"))])
            .script("newsapi", vec![Ok(fixture_json("newsapi_top.json"))]),
    );
    let composer = market_pulse::build_composer(&cfg, transport.clone(), Arc::new(MemorySink::new()));
    let report = composer.compose(&cfg.registry().unwrap()).await;

    assert!(matches!(report.results["alphavantage"], SourceResult::PriceAnalysis { .. }));
    // newsapi has no credential configured → fetch error, never sent
    match &report.results["newsapi"] {
        SourceResult::Error { stage, message } => {
            assert_eq!(*stage, ErrorStage::Fetch);
            assert!(message.starts_with("permanent failure:"), "{message}");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(transport.calls("newsapi"), 0);
}

#[tokio::test]
async fn report_json_shape() {
    let mut cfg = PulseConfig::default();
    cfg.credentials.insert("alphavantage".into(), "a".into());
    cfg.credentials.insert("newsapi".into(), "b".into());

    let transport = Arc::new(
        ScriptedTransport::new()
            .script("alphavantage", vec![Ok(fixture_json("alphavantage_daily.json"))])
            .script("newsapi", vec![Ok(fixture_json("newsapi_top.json"))]),
    );
    let report = market_pulse::build_composer(&cfg, transport, Arc::new(MemorySink::new()))
        .compose(&cfg.registry().unwrap())
        .await;
    let v = serde_json::to_value(&report).unwrap();

    assert!(v["generated_at"].is_string());
    assert_eq!(v["results"]["alphavantage"]["type"], "price_analysis");
    assert_eq!(v["results"]["alphavantage"]["trend"], "up");
    assert_eq!(v["results"]["newsapi"]["type"], "news_analysis");
    assert_eq!(v["results"]["newsapi"]["articles"], 4);
    assert_eq!(v["results"]["newsapi"]["sentiment"], 0.5);
}
