// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod behavior;
pub mod compose;
pub mod config;
pub mod fetch;
pub mod observe;
pub mod parse;
pub mod pipeline;
pub mod registry;
pub mod report;

use anyhow::Result;
use std::sync::Arc;

use crate::compose::ReportComposer;
use crate::config::PulseConfig;
use crate::fetch::{Fetcher, HttpTransport, Transport};
use crate::observe::{EventSink, TracingSink};
use crate::pipeline::{AnalysisContext, HandlerRegistry};

// ---- Re-exports for stable public API ----
pub use crate::registry::{SourceKind, SourceRegistry, SourceSpec};
pub use crate::report::{Report, SourceResult, Trend};

/// Wire a composer from configuration with an explicit transport and sink.
pub fn build_composer(
    cfg: &PulseConfig,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn EventSink>,
) -> ReportComposer {
    let fetcher = Fetcher::new(
        transport,
        Arc::new(cfg.credentials()),
        cfg.retry_policy(),
        Arc::clone(&sink),
    );
    ReportComposer::new(
        fetcher,
        HandlerRegistry::with_defaults(),
        AnalysisContext {
            keywords: cfg.keywords(),
        },
        cfg.compose_settings(),
        sink,
    )
}

/// One aggregation cycle over the configured registry using HTTP and the
/// tracing sink. Errors only on invalid configuration; per-source failures
/// are inside the report.
pub async fn run_once(cfg: &PulseConfig) -> Result<Report> {
    let registry = cfg.registry()?;
    let transport = Arc::new(HttpTransport::new(cfg.request_timeout())?);
    let composer = build_composer(cfg, transport, Arc::new(TracingSink));
    Ok(composer.compose(&registry).await)
}
