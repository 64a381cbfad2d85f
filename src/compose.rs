//! # Report Composer
//! Runs fetch → parse → analyze for every registered source and assembles
//! the report.
//!
//! Sources run concurrently (bounded by a semaphore) and share nothing but
//! read-only configuration. Any per-source failure becomes an `Error` entry
//! for that source only; `compose` itself never fails and always returns
//! exactly one result per registered source.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::{FetchOutcome, Fetcher};
use crate::observe::{Event, EventSink};
use crate::pipeline::{AnalysisContext, HandlerRegistry, KindHandler};
use crate::registry::{SourceRegistry, SourceSpec};
use crate::report::{ErrorStage, Report, SourceResult};

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeSettings {
    /// Upper bound on sources processed at once (>= 1).
    pub max_concurrency: usize,
    /// Whole-composition deadline; unresolved sources become `Error{timeout}`.
    pub timeout: Option<Duration>,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout: None,
        }
    }
}

pub struct ReportComposer {
    fetcher: Arc<Fetcher>,
    handlers: HandlerRegistry,
    ctx: Arc<AnalysisContext>,
    settings: ComposeSettings,
    sink: Arc<dyn EventSink>,
}

impl ReportComposer {
    pub fn new(
        fetcher: Fetcher,
        handlers: HandlerRegistry,
        ctx: AnalysisContext,
        settings: ComposeSettings,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            handlers,
            ctx: Arc::new(ctx),
            settings,
            sink,
        }
    }

    pub async fn compose(&self, registry: &SourceRegistry) -> Report {
        // Set once, before any source starts.
        let generated_at = Utc::now();
        let t0 = Instant::now();

        let permits = self
            .settings
            .max_concurrency
            .clamp(1, registry.len().max(1));
        let sem = Arc::new(Semaphore::new(permits));

        let mut tasks = JoinSet::new();
        for spec in registry.iter() {
            let spec = spec.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let handler = self.handlers.get(spec.kind);
            let ctx = Arc::clone(&self.ctx);
            let sink = Arc::clone(&self.sink);
            let sem = Arc::clone(&sem);
            tasks.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                let result = run_source(&fetcher, handler.as_deref(), &ctx, &spec).await;
                record_done(sink.as_ref(), &spec, &result);
                (spec.identifier, result)
            });
        }

        let mut results = BTreeMap::new();
        let timed_out = match self.settings.timeout {
            Some(limit) => tokio::time::timeout(limit, collect(&mut tasks, &mut results))
                .await
                .is_err(),
            None => {
                collect(&mut tasks, &mut results).await;
                false
            }
        };

        if timed_out {
            tasks.abort_all();
            // Keep anything that finished before the abort landed.
            collect(&mut tasks, &mut results).await;
        }

        for spec in registry.iter() {
            if results.contains_key(&spec.identifier) {
                continue;
            }
            let result = if timed_out {
                SourceResult::error(ErrorStage::Timeout, "composition deadline elapsed before the source resolved")
            } else {
                SourceResult::error(ErrorStage::Aborted, "source task ended without a result")
            };
            record_done(self.sink.as_ref(), spec, &result);
            results.insert(spec.identifier.clone(), result);
        }

        let errors = results.values().filter(|r| r.is_error()).count();
        self.sink.record(&Event::ComposeFinished {
            sources: results.len(),
            errors,
            elapsed: t0.elapsed(),
        });

        Report {
            generated_at,
            results,
        }
    }
}

async fn collect(
    tasks: &mut JoinSet<(String, SourceResult)>,
    results: &mut BTreeMap<String, SourceResult>,
) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, result)) => {
                results.insert(id, result);
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                tracing::error!(target: "compose", error = %e, "source task panicked");
            }
        }
    }
}

fn record_done(sink: &dyn EventSink, spec: &SourceSpec, result: &SourceResult) {
    let detail = match result {
        SourceResult::Error { message, .. } => Some(message.clone()),
        _ => None,
    };
    sink.record(&Event::SourceCompleted {
        source: spec.identifier.clone(),
        kind: spec.kind,
        status: result.status(),
        detail,
    });
}

/// One source: Fetching → Parsing → Analyzing → Done.
/// Every failure is turned into an `Error` result tagged with its stage.
pub async fn run_source(
    fetcher: &Fetcher,
    handler: Option<&dyn KindHandler>,
    ctx: &AnalysisContext,
    spec: &SourceSpec,
) -> SourceResult {
    let payload = match fetcher.fetch(spec).await {
        FetchOutcome::Success { payload, .. } => payload,
        FetchOutcome::Failure {
            kind,
            message,
            attempts,
        } => {
            let msg = if attempts == 0 {
                format!("{} failure: {message}", kind.as_str())
            } else {
                format!("{} failure after {attempts} attempt(s): {message}", kind.as_str())
            };
            return SourceResult::error(ErrorStage::Fetch, msg);
        }
    };

    let Some(handler) = handler else {
        return SourceResult::error(
            ErrorStage::Parse,
            format!("no handler registered for kind {}", spec.kind.as_str()),
        );
    };

    let parsed = match handler.parse(&payload) {
        Ok(p) => p,
        Err(e) => return SourceResult::error(ErrorStage::Parse, e.to_string()),
    };

    match handler.analyze(parsed, ctx) {
        Ok(r) => r,
        Err(e) => SourceResult::error(ErrorStage::Analyze, e.to_string()),
    }
}
