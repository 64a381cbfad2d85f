//! Observability collaborator for the pipeline.
//!
//! Pipeline code never talks to a global logger directly; it records
//! [`Event`]s into an injected [`EventSink`]. The default sink forwards to
//! `tracing` and `metrics`; tests use [`MemorySink`].

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::sync::Mutex;
use std::time::Duration;

use crate::fetch::FailureKind;
use crate::registry::SourceKind;

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success,
    Failed { kind: FailureKind, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    FetchAttempt {
        source: String,
        attempt: u32,
        max_attempts: u32,
        outcome: AttemptOutcome,
    },
    RetryScheduled {
        source: String,
        attempt: u32,
        delay: Duration,
    },
    SourceCompleted {
        source: String,
        kind: SourceKind,
        status: &'static str,
        detail: Option<String>,
    },
    ComposeFinished {
        sources: usize,
        errors: usize,
        elapsed: Duration,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::FetchAttempt { .. } => "fetch_attempt",
            Event::RetryScheduled { .. } => "retry_scheduled",
            Event::SourceCompleted { .. } => "source_completed",
            Event::ComposeFinished { .. } => "compose_finished",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn record(&self, event: &Event);
}

/// One-time metrics registration (so series show up once a recorder is installed).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pulse_fetch_attempts_total", "Fetch attempts per source.");
        describe_counter!(
            "pulse_fetch_failures_total",
            "Failed fetch attempts, labelled by failure kind."
        );
        describe_counter!(
            "pulse_source_results_total",
            "Per-source results, labelled by status."
        );
        describe_histogram!("pulse_compose_ms", "Report composition time in milliseconds.");
    });
}

/// Default sink: structured `tracing` events + `metrics` counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &Event) {
        ensure_metrics_described();
        match event {
            Event::FetchAttempt {
                source,
                attempt,
                max_attempts,
                outcome,
            } => {
                counter!("pulse_fetch_attempts_total", "source" => source.clone()).increment(1);
                match outcome {
                    AttemptOutcome::Success => {
                        tracing::info!(target: "fetch", source = %source, attempt, max_attempts, "fetch ok");
                    }
                    AttemptOutcome::Failed { kind, message } => {
                        counter!("pulse_fetch_failures_total", "kind" => kind.as_str()).increment(1);
                        tracing::warn!(
                            target: "fetch",
                            source = %source,
                            attempt,
                            max_attempts,
                            kind = kind.as_str(),
                            error = %message,
                            "fetch failed"
                        );
                    }
                }
            }
            Event::RetryScheduled {
                source,
                attempt,
                delay,
            } => {
                tracing::info!(
                    target: "fetch",
                    source = %source,
                    next_attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retrying"
                );
            }
            Event::SourceCompleted {
                source,
                kind,
                status,
                detail,
            } => {
                counter!("pulse_source_results_total", "status" => *status).increment(1);
                match detail {
                    Some(d) => tracing::warn!(
                        target: "compose",
                        source = %source,
                        kind = kind.as_str(),
                        status,
                        error = %d,
                        "source done"
                    ),
                    None => tracing::info!(
                        target: "compose",
                        source = %source,
                        kind = kind.as_str(),
                        status,
                        "source done"
                    ),
                }
            }
            Event::ComposeFinished {
                sources,
                errors,
                elapsed,
            } => {
                let ms = elapsed.as_secs_f64() * 1_000.0;
                histogram!("pulse_compose_ms").record(ms);
                tracing::info!(target: "compose", sources, errors, elapsed_ms = ms, "report composed");
            }
        }
    }
}

/// Collects events in memory; for tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    /// Fetch attempts recorded for `source`, in order.
    pub fn attempts_for(&self, source: &str) -> Vec<(u32, AttemptOutcome)> {
        self.snapshot()
            .into_iter()
            .filter_map(|e| match e {
                Event::FetchAttempt {
                    source: s,
                    attempt,
                    outcome,
                    ..
                } if s == source => Some((attempt, outcome)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &Event) {
        let mut g = match self.events.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        g.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_filters_attempts_by_source() {
        let sink = MemorySink::new();
        sink.record(&Event::FetchAttempt {
            source: "a".into(),
            attempt: 1,
            max_attempts: 2,
            outcome: AttemptOutcome::Success,
        });
        sink.record(&Event::FetchAttempt {
            source: "b".into(),
            attempt: 1,
            max_attempts: 2,
            outcome: AttemptOutcome::Success,
        });
        assert_eq!(sink.attempts_for("a").len(), 1);
        assert_eq!(sink.snapshot().len(), 2);
        assert_eq!(sink.snapshot()[0].name(), "fetch_attempt");
    }

    #[test]
    fn tracing_sink_accepts_every_event_without_recorder() {
        let sink = TracingSink;
        sink.record(&Event::ComposeFinished {
            sources: 2,
            errors: 1,
            elapsed: Duration::from_millis(3),
        });
        sink.record(&Event::SourceCompleted {
            source: "x".into(),
            kind: SourceKind::News,
            status: "error",
            detail: Some("boom".into()),
        });
    }
}
