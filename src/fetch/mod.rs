// src/fetch/mod.rs
//! Per-source fetch with bounded retry.
//!
//! One [`Fetcher::fetch`] call yields exactly one terminal [`FetchOutcome`].
//! Transient failures are retried up to `max_retries` times with the
//! configured delay; permanent failures return after the first attempt.

pub mod http;
pub mod transport;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub use self::http::{decode_body, HttpTransport};
pub use self::transport::{FailureKind, FetchRequest, Transport, TransportError};

use crate::config::Credentials;
use crate::observe::{AttemptOutcome, Event, EventSink};
use crate::registry::{SourceSpec, CREDENTIAL_PLACEHOLDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    #[default]
    Fixed,
    /// delay * 2^(n-1), capped at `max_delay`.
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    pub backoff: Backoff,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
            backoff: Backoff::Fixed,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait after the `failed_attempt`-th attempt (1-based) failed.
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let shift = failed_attempt.saturating_sub(1).min(31);
                self.delay
                    .checked_mul(1u32 << shift)
                    .unwrap_or(self.max_delay)
                    .min(self.max_delay)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success {
        payload: Value,
        attempts: u32,
    },
    Failure {
        kind: FailureKind,
        message: String,
        attempts: u32,
    },
}

impl FetchOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Success { attempts, .. } | FetchOutcome::Failure { attempts, .. } => *attempts,
        }
    }
}

pub struct Fetcher {
    transport: Arc<dyn Transport>,
    credentials: Arc<Credentials>,
    policy: RetryPolicy,
    sink: Arc<dyn EventSink>,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<Credentials>,
        policy: RetryPolicy,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            transport,
            credentials,
            policy,
            sink,
        }
    }

    /// Resolve the credential and render the endpoint. Failures here are permanent.
    pub fn build_request(&self, spec: &SourceSpec) -> Result<FetchRequest, TransportError> {
        let secret = match spec.credential_key.as_deref() {
            Some(key) => Some(self.credentials.get(key).ok_or_else(|| {
                TransportError::permanent(format!("no credential configured for key '{key}'"))
            })?),
            None => None,
        };
        let url = render_endpoint(&spec.endpoint, secret)?;
        Ok(FetchRequest {
            source: spec.identifier.clone(),
            url,
            format: spec.format,
        })
    }

    pub async fn fetch(&self, spec: &SourceSpec) -> FetchOutcome {
        let request = match self.build_request(spec) {
            Ok(r) => r,
            Err(e) => {
                return FetchOutcome::Failure {
                    kind: e.kind,
                    message: e.message,
                    attempts: 0,
                }
            }
        };

        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.transport.get(&request).await {
                Ok(payload) => {
                    self.sink.record(&Event::FetchAttempt {
                        source: request.source.clone(),
                        attempt,
                        max_attempts,
                        outcome: AttemptOutcome::Success,
                    });
                    return FetchOutcome::Success {
                        payload,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    self.sink.record(&Event::FetchAttempt {
                        source: request.source.clone(),
                        attempt,
                        max_attempts,
                        outcome: AttemptOutcome::Failed {
                            kind: e.kind,
                            message: e.message.clone(),
                        },
                    });
                    if !e.is_transient() || attempt >= max_attempts {
                        return FetchOutcome::Failure {
                            kind: e.kind,
                            message: e.message,
                            attempts: attempt,
                        };
                    }
                    let delay = self.policy.delay_for(attempt);
                    self.sink.record(&Event::RetryScheduled {
                        source: request.source.clone(),
                        attempt,
                        delay,
                    });
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Parse the endpoint and substitute `{credential}` in its query values.
/// A secret and a placeholder must come together; either alone is a permanent error.
pub fn render_endpoint(template: &str, secret: Option<&str>) -> Result<Url, TransportError> {
    let mut url = Url::parse(template)
        .map_err(|e| TransportError::permanent(format!("invalid endpoint '{template}': {e}")))?;

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let has_placeholder = pairs.iter().any(|(_, v)| v.contains(CREDENTIAL_PLACEHOLDER));
    match (has_placeholder, secret) {
        (true, Some(secret)) => {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(
                    pairs
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.replace(CREDENTIAL_PLACEHOLDER, secret))),
                );
        }
        (true, None) => {
            return Err(TransportError::permanent(
                "endpoint expects a credential but the source declares no credential key",
            ))
        }
        // A resolved secret with nowhere to go would be dropped silently.
        (false, Some(_)) => {
            return Err(TransportError::permanent(format!(
                "source declares a credential key but endpoint has no {CREDENTIAL_PLACEHOLDER} query value"
            )))
        }
        (false, None) => {}
    }
    Ok(url)
}
