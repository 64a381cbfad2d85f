// src/fetch/transport.rs
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::registry::PayloadFormat;

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Timeouts, connection errors, 5xx, 429.
    Transient,
    /// Missing credential, bad endpoint, 4xx, undecodable body.
    Permanent,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transient => "transient",
            FailureKind::Permanent => "permanent",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

/// A fully rendered request for one source (credential already substituted).
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub source: String,
    pub url: Url,
    pub format: PayloadFormat,
}

/// One network call, no retries. Implementations classify their own failures.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &FetchRequest) -> Result<Value, TransportError>;
}
