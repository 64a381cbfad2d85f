// src/report.rs
//! Report types produced by one aggregation cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Where a source's processing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStage {
    Fetch,
    Parse,
    Analyze,
    Timeout,
    Aborted,
}

/// Exactly one of these exists per registered source in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceResult {
    PriceAnalysis {
        /// Last closing price; `None` for an empty series.
        price: Option<f64>,
        trend: Trend,
    },
    NewsAnalysis {
        /// `None` means no sentiment available (no articles).
        sentiment: Option<f64>,
        articles: usize,
    },
    Error {
        stage: ErrorStage,
        message: String,
    },
}

impl SourceResult {
    pub fn error(stage: ErrorStage, message: impl Into<String>) -> Self {
        SourceResult::Error {
            stage,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SourceResult::Error { .. })
    }

    /// Short label used for logs/metrics.
    pub fn status(&self) -> &'static str {
        match self {
            SourceResult::PriceAnalysis { .. } | SourceResult::NewsAnalysis { .. } => "ok",
            SourceResult::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub results: BTreeMap<String, SourceResult>,
}

impl Report {
    pub fn errors(&self) -> impl Iterator<Item = (&String, &SourceResult)> {
        self.results.iter().filter(|(_, r)| r.is_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_tagged_results() {
        let mut results = BTreeMap::new();
        results.insert(
            "px".to_string(),
            SourceResult::PriceAnalysis {
                price: Some(101.5),
                trend: Trend::Up,
            },
        );
        results.insert(
            "news".to_string(),
            SourceResult::NewsAnalysis {
                sentiment: None,
                articles: 0,
            },
        );
        let r = Report {
            generated_at: Utc::now(),
            results,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["results"]["px"]["type"], "price_analysis");
        assert_eq!(v["results"]["px"]["trend"], "up");
        assert!(v["results"]["news"]["sentiment"].is_null());
    }

    #[test]
    fn error_status_label() {
        let e = SourceResult::error(ErrorStage::Parse, "missing field");
        assert!(e.is_error());
        assert_eq!(e.status(), "error");
    }
}
