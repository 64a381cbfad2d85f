//! # Source Registry
//!
//! Static description of every external source a report is composed from:
//! identifier, kind (price series or news), endpoint template and the key
//! under which its credential is looked up.
//!
//! The registry is immutable once built. Identifiers are unique and
//! non-empty; `SourceRegistry::new` rejects anything else.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Placeholder replaced by the resolved credential inside endpoint query values.
pub const CREDENTIAL_PLACEHOLDER: &str = "{credential}";

/// Closed set of source kinds; each one has its own parser + analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    PriceSeries,
    News,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::PriceSeries => "price-series",
            SourceKind::News => "news",
        }
    }
}

/// Wire format of a source's response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    #[default]
    Json,
    Rss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    #[serde(rename = "id")]
    pub identifier: String,
    pub kind: SourceKind,
    /// URL; query values may contain `{credential}`.
    pub endpoint: String,
    /// `None` means the endpoint is public.
    #[serde(default)]
    pub credential_key: Option<String>,
    #[serde(default)]
    pub format: PayloadFormat,
}

impl SourceSpec {
    pub fn new(identifier: impl Into<String>, kind: SourceKind, endpoint: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            endpoint: endpoint.into(),
            credential_key: None,
            format: PayloadFormat::Json,
        }
    }

    pub fn with_credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = Some(key.into());
        self
    }

    pub fn with_format(mut self, format: PayloadFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("source identifier must not be empty")]
    EmptyIdentifier,
    #[error("duplicate source identifier: {0}")]
    Duplicate(String),
}

/// Ordered, validated set of sources.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceRegistry {
    sources: Vec<SourceSpec>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceSpec>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for s in &sources {
            if s.identifier.trim().is_empty() {
                return Err(RegistryError::EmptyIdentifier);
            }
            if !seen.insert(s.identifier.as_str()) {
                return Err(RegistryError::Duplicate(s.identifier.clone()));
            }
        }
        Ok(Self { sources })
    }

    /// Built-in seed: one daily price feed and one headline feed.
    /// Used when the configuration declares no sources.
    pub fn default_seed() -> Self {
        Self {
            sources: vec![
                SourceSpec::new(
                    "alphavantage",
                    SourceKind::PriceSeries,
                    "https://www.alphavantage.co/query?function=TIME_SERIES_DAILY&symbol=AAPL&apikey={credential}",
                )
                .with_credential_key("alphavantage"),
                SourceSpec::new(
                    "newsapi",
                    SourceKind::News,
                    "https://newsapi.org/v2/top-headlines?q=finance&apiKey={credential}",
                )
                .with_credential_key("newsapi"),
            ],
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|s| s.identifier == identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceSpec> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_identifiers() {
        let err = SourceRegistry::new(vec![
            SourceSpec::new("a", SourceKind::News, "https://x.test/"),
            SourceSpec::new("a", SourceKind::PriceSeries, "https://y.test/"),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("a".into()));
    }

    #[test]
    fn rejects_blank_identifier() {
        let err = SourceRegistry::new(vec![SourceSpec::new(" ", SourceKind::News, "https://x.test/")])
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptyIdentifier);
    }

    #[test]
    fn default_seed_has_price_and_news() {
        let r = SourceRegistry::default_seed();
        assert_eq!(r.len(), 2);
        assert_eq!(r.get("alphavantage").unwrap().kind, SourceKind::PriceSeries);
        assert_eq!(r.get("newsapi").unwrap().kind, SourceKind::News);
        assert!(r
            .iter()
            .all(|s| s.endpoint.contains(CREDENTIAL_PLACEHOLDER)));
    }

    #[test]
    fn kind_deserializes_from_kebab_case() {
        let s: SourceSpec = toml::from_str(
            r#"
id = "feed"
kind = "price-series"
endpoint = "https://x.test/q"
"#,
        )
        .unwrap();
        assert_eq!(s.kind, SourceKind::PriceSeries);
        assert_eq!(s.format, PayloadFormat::Json);
        assert!(s.credential_key.is_none());
    }
}
