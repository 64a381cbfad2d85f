// src/config/mod.rs
//! Runtime configuration: retry policy, sentiment keywords, concurrency,
//! credentials and the source list. Loaded from TOML or JSON.

pub mod credentials;

pub use self::credentials::Credentials;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analyze::KeywordSet;
use crate::compose::{ComposeSettings, DEFAULT_MAX_CONCURRENCY};
use crate::fetch::{Backoff, RetryPolicy};
use crate::registry::{SourceRegistry, SourceSpec};

pub const ENV_CONFIG_PATH: &str = "PULSE_CONFIG_PATH";
pub const DEFAULT_CONFIG_TOML: &str = "config/pulse.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/pulse.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
    pub backoff: Backoff,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_ms: 5_000,
            backoff: Backoff::Fixed,
            max_delay_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub keywords: KeywordSet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    pub max_concurrency: usize,
    pub timeout_ms: Option<u64>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub retry: RetryConfig,
    pub sentiment: SentimentConfig,
    pub compose: ComposeConfig,
    pub http: HttpConfig,
    /// credential key → raw value (literal, "ENV" or "ENV:NAME").
    pub credentials: HashMap<String, String>,
    /// Empty means the built-in seed registry.
    pub sources: Vec<SourceSpec>,
}

impl PulseConfig {
    /// Load from an explicit path. Format picked by extension, with content fallback.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $PULSE_CONFIG_PATH
    /// 2) config/pulse.toml
    /// 3) config/pulse.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Ok(Self::default())
    }

    fn sanitized(mut self) -> Self {
        if self.compose.max_concurrency == 0 {
            self.compose.max_concurrency = 1;
        }
        if self.retry.max_delay_ms < self.retry.delay_ms {
            self.retry.max_delay_ms = self.retry.delay_ms;
        }
        if self.http.timeout_ms == 0 {
            self.http.timeout_ms = HttpConfig::default().timeout_ms;
        }
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            delay: Duration::from_millis(self.retry.delay_ms),
            backoff: self.retry.backoff,
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn compose_settings(&self) -> ComposeSettings {
        ComposeSettings {
            max_concurrency: self.compose.max_concurrency.max(1),
            timeout: self.compose.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn keywords(&self) -> KeywordSet {
        self.sentiment.keywords.clone()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.http.timeout_ms)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::resolve(&self.credentials)
    }

    pub fn registry(&self) -> Result<SourceRegistry> {
        if self.sources.is_empty() {
            return Ok(SourceRegistry::default_seed());
        }
        SourceRegistry::new(self.sources.clone()).context("invalid source registry")
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<PulseConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("invalid JSON config");
    }
    if hint_ext == "toml" {
        return toml::from_str(s).context("invalid TOML config");
    }
    // Unknown extension: JSON if it looks like an object, TOML otherwise.
    if s.trim_start().starts_with('{') {
        serde_json::from_str(s).context("invalid JSON config")
    } else {
        toml::from_str(s).context("invalid TOML config")
    }
}
