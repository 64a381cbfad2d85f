// src/config/credentials.rs
use std::collections::HashMap;
use std::env;
use std::fmt;

/// Opaque credential lookup: credential key → secret.
///
/// Raw config values are resolved once, at load time:
/// - `"ENV"`       → `$<KEY>_API_KEY` (key upper-cased, `-` → `_`)
/// - `"ENV:NAME"`  → `$NAME`
/// - anything else → literal secret
#[derive(Clone, Default)]
pub struct Credentials {
    secrets: HashMap<String, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.insert(key, secret);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, secret: impl Into<String>) {
        self.secrets.insert(key.into(), secret.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.secrets.get(key).map(String::as_str)
    }

    /// Resolve raw config values. Entries that cannot be resolved are dropped
    /// (the fetch for that source then fails permanently).
    pub fn resolve(raw: &HashMap<String, String>) -> Self {
        let mut out = Self::new();
        for (key, value) in raw {
            match resolve_value(key, value) {
                Some(secret) => out.insert(key.clone(), secret),
                None => {
                    tracing::warn!(target: "config", credential = %key, "credential unresolved; source will fail");
                }
            }
        }
        out
    }
}

// Never print secrets.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.secrets.keys().collect();
        keys.sort();
        f.debug_struct("Credentials").field("keys", &keys).finish()
    }
}

fn resolve_value(key: &str, raw: &str) -> Option<String> {
    let v = raw.trim();
    if v.is_empty() {
        return None;
    }
    if v.eq_ignore_ascii_case("env") {
        let var = format!("{}_API_KEY", key.to_ascii_uppercase().replace('-', "_"));
        return non_empty_env(&var);
    }
    if v.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("env:")) {
        return non_empty_env(v[4..].trim());
    }
    Some(v.to_string())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}
