use serde::{Deserialize, Serialize};

pub const DEFAULT_KEYWORD: &str = "bullish";

/// Positive keywords, stored lower-case, trimmed and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordSet {
    words: Vec<String>,
}

impl KeywordSet {
    /// Empty input falls back to the default keyword.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        use std::collections::BTreeSet;
        let set: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if set.is_empty() {
            return Self::default();
        }
        Self {
            words: set.into_iter().collect(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Case-insensitive substring match against any keyword.
    pub fn matches(&self, title: &str) -> bool {
        let lower = title.to_lowercase();
        self.words.iter().any(|w| lower.contains(w.as_str()))
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self {
            words: vec![DEFAULT_KEYWORD.to_string()],
        }
    }
}

impl From<Vec<String>> for KeywordSet {
    fn from(v: Vec<String>) -> Self {
        Self::new(v)
    }
}

impl From<KeywordSet> for Vec<String> {
    fn from(k: KeywordSet) -> Self {
        k.words
    }
}

/// Fraction of titles containing a positive keyword.
/// `None` when there are no titles: no sentiment available, not zero.
pub fn score<S: AsRef<str>>(titles: &[S], keywords: &KeywordSet) -> Option<f64> {
    if titles.is_empty() {
        return None;
    }
    let positive = titles.iter().filter(|t| keywords.matches(t.as_ref())).count();
    Some(positive as f64 / titles.len() as f64)
}
