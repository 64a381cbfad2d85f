// src/parse/mod.rs
//! Per-kind extraction from raw payloads. Pure transforms: no I/O, no retry.

pub mod news;
pub mod prices;

use serde_json::Value;
use thiserror::Error;

use crate::registry::SourceKind;

pub use self::news::{normalize_title, parse_articles, ArticleSet};
pub use self::prices::{parse_price_series, PriceSeries};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing field `{field}`{}", provider_suffix(.detail))]
    MissingField {
        field: String,
        /// Message the provider put in place of the data, if any.
        detail: Option<String>,
    },
    #[error("field `{field}` is not a valid number: {value}")]
    InvalidValue { field: String, value: String },
    #[error("field `{field}` must be {expected}")]
    InvalidShape {
        field: String,
        expected: &'static str,
    },
}

impl ParseError {
    pub fn missing(field: impl Into<String>) -> Self {
        ParseError::MissingField {
            field: field.into(),
            detail: None,
        }
    }
}

fn provider_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" (provider: {d})"),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Prices(PriceSeries),
    Articles(ArticleSet),
}

pub fn parse(kind: SourceKind, payload: &Value) -> Result<Parsed, ParseError> {
    match kind {
        SourceKind::PriceSeries => parse_price_series(payload).map(Parsed::Prices),
        SourceKind::News => parse_articles(payload).map(Parsed::Articles),
    }
}
