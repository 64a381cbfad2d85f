//! Kind handlers: each `SourceKind` is paired with one parser and one analyzer.
//!
//! Adding a source kind means implementing [`KindHandler`] and registering it;
//! the composer never branches on the kind itself.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::analyze::{classify, score, KeywordSet};
use crate::parse::{self, ParseError, Parsed};
use crate::registry::SourceKind;
use crate::report::SourceResult;

/// Read-only analysis settings shared by all handlers.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub keywords: KeywordSet,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{handler} handler cannot analyze {got} data")]
pub struct AnalyzeError {
    pub handler: &'static str,
    pub got: &'static str,
}

fn parsed_label(p: &Parsed) -> &'static str {
    match p {
        Parsed::Prices(_) => "price-series",
        Parsed::Articles(_) => "article",
    }
}

pub trait KindHandler: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Defaults to the built-in parser for `kind()`.
    fn parse(&self, payload: &Value) -> Result<Parsed, ParseError> {
        parse::parse(self.kind(), payload)
    }

    fn analyze(&self, parsed: Parsed, ctx: &AnalysisContext) -> Result<SourceResult, AnalyzeError>;
}

pub struct PriceSeriesHandler;

impl KindHandler for PriceSeriesHandler {
    fn kind(&self) -> SourceKind {
        SourceKind::PriceSeries
    }

    fn analyze(&self, parsed: Parsed, _ctx: &AnalysisContext) -> Result<SourceResult, AnalyzeError> {
        match parsed {
            Parsed::Prices(series) => Ok(SourceResult::PriceAnalysis {
                price: series.last(),
                trend: classify(series.closes()),
            }),
            other => Err(AnalyzeError {
                handler: self.kind().as_str(),
                got: parsed_label(&other),
            }),
        }
    }
}

pub struct NewsHandler;

impl KindHandler for NewsHandler {
    fn kind(&self) -> SourceKind {
        SourceKind::News
    }

    fn analyze(&self, parsed: Parsed, ctx: &AnalysisContext) -> Result<SourceResult, AnalyzeError> {
        match parsed {
            Parsed::Articles(set) => Ok(SourceResult::NewsAnalysis {
                sentiment: score(set.titles(), &ctx.keywords),
                articles: set.len(),
            }),
            other => Err(AnalyzeError {
                handler: self.kind().as_str(),
                got: parsed_label(&other),
            }),
        }
    }
}

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<SourceKind, Arc<dyn KindHandler>>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Price-series and news handlers.
    pub fn with_defaults() -> Self {
        let mut r = Self::empty();
        r.register(Arc::new(PriceSeriesHandler));
        r.register(Arc::new(NewsHandler));
        r
    }

    /// Replaces any handler previously registered for the same kind.
    pub fn register(&mut self, handler: Arc<dyn KindHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn KindHandler>> {
        self.handlers.get(&kind).cloned()
    }
}
