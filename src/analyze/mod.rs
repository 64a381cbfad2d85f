// src/analyze/mod.rs
//! Analyzers: pure, infallible functions over parsed data.
//! Degenerate input (short series, no articles) yields a defined neutral or
//! undefined value instead of an error.

pub mod sentiment;
pub mod trend;

pub use crate::analyze::sentiment::{score, KeywordSet};
pub use crate::analyze::trend::{classify, SMA_WINDOW};
