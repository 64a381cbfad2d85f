//! # Trend
//! Classifies recent price movement against a short simple moving average.
//!
//! The window is the last `SMA_WINDOW` closes, or all of them when the series
//! is shorter. Series with fewer than two closes are `Flat`.

use crate::report::Trend;

pub const SMA_WINDOW: usize = 3;

/// Relative slack for the last-vs-average comparison; absorbs f64 summation error.
const EQ_TOLERANCE: f64 = 1e-9;

pub fn classify(series: &[f64]) -> Trend {
    if series.len() < 2 {
        return Trend::Flat;
    }

    let window = &series[series.len() - SMA_WINDOW.min(series.len())..];
    if window.iter().any(|p| !p.is_finite()) {
        tracing::warn!(target: "analyze", len = series.len(), "non-finite close in SMA window; trend degraded to flat");
        return Trend::Flat;
    }

    let Some(&last) = window.last() else {
        return Trend::Flat;
    };

    // last vs. mean, compared as last * n vs. sum so equal closes stay equal
    let sum: f64 = window.iter().sum();
    let scaled = last * window.len() as f64;
    let diff = scaled - sum;
    if diff.abs() <= EQ_TOLERANCE * scaled.abs().max(sum.abs()) {
        Trend::Flat
    } else if diff > 0.0 {
        Trend::Up
    } else {
        Trend::Down
    }
}
