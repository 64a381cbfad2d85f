use serde_json::Value;

use super::ParseError;

pub const SERIES_FIELD: &str = "Time Series (Daily)";
pub const CLOSE_FIELD: &str = "4. close";

/// Keys a provider returns instead of data (rate limit, bad symbol, plan limits).
const PROVIDER_MESSAGE_FIELDS: [&str; 3] = ["Error Message", "Note", "Information"];

/// Closing prices in chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(closes: Vec<f64>) -> Self {
        Self { closes }
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn last(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Extract closes from a daily time-series payload:
///
/// ```json
/// { "Time Series (Daily)": { "2024-01-02": { "4. close": "185.64" }, ... } }
/// ```
///
/// Entries are ordered by their date key, oldest first.
pub fn parse_price_series(payload: &Value) -> Result<PriceSeries, ParseError> {
    let Some(series) = payload.get(SERIES_FIELD) else {
        return Err(ParseError::MissingField {
            field: SERIES_FIELD.to_string(),
            detail: provider_message(payload),
        });
    };
    let series = series.as_object().ok_or_else(|| ParseError::InvalidShape {
        field: SERIES_FIELD.to_string(),
        expected: "an object keyed by date",
    })?;

    let mut points: Vec<(&str, f64)> = Vec::with_capacity(series.len());
    for (date, day) in series {
        let field = format!("{SERIES_FIELD}.{date}.{CLOSE_FIELD}");
        let raw = day
            .get(CLOSE_FIELD)
            .ok_or_else(|| ParseError::missing(field.clone()))?;
        points.push((date.as_str(), close_value(raw, field)?));
    }
    points.sort_by(|a, b| a.0.cmp(b.0));

    Ok(PriceSeries::new(points.into_iter().map(|(_, c)| c).collect()))
}

// Providers send closes as strings ("185.64"); plain numbers are accepted too.
fn close_value(raw: &Value, field: String) -> Result<f64, ParseError> {
    let parsed = match raw {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidValue {
            field,
            value: raw.to_string(),
        }),
    }
}

fn provider_message(payload: &Value) -> Option<String> {
    PROVIDER_MESSAGE_FIELDS
        .iter()
        .find_map(|k| payload.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}
