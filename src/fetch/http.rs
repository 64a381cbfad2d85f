use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::transport::{FetchRequest, Transport, TransportError};
use crate::registry::PayloadFormat;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

/// reqwest-backed transport. Decodes JSON bodies as-is and RSS 2.0 bodies
/// into the news shape `{"articles":[{"title","url"}]}`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("market-pulse/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(request_timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &FetchRequest) -> Result<Value, TransportError> {
        let resp = self
            .client
            .get(request.url.clone())
            .send()
            .await
            .map_err(classify_reqwest)?;

        let status = resp.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::transient(format!(
                "HTTP {status} from {}",
                request.source
            )));
        }
        if !status.is_success() {
            return Err(TransportError::permanent(format!(
                "HTTP {status} from {}",
                request.source
            )));
        }

        let body = resp.bytes().await.map_err(classify_reqwest)?;
        decode_body(request.format, &body)
    }
}

/// Network-level failures are retryable unless the request itself could not be built.
/// The URL is stripped because it may carry the credential.
fn classify_reqwest(e: reqwest::Error) -> TransportError {
    let permanent = e.is_builder() || e.is_redirect();
    let e = e.without_url();
    if permanent {
        TransportError::permanent(e.to_string())
    } else {
        TransportError::transient(e.to_string())
    }
}

/// Decode a response body according to the source's declared format.
pub fn decode_body(format: PayloadFormat, body: &[u8]) -> Result<Value, TransportError> {
    match format {
        PayloadFormat::Json => serde_json::from_slice(body)
            .map_err(|e| TransportError::permanent(format!("invalid JSON body: {e}"))),
        PayloadFormat::Rss => {
            let text = std::str::from_utf8(body)
                .map_err(|e| TransportError::permanent(format!("RSS body is not UTF-8: {e}")))?;
            let rss: Rss = from_str(text)
                .map_err(|e| TransportError::permanent(format!("invalid RSS body: {e}")))?;
            let articles: Vec<Value> = rss
                .channel
                .item
                .into_iter()
                .filter_map(|it| {
                    let title = it.title?;
                    Some(json!({ "title": title, "url": it.link }))
                })
                .collect();
            Ok(json!({ "articles": articles }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FailureKind;

    #[test]
    fn rss_items_become_articles() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Wire</title>
<item><title>Stocks bullish after CPI</title><link>https://x.test/1</link></item>
<item><link>https://x.test/untitled</link></item>
<item><title>Oil slips</title></item>
</channel></rss>"#;
        let v = decode_body(PayloadFormat::Rss, xml.as_bytes()).unwrap();
        let arts = v["articles"].as_array().unwrap();
        assert_eq!(arts.len(), 2);
        assert_eq!(arts[0]["title"], "Stocks bullish after CPI");
        assert!(arts[1]["url"].is_null());
    }

    #[test]
    fn empty_channel_is_empty_article_list() {
        let xml = r#"<rss><channel><title>none</title></channel></rss>"#;
        let v = decode_body(PayloadFormat::Rss, xml.as_bytes()).unwrap();
        assert_eq!(v["articles"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn malformed_json_is_permanent() {
        let err = decode_body(PayloadFormat::Json, b"{not json").unwrap_err();
        assert_eq!(err.kind, FailureKind::Permanent);
    }
}
