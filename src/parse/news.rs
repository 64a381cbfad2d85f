use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;

use super::ParseError;

pub const ARTICLES_FIELD: &str = "articles";

/// Article titles in delivery order. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleSet {
    titles: Vec<String>,
}

impl ArticleSet {
    pub fn new(titles: Vec<String>) -> Self {
        Self { titles }
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Normalize a headline: decode HTML entities, strip tags, unify quotes,
/// collapse whitespace.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Extract titles from `{"articles": [{"title": "..."}, ...]}`.
/// An absent (or null) list is an empty set; an article without a string
/// title is malformed.
pub fn parse_articles(payload: &Value) -> Result<ArticleSet, ParseError> {
    let list = match payload.get(ARTICLES_FIELD) {
        None | Some(Value::Null) => return Ok(ArticleSet::default()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ParseError::InvalidShape {
                field: ARTICLES_FIELD.to_string(),
                expected: "an array",
            })
        }
    };

    let mut titles = Vec::with_capacity(list.len());
    for (i, article) in list.iter().enumerate() {
        let title = article
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::missing(format!("{ARTICLES_FIELD}[{i}].title")))?;
        titles.push(normalize_title(title));
    }
    Ok(ArticleSet::new(titles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_list_is_empty_set() {
        assert!(parse_articles(&json!({ "status": "ok" })).unwrap().is_empty());
        assert!(parse_articles(&json!({ "articles": null })).unwrap().is_empty());
    }

    #[test]
    fn titles_kept_in_order_and_normalized() {
        let payload = json!({
            "status": "ok",
            "articles": [
                { "title": "<b>Markets&nbsp;turn</b>   bullish", "source": { "name": "Wire" } },
                { "title": "\u{201C}Quiet\u{201D} session" }
            ]
        });
        let set = parse_articles(&payload).unwrap();
        assert_eq!(
            set.titles(),
            &["Markets turn bullish".to_string(), "\"Quiet\" session".to_string()]
        );
    }

    #[test]
    fn article_without_title_is_missing_field() {
        let payload = json!({ "articles": [{ "title": "ok" }, { "url": "x" }] });
        assert_eq!(
            parse_articles(&payload).unwrap_err(),
            ParseError::missing("articles[1].title")
        );
    }

    #[test]
    fn non_array_list_is_invalid_shape() {
        assert!(matches!(
            parse_articles(&json!({ "articles": "nope" })),
            Err(ParseError::InvalidShape { .. })
        ));
    }
}
