//! Value extraction from response bodies and redirect urls that have no
//! structured contract.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static HIDDEN_FIELD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"value="(.+?)""#).unwrap());
static URL_POST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"urlPost:'(.+?)'"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// The value of the first `value="..."` attribute, the PPFT form field.
    HiddenField,
    /// The string assigned to `urlPost` in the page script.
    JsAssignedString,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pattern::HiddenField => "hidden field value",
            Pattern::JsAssignedString => "urlPost assignment",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("no {0} found in response body")]
    NotFound(Pattern),
    #[error("no fragment in redirect url")]
    MalformedRedirect,
}

/// Something able to pull a named value out of a raw response body.
pub trait Scraper {
    fn scrape(&self, body: &str, pattern: Pattern) -> Result<String, ScrapeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexScraper;

impl Scraper for RegexScraper {
    fn scrape(&self, body: &str, pattern: Pattern) -> Result<String, ScrapeError> {
        let re = match pattern {
            Pattern::HiddenField => &*HIDDEN_FIELD_RE,
            Pattern::JsAssignedString => &*URL_POST_RE,
        };
        re.captures(body)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
            .ok_or(ScrapeError::NotFound(pattern))
    }
}

/// Split the fragment of `url` into its `key=value` pairs. Values are kept
/// as they appear in the url.
pub fn fragment_params(url: &str) -> Result<HashMap<String, String>, ScrapeError> {
    let (_, fragment) = url.split_once('#').ok_or(ScrapeError::MalformedRedirect)?;
    let params = fragment
        .split('&')
        .filter(|kv| !kv.is_empty())
        .map(|kv| match kv.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (kv.to_string(), String::new()),
        })
        .collect();
    Ok(params)
}
