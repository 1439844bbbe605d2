//! Thread references and the normalization of user-supplied thread text.
//!
//! Slash-command users point at a thread in one of three ways:
//!
//! - a permalink: `https://acme.slack.com/archives/C123/p1700000000123456`
//! - a compact timestamp: `p1700000000123456`
//! - a dotted timestamp: `1700000000.123456`
//!
//! All of them normalize to a [`ThreadRef`] carrying the dotted
//! `seconds.microseconds` form that the Web API expects.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Number of fractional digits in a Slack message timestamp.
const TS_FRACTION_DIGITS: usize = 6;

/// A thread, identified by its channel and root message timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadRef {
    /// Channel ID (C..., G..., D...).
    pub channel: String,
    /// Root message timestamp in dotted form.
    pub thread_ts: String,
}

impl ThreadRef {
    /// Create a new thread reference.
    pub fn new(channel: impl Into<String>, thread_ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            thread_ts: thread_ts.into(),
        }
    }
}

impl fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.thread_ts)
    }
}

/// Errors produced while normalizing thread text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadRefParseError {
    /// No text was supplied.
    #[error("No thread URL or timestamp given")]
    Empty,

    /// The text looked like a URL but was not a Slack message permalink.
    #[error("Not a Slack thread URL: {0}")]
    InvalidUrl(String),

    /// The text was neither a URL nor a timestamp.
    #[error("Unrecognized thread reference: {0}")]
    Unrecognized(String),
}

/// Classified shape of raw thread text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadRefInput<'a> {
    /// A full `http(s)://` permalink.
    FullUrl(&'a str),
    /// Digits with a `p` prefix and no decimal point.
    CompactTimestamp(&'a str),
    /// `seconds.fraction` digits.
    DottedTimestamp(&'a str),
    /// Anything else.
    Invalid(&'a str),
}

impl<'a> ThreadRefInput<'a> {
    /// Classify raw text without interpreting it yet.
    ///
    /// Slack wraps links in command text as `<url>` or `<url|label>`; both
    /// wrappers are removed first.
    pub fn classify(raw: &'a str) -> Self {
        let text = unwrap_slack_link(raw.trim());

        if text.starts_with("http://") || text.starts_with("https://") {
            ThreadRefInput::FullUrl(text)
        } else if let Some(digits) = text.strip_prefix('p').or_else(|| text.strip_prefix('P'))
            && is_compact_digits(digits)
        {
            ThreadRefInput::CompactTimestamp(digits)
        } else if is_dotted_timestamp(text) {
            ThreadRefInput::DottedTimestamp(text)
        } else {
            ThreadRefInput::Invalid(text)
        }
    }

    /// Resolve into a [`ThreadRef`], using `default_channel` for bare
    /// timestamps.
    pub fn resolve(self, default_channel: &str) -> Result<ThreadRef, ThreadRefParseError> {
        match self {
            ThreadRefInput::FullUrl(text) => parse_permalink(text),
            ThreadRefInput::CompactTimestamp(digits) => Ok(ThreadRef::new(
                default_channel,
                dotted_from_compact(digits),
            )),
            ThreadRefInput::DottedTimestamp(ts) => Ok(ThreadRef::new(default_channel, ts)),
            ThreadRefInput::Invalid("") => Err(ThreadRefParseError::Empty),
            ThreadRefInput::Invalid(text) => {
                Err(ThreadRefParseError::Unrecognized(text.to_string()))
            }
        }
    }
}

/// Normalize raw thread text into a [`ThreadRef`].
///
/// # Example
///
/// ```rust
/// use threadcanvas_slack::thread_ref::normalize_thread_ref;
///
/// let thread = normalize_thread_ref("p1700000000123456", "C123").unwrap();
/// assert_eq!(thread.thread_ts, "1700000000.123456");
/// ```
pub fn normalize_thread_ref(
    raw: &str,
    default_channel: &str,
) -> Result<ThreadRef, ThreadRefParseError> {
    ThreadRefInput::classify(raw).resolve(default_channel)
}

/// Convert a dotted timestamp into the `p`-prefixed permalink segment.
///
/// The fractional part is right-padded with zeros to six digits, so
/// `1700000000.123` becomes `p1700000000123000`. A timestamp without a
/// fractional part gets six zeros.
pub fn compact_timestamp(ts: &str) -> String {
    let (seconds, fraction) = ts.split_once('.').unwrap_or((ts, ""));
    format!(
        "p{}{:0<width$}",
        seconds,
        fraction,
        width = TS_FRACTION_DIGITS
    )
}

fn unwrap_slack_link(text: &str) -> &str {
    match text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        Some(inner) => inner.split('|').next().unwrap_or(inner),
        None => text,
    }
}

fn is_compact_digits(digits: &str) -> bool {
    digits.len() > TS_FRACTION_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_dotted_timestamp(text: &str) -> bool {
    match text.split_once('.') {
        Some((seconds, fraction)) => {
            !seconds.is_empty()
                && !fraction.is_empty()
                && seconds.bytes().all(|b| b.is_ascii_digit())
                && fraction.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

fn dotted_from_compact(digits: &str) -> String {
    let split = digits.len() - TS_FRACTION_DIGITS;
    format!("{}.{}", &digits[..split], &digits[split..])
}

fn parse_permalink(text: &str) -> Result<ThreadRef, ThreadRefParseError> {
    let invalid = || ThreadRefParseError::InvalidUrl(text.to_string());

    let url = Url::parse(text).map_err(|_| invalid())?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let archives = segments
        .iter()
        .position(|seg| *seg == "archives")
        .ok_or_else(invalid)?;
    let channel = segments.get(archives + 1).ok_or_else(invalid)?;
    let message = segments.get(archives + 2).ok_or_else(invalid)?;

    // A reply permalink carries the root timestamp in `thread_ts`.
    if let Some((_, root)) = url.query_pairs().find(|(key, _)| key == "thread_ts")
        && is_dotted_timestamp(&root)
    {
        return Ok(ThreadRef::new(*channel, root.into_owned()));
    }

    let digits = message
        .strip_prefix('p')
        .filter(|d| is_compact_digits(d))
        .ok_or_else(invalid)?;

    Ok(ThreadRef::new(*channel, dotted_from_compact(digits)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_shapes() {
        assert_eq!(
            ThreadRefInput::classify("https://acme.slack.com/archives/C1/p1700000000123456"),
            ThreadRefInput::FullUrl("https://acme.slack.com/archives/C1/p1700000000123456")
        );
        assert_eq!(
            ThreadRefInput::classify("p1700000000123456"),
            ThreadRefInput::CompactTimestamp("1700000000123456")
        );
        assert_eq!(
            ThreadRefInput::classify(" 1700000000.123456 "),
            ThreadRefInput::DottedTimestamp("1700000000.123456")
        );
        assert_eq!(
            ThreadRefInput::classify("yesterday"),
            ThreadRefInput::Invalid("yesterday")
        );
        assert_eq!(ThreadRefInput::classify("p123"), ThreadRefInput::Invalid("p123"));
    }

    #[test]
    fn test_normalize_full_url() {
        let thread = normalize_thread_ref(
            "https://acme.slack.com/archives/C0123ABC/p1700000000123456",
            "CIGNORED",
        )
        .unwrap();
        assert_eq!(thread, ThreadRef::new("C0123ABC", "1700000000.123456"));
    }

    #[test]
    fn test_normalize_url_wrapped_by_slack() {
        let thread = normalize_thread_ref(
            "<https://acme.slack.com/archives/C9/p1700000000000100|link>",
            "C1",
        )
        .unwrap();
        assert_eq!(thread, ThreadRef::new("C9", "1700000000.000100"));
    }

    #[test]
    fn test_normalize_reply_permalink_uses_thread_ts() {
        let thread = normalize_thread_ref(
            "https://acme.slack.com/archives/C9/p1700000500000000?thread_ts=1700000000.123456&cid=C9",
            "C1",
        )
        .unwrap();
        assert_eq!(thread, ThreadRef::new("C9", "1700000000.123456"));
    }

    #[test]
    fn test_normalize_compact_and_dotted() {
        assert_eq!(
            normalize_thread_ref("p1700000000123456", "C1").unwrap(),
            ThreadRef::new("C1", "1700000000.123456")
        );
        assert_eq!(
            normalize_thread_ref("1700000000.123456", "C1").unwrap(),
            ThreadRef::new("C1", "1700000000.123456")
        );
    }

    #[test]
    fn test_normalize_errors() {
        assert_eq!(normalize_thread_ref("  ", "C1"), Err(ThreadRefParseError::Empty));
        assert!(matches!(
            normalize_thread_ref("https://example.com/not/a/thread", "C1"),
            Err(ThreadRefParseError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_thread_ref("https://acme.slack.com/archives/C1", "C1"),
            Err(ThreadRefParseError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_thread_ref("17000.abc", "C1"),
            Err(ThreadRefParseError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_compact_timestamp_pads_fraction() {
        assert_eq!(compact_timestamp("1700000000.123"), "p1700000000123000");
        assert_eq!(compact_timestamp("1700000000.123456"), "p1700000000123456");
        assert_eq!(compact_timestamp("1700000000"), "p1700000000000000");
    }
}
