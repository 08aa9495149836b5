//! Text scraping for Better Stack's templated `cause` field.
//!
//! Better Stack does not send structured exception data. The incident `cause`
//! is a small markdown blob such as:
//!
//! ````text
//! **ZeroDivisionError**
//!
//! ```
//! division by zero
//! ```
//! `flexy/urls.py` in `trigger_error`
//! ````
//!
//! Each extractor is independent and falls back to a fixed value when its
//! pattern is absent. A change to the upstream template shows up here first.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::ParsedCause;

/// Fallback when no `**Type**` segment is present.
pub const UNKNOWN_ERROR_TYPE: &str = "Unknown";
/// Fallback when no fenced block is present.
pub const NO_ERROR_MESSAGE: &str = "No error message";
/// Fallback when no `` `path.py` in `symbol` `` pattern is present.
pub const UNKNOWN_LOCATION: &str = "unknown";

static ERROR_TYPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());

static ERROR_MESSAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\n([^`]+)\n```").unwrap());

static LOCATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+\.py)`\s+in\s+`([^`]+)`").unwrap());

/// First `**emphasised**` run, e.g. `ZeroDivisionError`.
#[must_use]
pub fn error_type(cause: &str) -> String {
    ERROR_TYPE_PATTERN
        .captures(cause)
        .and_then(|c| c.get(1))
        .map_or_else(|| UNKNOWN_ERROR_TYPE.to_string(), |m| m.as_str().to_string())
}

/// Trimmed contents of the first fenced block.
#[must_use]
pub fn error_message(cause: &str) -> String {
    ERROR_MESSAGE_PATTERN
        .captures(cause)
        .and_then(|c| c.get(1))
        .map_or_else(
            || NO_ERROR_MESSAGE.to_string(),
            |m| m.as_str().trim().to_string(),
        )
}

/// `"<path> in <symbol>"` from `` `path.py` in `symbol` ``.
#[must_use]
pub fn file_location(cause: &str) -> String {
    LOCATION_PATTERN
        .captures(cause)
        .and_then(|c| Some((c.get(1)?, c.get(2)?)))
        .map_or_else(
            || UNKNOWN_LOCATION.to_string(),
            |(path, symbol)| format!("{} in {}", path.as_str(), symbol.as_str()),
        )
}

/// Run every extractor over `cause`.
#[must_use]
pub fn parse(cause: &str) -> ParsedCause {
    ParsedCause {
        error_type: error_type(cause),
        error_message: error_message(cause),
        file_path: file_location(cause),
    }
}
