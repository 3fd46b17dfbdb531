//! Input policy applied before any log operation.
//!
//! Lengths are counted in Unicode scalar values, not bytes.

use crate::error::FeedError;

/// Maximum body length after trimming.
pub const MAX_BODY_CHARS: usize = 4000;

/// Maximum author length after trimming.
pub const MAX_AUTHOR_CHARS: usize = 150;

/// Author recorded when none (or only whitespace) is given.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Server-enforced maximum number of messages per result.
pub const HARD_CAP: u32 = 200;

/// `fetchRecent` count used when the caller gives none.
pub const DEFAULT_RECENT_COUNT: u32 = 50;

/// Trim a body and check it against `1..=MAX_BODY_CHARS`.
pub fn validate_body(body: &str) -> Result<String, FeedError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(FeedError::validation("Message cannot be empty."));
    }
    if trimmed.chars().count() > MAX_BODY_CHARS {
        return Err(FeedError::validation(
            "Message exceeds maximum allowed length.",
        ));
    }
    Ok(trimmed.to_string())
}

/// Trim and truncate an author, falling back to [`DEFAULT_AUTHOR`].
pub fn normalize_author(author: Option<&str>) -> String {
    let trimmed = author.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return DEFAULT_AUTHOR.to_string();
    }
    // Truncation can expose trailing whitespace that was interior before.
    let truncated: String = trimmed.chars().take(MAX_AUTHOR_CHARS).collect();
    truncated.trim_end().to_string()
}

/// Effective `fetchSince` limit: absent means the hard cap.
pub fn clamp_limit(requested: Option<u32>) -> u32 {
    requested.map_or(HARD_CAP, |n| n.min(HARD_CAP))
}

/// Effective `fetchRecent` count, clamped to `[1, HARD_CAP]`.
pub fn clamp_count(requested: Option<u32>) -> u32 {
    requested.map_or(DEFAULT_RECENT_COUNT, |n| n.clamp(1, HARD_CAP))
}

/// Parse an optional non-negative integer parameter.
///
/// An absent or empty value is `None`; anything that is not a base-10
/// unsigned integer is a validation error naming the parameter.
pub fn parse_u64_param(name: &str, raw: Option<&str>) -> Result<Option<u64>, FeedError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<u64>().map(Some).map_err(|_| {
            FeedError::validation(format!("Parameter '{}' must be a non-negative integer.", name))
        }),
    }
}

/// Same as [`parse_u64_param`], saturating at `u32::MAX`.
pub fn parse_u32_param(name: &str, raw: Option<&str>) -> Result<Option<u32>, FeedError> {
    Ok(parse_u64_param(name, raw)?.map(|n| u32::try_from(n).unwrap_or(u32::MAX)))
}
