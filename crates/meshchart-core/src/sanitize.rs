//! Chart name sanitization
//!
//! Design names are free text. Helm chart names end up as directory names
//! and archive file names, so they are reduced to `[a-z0-9-]`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Name used when nothing usable survives sanitization
pub const FALLBACK_NAME: &str = "meshery-design";

/// Maximum length of a sanitized chart name
pub const MAX_NAME_LENGTH: usize = 40;

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9-]+").unwrap());
static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Normalize an arbitrary display name into a chart name
///
/// Never fails and never returns an empty string.
pub fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let lowered = name.to_lowercase();
    let replaced = DISALLOWED.replace_all(&lowered, "-");
    let collapsed = DASH_RUNS.replace_all(&replaced, "-");
    let trimmed = collapsed.trim_matches('-');

    if trimmed.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    // Only ASCII survives the replacement, so byte slicing is safe
    if trimmed.len() > MAX_NAME_LENGTH {
        return trimmed[..MAX_NAME_LENGTH].trim_matches('-').to_string();
    }

    trimmed.to_string()
}
