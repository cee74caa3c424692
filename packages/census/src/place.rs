//! Census place-name cleanup.

use std::sync::LazyLock;

use regex::Regex;

static STATE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*[A-Za-z .]+$").unwrap_or_else(|_| unreachable!()));

static PLACE_KIND_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(?:city|town|village|CDP|municipality)$").unwrap_or_else(|_| unreachable!())
});

/// Reduces a census place label to the bare place name.
///
/// `"Los Angeles city, California"` becomes `"Los Angeles"` and
/// `"\"East Los Angeles CDP\""` becomes `"East Los Angeles"`.
#[must_use]
pub fn clean_place_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('"').trim();
    let without_state = STATE_SUFFIX.replace(trimmed, "");
    let cleaned = PLACE_KIND_SUFFIX.replace(without_state.trim(), "");
    cleaned.trim().to_string()
}
