//! Free-text cleanup helpers

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]+>").expect("tag pattern is valid"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

const ENTITIES: [(&str, &str); 7] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Strip HTML artifacts and normalise whitespace
///
/// Decodes common entities, removes tags, collapses whitespace runs into a
/// single space and trims. Returns `None` when nothing is left.
pub fn clean_string(value: &str) -> Option<String> {
    let mut decoded = TAG.replace_all(value, " ").into_owned();
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    let cleaned = WHITESPACE.replace_all(&decoded, " ").trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// [`clean_string`] over an optional value
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value.and_then(clean_string)
}

/// Coerce a legacy year value to an integer when it holds one
pub fn coerce_year(value: Option<&str>) -> Option<i64> {
    let trimmed = value?.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().filter(|y| y.fract() == 0.0).map(|y| y as i64))
}

/// Parse a legacy date or date-time value
///
/// Legacy databases hold a mix of `YYYY-MM-DD HH:MM:SS[.f]`, ISO `T`-separated
/// and bare `YYYY-MM-DD` values. Anything else is `None`.
pub fn parse_timestamp(value: Option<&str>) -> Option<NaiveDateTime> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Normalise a legacy country code for lookup (trimmed, upper-case)
pub fn country_code(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_ascii_uppercase())
        .filter(|v| !v.is_empty())
}

/// Trim a text value, mapping blank to `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
