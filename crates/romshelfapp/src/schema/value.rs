//! Canonical text forms for field values.
//!
//! Every value stored in a record is text in the form it will be written
//! to a gamelist. Canonicalising on the way in means two writes of the same
//! logical value compare equal, so idempotent edits never mark an entry
//! dirty.

use super::FieldType;
use chrono::{NaiveDate, NaiveDateTime};

/// Format of `Date` and `Timestamp` values in gamelists.
pub const TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

const LEGACY_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const LEGACY_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Rewrites `raw` into the canonical form for `ty`.
///
/// Legacy forms still found in old gamelists are accepted:
/// - booleans in any case (`"True"` → `"true"`)
/// - player ranges (`"1-4"` → `"4"`)
/// - ISO dates and timestamps (`"1986-02-21"` → `"19860221T000000"`)
pub fn canonicalize(ty: FieldType, raw: &str) -> String {
    match ty {
        FieldType::Boolean => raw.trim().to_lowercase(),
        FieldType::Int => collapse_range(raw.trim()).to_string(),
        FieldType::Rating => canonical_rating(raw),
        FieldType::Date | FieldType::Timestamp => match parse_time(raw) {
            Some(time) => format_time(&time),
            None => raw.trim().to_string(),
        },
        FieldType::PipeList => raw
            .split('|')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join("|"),
        FieldType::String | FieldType::MultilineString | FieldType::Path => raw.to_string(),
    }
}

fn collapse_range(value: &str) -> &str {
    match value.split_once('-') {
        Some(("1", upper)) if !upper.is_empty() && upper.bytes().all(|b| b.is_ascii_digit()) => {
            upper
        }
        _ => value,
    }
}

fn canonical_rating(raw: &str) -> String {
    match raw.trim().parse::<f32>() {
        Ok(value) if value.is_finite() => format!("{}", value.clamp(0.0, 1.0)),
        _ => "0".to_string(),
    }
}

pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(raw, TIME_FORMAT) {
        return Some(time);
    }
    LEGACY_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            LEGACY_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub fn format_time(time: &NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}
