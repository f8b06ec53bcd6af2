use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// Format used by current certificate forms; older layouts are not attempted.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

fn date_token() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{2}/[0-9]{2}/[0-9]{4}").ok()).as_ref()
}

/// Every `MM/DD/YYYY` token in `text` that is a real calendar date, in text order.
pub fn candidate_dates(text: &str) -> Vec<NaiveDate> {
    let Some(token) = date_token() else {
        return Vec::new();
    };
    token
        .find_iter(text)
        .filter_map(|m| NaiveDate::parse_from_str(m.as_str(), DATE_FORMAT).ok())
        .collect()
}

/// Earliest date mentioned in `text`, or `None` when nothing parses.
pub fn harvest(text: &str) -> Option<NaiveDate> {
    candidate_dates(text).into_iter().min()
}
