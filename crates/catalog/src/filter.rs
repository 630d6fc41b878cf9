//! Item search filter builder.
//!
//! Turns user-supplied criteria (keyword, place, date range) into an
//! [`ItemFilter`] that repositories evaluate either in memory
//! ([`ItemFilter::matches`]) or as SQL predicates.
//!
//! Rules:
//! - keyword/place: trimmed; blank means "no constraint"; otherwise a
//!   case-insensitive substring match on name/place.
//! - `from`: picked-up >= 00:00:00.000 UTC of that day.
//! - `to`: picked-up <= 23:59:59.999 UTC of that day, so `from == to` covers
//!   the whole day.
//! - Results are always ordered newest picked-up first.

use core::cmp::Ordering;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use lostfound_core::{DomainError, DomainResult, UserId, error::optional_text};

use crate::Item;

/// Raw search criteria as submitted by the caller.
///
/// Dates are already parsed; see [`parse_date`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub keyword: Option<String>,
    pub place: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Criteria echoed back to the caller so a search form can be re-populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoedFilters {
    pub keyword: String,
    pub place: String,
    pub from: String,
    pub to: String,
}

impl SearchCriteria {
    pub fn echo(&self) -> EchoedFilters {
        let date = |d: &Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        EchoedFilters {
            keyword: self.keyword.clone().unwrap_or_default(),
            place: self.place.clone().unwrap_or_default(),
            from: date(&self.from),
            to: date(&self.to),
        }
    }

    /// Build the repository filter. Never fails.
    pub fn build(&self) -> ItemFilter {
        ItemFilter {
            name_contains: optional_text(self.keyword.as_deref()),
            place_contains: optional_text(self.place.as_deref()),
            picked_from: self.from.map(start_of_day),
            picked_to: self.to.map(end_of_day),
            registrant: None,
        }
    }
}

/// Repository-level item filter. All constraints are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub name_contains: Option<String>,
    pub place_contains: Option<String>,
    /// Inclusive lower bound on `picked_at`.
    pub picked_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `picked_at`.
    pub picked_to: Option<DateTime<Utc>>,
    pub registrant: Option<UserId>,
}

impl ItemFilter {
    /// No constraints: the whole catalog.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_registrant(user_id: UserId) -> Self {
        Self {
            registrant: Some(user_id),
            ..Self::default()
        }
    }

    /// In-memory evaluation of the filter.
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(term) = &self.name_contains {
            if !contains_ignore_case(&item.name, term) {
                return false;
            }
        }
        if let Some(term) = &self.place_contains {
            if !contains_ignore_case(&item.place, term) {
                return false;
            }
        }
        if let Some(from) = self.picked_from {
            if item.picked_at < from {
                return false;
            }
        }
        if let Some(to) = self.picked_to {
            if item.picked_at > to {
                return false;
            }
        }
        if let Some(registrant) = self.registrant {
            if item.registrant_id != registrant {
                return false;
            }
        }
        true
    }

    /// `ILIKE` pattern for a substring term, with `%`, `_` and `\` escaped.
    pub fn like_pattern(term: &str) -> String {
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for ch in term.chars() {
            if matches!(ch, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        pattern
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// The one item order: latest `picked_at` first, ties broken by id descending.
pub struct ItemOrder;

impl ItemOrder {
    pub const SQL: &'static str = "i.picked_at DESC, i.id DESC";

    pub fn compare(a: &Item, b: &Item) -> Ordering {
        b.picked_at.cmp(&a.picked_at).then(b.id.cmp(&a.id))
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Parse an optional `YYYY-MM-DD` date field. Blank means "not supplied".
pub fn parse_date(field: &str, raw: Option<&str>) -> DomainResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| DomainError::invalid_input(format!("{field}: expected YYYY-MM-DD ({e})"))),
    }
}
