//! Reporting periods: a week- or month-long inclusive date range.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Weeks start on Monday (ISO-8601).
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The anchor used when the caller does not pick one: the current week or
/// month start. Switching period kind without an anchor therefore resets
/// deterministically to "now"-relative.
pub fn default_anchor(kind: PeriodKind, today: NaiveDate) -> NaiveDate {
    match kind {
        PeriodKind::Week => week_start(today),
        PeriodKind::Month => month_start(today),
    }
}

/// Resolve an anchor date to an inclusive range. Any anchor is snapped to
/// its week or month start first, so `end` is never before `start`.
pub fn resolve(kind: PeriodKind, anchor: NaiveDate) -> DateRange {
    match kind {
        PeriodKind::Week => {
            let start = week_start(anchor);
            DateRange {
                start,
                end: start + Duration::days(6),
            }
        }
        PeriodKind::Month => {
            let start = month_start(anchor);
            let end = start
                .checked_add_months(Months::new(1))
                .map(|next| next - Duration::days(1))
                .unwrap_or(start);
            DateRange { start, end }
        }
    }
}
