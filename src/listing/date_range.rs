//! Named date ranges used to filter listings by creation date.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateRangeFilter {
    #[default]
    All,
    Today,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
    LastSixMonths,
}

fn start_of(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 on `day`.
fn end_of(day: NaiveDate) -> NaiveDateTime {
    start_of(day) + TimeDelta::days(1) - TimeDelta::milliseconds(1)
}

impl DateRangeFilter {
    /// Parse the query-string form (`thisWeek`, `lastSixMonths`, ...).
    /// Unknown values fall back to `All`.
    pub fn parse(value: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(value.to_string())).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DateRangeFilter::All => "all",
            DateRangeFilter::Today => "today",
            DateRangeFilter::ThisWeek => "thisWeek",
            DateRangeFilter::LastWeek => "lastWeek",
            DateRangeFilter::ThisMonth => "thisMonth",
            DateRangeFilter::LastMonth => "lastMonth",
            DateRangeFilter::ThisYear => "thisYear",
            DateRangeFilter::LastYear => "lastYear",
            DateRangeFilter::LastSixMonths => "lastSixMonths",
        }
    }

    /// Inclusive bounds relative to `today`, or `None` for `All`.
    /// Weeks start on Monday.
    pub fn range(self, today: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let monday = today - TimeDelta::days(i64::from(today.weekday().num_days_from_monday()));
        let first_of_month = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;
        let first_of_year = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;

        match self {
            DateRangeFilter::All => None,
            DateRangeFilter::Today => Some((start_of(today), end_of(today))),
            DateRangeFilter::ThisWeek => Some((start_of(monday), end_of(today))),
            DateRangeFilter::LastWeek => {
                let start = monday - TimeDelta::days(7);
                Some((start_of(start), end_of(start + TimeDelta::days(6))))
            }
            DateRangeFilter::ThisMonth => Some((start_of(first_of_month), end_of(today))),
            DateRangeFilter::LastMonth => {
                let start = first_of_month.checked_sub_months(Months::new(1))?;
                let end = first_of_month.pred_opt()?;
                Some((start_of(start), end_of(end)))
            }
            DateRangeFilter::ThisYear => Some((start_of(first_of_year), end_of(today))),
            DateRangeFilter::LastYear => {
                let start = NaiveDate::from_ymd_opt(today.year() - 1, 1, 1)?;
                let end = NaiveDate::from_ymd_opt(today.year() - 1, 12, 31)?;
                Some((start_of(start), end_of(end)))
            }
            DateRangeFilter::LastSixMonths => {
                let start = today.checked_sub_months(Months::new(6))?;
                Some((start_of(start), end_of(today)))
            }
        }
    }

    pub fn contains(self, today: NaiveDate, at: NaiveDateTime) -> bool {
        match self.range(today) {
            Some((start, end)) => at >= start && at <= end,
            None => true,
        }
    }
}
