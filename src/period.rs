use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ClientError;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Sunday through Saturday.
    pub fn week_of(date: NaiveDate) -> Self {
        let start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
        Self::new(start, start + Duration::days(6))
    }

    pub fn month_of(date: NaiveDate) -> Self {
        let start = date - Duration::days(date.day0() as i64);
        Self::new(start, start + Months::new(1) - Duration::days(1))
    }

    pub fn year_of(date: NaiveDate) -> Self {
        let start = date - Duration::days(date.ordinal0() as i64);
        Self::new(start, start + Months::new(12) - Duration::days(1))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn contains_instant(&self, instant: &DateTime<Utc>) -> bool {
        self.contains(day_of(instant))
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |day| *day <= self.end)
    }
}

/// Calendar day an expense timestamp falls on. All period math runs in UTC.
pub fn day_of(instant: &DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Reporting periods offered by the expense summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SummaryPeriod {
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
}

impl SummaryPeriod {
    pub fn window(self, today: NaiveDate) -> DateWindow {
        match self {
            Self::ThisWeek => DateWindow::week_of(today),
            Self::LastWeek => DateWindow::week_of(today - Duration::days(7)),
            Self::ThisMonth => DateWindow::month_of(today),
            Self::LastMonth => DateWindow::month_of(today - Months::new(1)),
            Self::ThisYear => DateWindow::year_of(today),
            Self::LastYear => DateWindow::year_of(today - Months::new(12)),
        }
    }

    pub fn label(self, today: NaiveDate) -> String {
        let start = self.window(today).start;
        match self {
            Self::ThisWeek => "This Week".to_string(),
            Self::LastWeek => "Last Week".to_string(),
            Self::ThisMonth | Self::LastMonth => start.format("%B %Y").to_string(),
            Self::ThisYear | Self::LastYear => start.format("%Y").to_string(),
        }
    }

    /// The period a comparison is drawn against by default.
    pub fn previous(self) -> Self {
        match self {
            Self::ThisWeek | Self::LastWeek => Self::LastWeek,
            Self::ThisMonth | Self::LastMonth => Self::LastMonth,
            Self::ThisYear | Self::LastYear => Self::LastYear,
        }
    }

    pub fn is_week(self) -> bool {
        matches!(self, Self::ThisWeek | Self::LastWeek)
    }

    pub fn is_month(self) -> bool {
        matches!(self, Self::ThisMonth | Self::LastMonth)
    }

    pub fn is_year(self) -> bool {
        matches!(self, Self::ThisYear | Self::LastYear)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThisWeek => "thisWeek",
            Self::LastWeek => "lastWeek",
            Self::ThisMonth => "thisMonth",
            Self::LastMonth => "lastMonth",
            Self::ThisYear => "thisYear",
            Self::LastYear => "lastYear",
        }
    }
}

pub const SUMMARY_PERIODS: [SummaryPeriod; 6] = [
    SummaryPeriod::ThisWeek,
    SummaryPeriod::LastWeek,
    SummaryPeriod::ThisMonth,
    SummaryPeriod::LastMonth,
    SummaryPeriod::ThisYear,
    SummaryPeriod::LastYear,
];

/// Reads the `period` and `compare` query values. The period defaults to
/// this month; a missing comparison defaults to the matching previous period
/// and `none` turns it off.
pub fn summary_selection(
    period: Option<&str>,
    compare: Option<&str>,
) -> Result<(SummaryPeriod, Option<SummaryPeriod>), ClientError> {
    let period = match period.map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => raw.parse()?,
        None => SummaryPeriod::ThisMonth,
    };
    let compare = match compare.map(str::trim).filter(|c| !c.is_empty()) {
        None => Some(period.previous()),
        Some("none") => None,
        Some(raw) => Some(raw.parse()?),
    };
    Ok((period, compare))
}

impl FromStr for SummaryPeriod {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        SUMMARY_PERIODS
            .into_iter()
            .find(|p| p.as_str() == raw.trim())
            .ok_or_else(|| ClientError::validation(format!("unknown period: {raw}")))
    }
}
