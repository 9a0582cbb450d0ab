use crate::categories::CategoryIndex;
use crate::errors::ClientError;
use crate::models::Expense;
use crate::period::{DateWindow, day_of};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DateRange {
    #[default]
    All,
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl DateRange {
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::ThisWeek => "thisWeek",
            Self::ThisMonth => "thisMonth",
            Self::ThisYear => "thisYear",
            Self::Custom { .. } => "custom",
        }
    }

    /// Inclusive day bounds; `None` on a side means unbounded.
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let window = match self {
            Self::All => return (None, None),
            Self::Custom { start, end } => return (*start, *end),
            Self::Today => DateWindow::day(today),
            Self::ThisWeek => DateWindow::week_of(today),
            Self::ThisMonth => DateWindow::month_of(today),
            Self::ThisYear => DateWindow::year_of(today),
        };
        (Some(window.start), Some(window.end))
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let (start, end) = self.bounds(today);
        start.is_none_or(|start| date >= start) && end.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub date_range: DateRange,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense, today: NaiveDate) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !expense.description.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some(category_id) = &self.category_id {
            if &expense.category_id != category_id {
                return false;
            }
        }
        if self.min_amount.is_some_and(|min| expense.amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| expense.amount > max) {
            return false;
        }
        self.date_range.contains(day_of(&expense.date), today)
    }

    pub fn apply<'a>(&self, expenses: &'a [Expense], today: NaiveDate) -> Vec<&'a Expense> {
        expenses.iter().filter(|e| self.matches(e, today)).collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Human readable list of the filters in effect.
    pub fn describe(&self, categories: &CategoryIndex<'_>) -> Vec<String> {
        let mut active = Vec::new();
        if let Some(search) = &self.search {
            active.push(format!("Search: \"{search}\""));
        }
        if let Some(category_id) = &self.category_id {
            active.push(format!("Category: {}", categories.resolve(category_id).name()));
        }
        if self.date_range != DateRange::All {
            active.push(format!("Date: {}", self.date_range.name()));
        }
        if let Some(min) = self.min_amount {
            active.push(format!("Min: ${min}"));
        }
        if let Some(max) = self.max_amount {
            active.push(format!("Max: ${max}"));
        }
        active
    }
}

/// Filter parameters as they arrive from a query string or form, where
/// every field may be present but blank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub date_range: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub custom_start_date: Option<String>,
    pub custom_end_date: Option<String>,
}

impl FilterParams {
    pub fn into_filter(self) -> Result<ExpenseFilter, ClientError> {
        let date_range = match non_blank(self.date_range).as_deref() {
            None | Some("all") => DateRange::All,
            Some("today") => DateRange::Today,
            Some("thisWeek") => DateRange::ThisWeek,
            Some("thisMonth") => DateRange::ThisMonth,
            Some("thisYear") => DateRange::ThisYear,
            Some("custom") => DateRange::Custom {
                start: parse_opt::<NaiveDate>(self.custom_start_date, "customStartDate")?,
                end: parse_opt::<NaiveDate>(self.custom_end_date, "customEndDate")?,
            },
            Some(other) => {
                return Err(ClientError::validation(format!("unknown date range: {other}")));
            }
        };

        Ok(ExpenseFilter {
            search: non_blank(self.search),
            category_id: non_blank(self.category_id),
            date_range,
            min_amount: parse_opt::<Decimal>(self.min_amount, "minAmount")?,
            max_amount: parse_opt::<Decimal>(self.max_amount, "maxAmount")?,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_opt<T: FromStr>(value: Option<String>, field: &str) -> Result<Option<T>, ClientError> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ClientError::validation(format!("invalid {field}: {raw}"))),
    }
}

pub fn total<'a, I>(expenses: I) -> Decimal
where
    I: IntoIterator<Item = &'a Expense>,
{
    expenses
        .into_iter()
        .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.amount))
}
