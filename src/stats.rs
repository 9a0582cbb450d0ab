use crate::categories::{CategoryIndex, ExpenseView, ResolvedExpense};
use crate::filters::total;
use crate::models::{Category, Expense};
use crate::period::{DateWindow, SummaryPeriod, today};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

const TOP_EXPENSE_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub name: String,
    pub color: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub count: usize,
    pub percentage: f64,
}

/// Per-category totals, largest first. Equal totals are ordered by name.
pub fn category_breakdown(expenses: &[ResolvedExpense<'_>]) -> Vec<CategoryTotal> {
    let mut breakdown: Vec<CategoryTotal> = Vec::new();
    for resolved in expenses {
        let name = resolved.category.name();
        let entry = match breakdown.iter_mut().position(|t| t.name == name) {
            Some(idx) => &mut breakdown[idx],
            None => {
                breakdown.push(CategoryTotal {
                    name: name.to_string(),
                    color: resolved.category.color().to_string(),
                    amount: Decimal::ZERO,
                    count: 0,
                    percentage: 0.0,
                });
                let last = breakdown.len() - 1;
                &mut breakdown[last]
            }
        };
        entry.amount = entry.amount.saturating_add(resolved.expense.amount);
        entry.count += 1;
    }

    let grand_total = breakdown
        .iter()
        .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount));
    for entry in &mut breakdown {
        entry.percentage = percentage_of(entry.amount, grand_total);
    }

    breakdown.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    breakdown
}

/// `part / whole * 100`, zero when `whole` is zero. Ratios too large for
/// `Decimal` fall back to float math.
pub fn percentage_of(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.to_f64())
        .unwrap_or_else(|| float_ratio(part, whole) * 100.0)
}

/// Relative change from `previous` to `current` in percent.
pub fn change_percentage(current: Decimal, previous: Decimal) -> f64 {
    if previous.is_zero() {
        return if current > Decimal::ZERO { 100.0 } else { 0.0 };
    }
    current
        .checked_sub(previous)
        .and_then(|delta| delta.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.to_f64())
        .unwrap_or_else(|| (float_ratio(current, previous) - 1.0) * 100.0)
}

fn float_ratio(numerator: Decimal, denominator: Decimal) -> f64 {
    let numerator = numerator.to_f64().unwrap_or(0.0);
    match denominator.to_f64() {
        Some(denominator) if denominator != 0.0 => numerator / denominator,
        _ => 0.0,
    }
}

pub struct PeriodData<'a> {
    pub period: SummaryPeriod,
    pub window: DateWindow,
    pub label: String,
    pub expenses: Vec<&'a Expense>,
    pub total: Decimal,
}

impl PeriodData<'_> {
    pub fn count(&self) -> usize {
        self.expenses.len()
    }
}

pub fn period_data(expenses: &[Expense], period: SummaryPeriod, today: NaiveDate) -> PeriodData<'_> {
    let window = period.window(today);
    let in_period: Vec<&Expense> = expenses
        .iter()
        .filter(|e| window.contains_instant(&e.date))
        .collect();
    PeriodData {
        period,
        window,
        label: period.label(today),
        total: total(in_period.iter().copied()),
        expenses: in_period,
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Averages {
    #[serde(with = "rust_decimal::serde::float")]
    pub daily: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub per_transaction: Decimal,
}

/// Week periods divide by 7 and year periods by 365. Month periods divide by
/// the span between the first and last expense, at least one day.
pub fn averages(expenses: &[&Expense], period: SummaryPeriod) -> Averages {
    if expenses.is_empty() {
        return Averages {
            daily: Decimal::ZERO,
            per_transaction: Decimal::ZERO,
        };
    }
    let sum = total(expenses.iter().copied());
    let days: i64 = if period.is_week() {
        7
    } else if period.is_year() {
        365
    } else {
        let first = expenses.iter().map(|e| e.date).min();
        let last = expenses.iter().map(|e| e.date).max();
        match (first, last) {
            (Some(first), Some(last)) => {
                let seconds = (last - first).num_seconds();
                ((seconds + 86_399) / 86_400).max(1)
            }
            _ => 1,
        }
    };
    Averages {
        daily: (sum / Decimal::from(days)).round_dp(2),
        per_transaction: (sum / Decimal::from(expenses.len())).round_dp(2),
    }
}

pub fn top_expenses<'a>(expenses: &[ResolvedExpense<'a>], limit: usize) -> Vec<ResolvedExpense<'a>> {
    let mut sorted = expenses.to_vec();
    sorted.sort_by(|a, b| b.expense.amount.cmp(&a.expense.amount));
    sorted.truncate(limit);
    sorted
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyPoint {
    pub date: String,
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// One point per day of the month containing `today`.
pub fn daily_trend(expenses: &[Expense], today: NaiveDate) -> Vec<DailyPoint> {
    let month = DateWindow::month_of(today);
    month
        .days()
        .map(|day| DailyPoint {
            date: day.to_string(),
            label: day.day().to_string(),
            amount: total(expenses.iter().filter(|e| e.date.date_naive() == day)),
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub period: SummaryPeriod,
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub count: usize,
}

impl From<&PeriodData<'_>> for PeriodTotals {
    fn from(data: &PeriodData<'_>) -> Self {
        Self {
            period: data.period,
            label: data.label.clone(),
            start_date: data.window.start,
            end_date: data.window.end,
            total: data.total,
            count: data.count(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub previous: PeriodTotals,
    pub total_change: f64,
    pub count_change: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport<'a> {
    pub current: PeriodTotals,
    pub comparison: Option<Comparison>,
    pub averages: Averages,
    pub category_breakdown: Vec<CategoryTotal>,
    pub top_expenses: Vec<ExpenseView<'a>>,
    pub daily_trend: Vec<DailyPoint>,
}

pub fn build_summary<'a>(
    expenses: &'a [Expense],
    categories: &'a [Category],
    period: SummaryPeriod,
    compare: Option<SummaryPeriod>,
) -> SummaryReport<'a> {
    build_summary_at(today(), expenses, categories, period, compare)
}

pub fn build_summary_at<'a>(
    today: NaiveDate,
    expenses: &'a [Expense],
    categories: &'a [Category],
    period: SummaryPeriod,
    compare: Option<SummaryPeriod>,
) -> SummaryReport<'a> {
    let index = CategoryIndex::new(categories);
    let current = period_data(expenses, period, today);
    let resolved = index.resolve_all(current.expenses.iter().copied());

    let comparison = compare.map(|other| {
        let previous = period_data(expenses, other, today);
        Comparison {
            total_change: change_percentage(current.total, previous.total),
            count_change: change_percentage(
                Decimal::from(current.count()),
                Decimal::from(previous.count()),
            ),
            previous: PeriodTotals::from(&previous),
        }
    });

    SummaryReport {
        current: PeriodTotals::from(&current),
        comparison,
        averages: averages(&current.expenses, period),
        category_breakdown: category_breakdown(&resolved),
        top_expenses: top_expenses(&resolved, TOP_EXPENSE_LIMIT)
            .iter()
            .map(ResolvedExpense::view)
            .collect(),
        daily_trend: daily_trend(expenses, today),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopCategory {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_this_month: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_this_year: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_all_time: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_daily_spending: Decimal,
    pub top_category: TopCategory,
    pub transactions_this_month: usize,
    pub transactions_this_year: usize,
    pub total_transactions: usize,
}

pub fn build_analytics(expenses: &[Expense], categories: &[Category]) -> AnalyticsSummary {
    build_analytics_at(today(), expenses, categories)
}

pub fn build_analytics_at(
    today: NaiveDate,
    expenses: &[Expense],
    categories: &[Category],
) -> AnalyticsSummary {
    let month = period_data(expenses, SummaryPeriod::ThisMonth, today);
    let year = period_data(expenses, SummaryPeriod::ThisYear, today);
    let index = CategoryIndex::new(categories);
    let resolved = index.resolve_all(expenses);

    AnalyticsSummary {
        total_this_month: month.total,
        total_this_year: year.total,
        total_all_time: total(expenses),
        avg_daily_spending: (month.total / Decimal::from(today.day())).round_dp(2),
        top_category: top_category(&resolved),
        transactions_this_month: month.count(),
        transactions_this_year: year.count(),
        total_transactions: expenses.len(),
    }
}

/// Highest spending category. Ties go to the alphabetically first name.
pub fn top_category(expenses: &[ResolvedExpense<'_>]) -> TopCategory {
    category_breakdown(expenses)
        .into_iter()
        .find(|t| t.amount > Decimal::ZERO)
        .map(|t| TopCategory {
            name: t.name,
            amount: t.amount,
        })
        .unwrap_or(TopCategory {
            name: "None".to_string(),
            amount: Decimal::ZERO,
        })
}
