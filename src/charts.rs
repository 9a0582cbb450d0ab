//! Chart datasets. Rendering is left to whatever draws them.

use crate::categories::CategoryIndex;
use crate::models::{Category, Expense};
use crate::stats::{DailyPoint, daily_trend};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChart {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub background_color: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesChart {
    pub label: String,
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub category: CategoryChart,
    pub monthly_trend: SeriesChart,
    pub daily_spending: SeriesChart,
}

pub fn build_charts_at(today: NaiveDate, expenses: &[Expense], categories: &[Category]) -> ChartData {
    ChartData {
        category: category_chart(expenses, categories),
        monthly_trend: monthly_trend(expenses),
        daily_spending: daily_spending(expenses, today),
    }
}

/// Totals per category name in the order categories are first seen.
pub fn category_chart(expenses: &[Expense], categories: &[Category]) -> CategoryChart {
    let index = CategoryIndex::new(categories);
    let mut labels: Vec<String> = Vec::new();
    let mut totals: Vec<Decimal> = Vec::new();
    let mut colors: Vec<String> = Vec::new();

    for resolved in index.resolve_all(expenses) {
        let name = resolved.category.name();
        match labels.iter().position(|label| label == name) {
            Some(idx) => totals[idx] = totals[idx].saturating_add(resolved.expense.amount),
            None => {
                labels.push(name.to_string());
                totals.push(resolved.expense.amount);
                colors.push(resolved.category.color().to_string());
            }
        }
    }

    CategoryChart {
        labels,
        data: totals.into_iter().map(to_f64).collect(),
        background_color: colors,
    }
}

pub fn monthly_trend(expenses: &[Expense]) -> SeriesChart {
    let mut months: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for expense in expenses {
        let day = expense.date.date_naive();
        let month = months.entry((day.year(), day.month())).or_default();
        *month = month.saturating_add(expense.amount);
    }

    let mut labels = Vec::with_capacity(months.len());
    let mut data = Vec::with_capacity(months.len());
    for ((year, month), amount) in months {
        let label = NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| first.format("%b %Y").to_string())
            .unwrap_or_else(|| format!("{year}-{month:02}"));
        labels.push(label);
        data.push(to_f64(amount));
    }

    SeriesChart {
        label: "Monthly Spending".to_string(),
        labels,
        data,
    }
}

pub fn daily_spending(expenses: &[Expense], today: NaiveDate) -> SeriesChart {
    let points: Vec<DailyPoint> = daily_trend(expenses, today);
    SeriesChart {
        label: "Daily Spending".to_string(),
        labels: points.iter().map(|p| p.label.clone()).collect(),
        data: points.into_iter().map(|p| to_f64(p.amount)).collect(),
    }
}

fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn expense(amount: i64, category: &str, y: i32, m: u32, d: u32) -> Expense {
        Expense {
            id: format!("{y}{m}{d}{amount}"),
            user_id: "u".into(),
            amount: Decimal::from(amount),
            currency: "USD".into(),
            category_id: category.into(),
            description: String::new(),
            date: Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn category_chart_keeps_first_seen_order() {
        let categories = vec![Category {
            id: "f".into(),
            user_id: "u".into(),
            name: "Food".into(),
            color: "#FF5733".into(),
            description: None,
            icon: None,
        }];
        let expenses = vec![
            expense(5, "gone", 2025, 1, 1),
            expense(10, "f", 2025, 1, 2),
            expense(7, "f", 2025, 1, 3),
        ];
        let chart = category_chart(&expenses, &categories);
        assert_eq!(chart.labels, vec!["Unknown", "Food"]);
        assert_eq!(chart.data, vec![5.0, 17.0]);
        assert_eq!(chart.background_color[1], "#FF5733");
    }

    #[test]
    fn monthly_trend_is_sorted_by_month() {
        let expenses = vec![
            expense(10, "f", 2025, 2, 1),
            expense(20, "f", 2024, 12, 5),
            expense(5, "f", 2025, 2, 20),
        ];
        let trend = monthly_trend(&expenses);
        assert_eq!(trend.labels, vec!["Dec 2024", "Feb 2025"]);
        assert_eq!(trend.data, vec![20.0, 15.0]);
    }

    #[test]
    fn extreme_totals_saturate() {
        let mut big = expense(1, "f", 2025, 2, 3);
        big.amount = Decimal::MAX;
        let expenses = vec![big.clone(), big];
        let trend = monthly_trend(&expenses);
        assert_eq!(trend.data, vec![to_f64(Decimal::MAX)]);
        let chart = category_chart(&expenses, &[]);
        assert_eq!(chart.labels, vec!["Unknown".to_string()]);
        assert_eq!(chart.data, vec![to_f64(Decimal::MAX)]);
    }

    #[test]
    fn daily_spending_covers_whole_month() {
        let expenses = vec![expense(10, "f", 2025, 2, 3)];
        let chart = daily_spending(&expenses, NaiveDate::from_ymd_opt(2025, 2, 14).unwrap());
        assert_eq!(chart.labels.len(), 28);
        assert_eq!(chart.labels[2], "3");
        assert_eq!(chart.data[2], 10.0);
    }
}
