//! Spending caps per category. Budgets are kept only in the local store under
//! `expense_budgets` and are never sent to the backend.

use crate::categories::CategoryIndex;
use crate::errors::ClientError;
use crate::filters::total;
use crate::models::{Category, Expense, check_amount_cap};
use crate::period::DateWindow;
use crate::stats::percentage_of;
use crate::storage::{BUDGETS, LocalStore};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_ALERT_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn window(self, today: NaiveDate) -> DateWindow {
        match self {
            Self::Monthly => DateWindow::month_of(today),
            Self::Yearly => DateWindow::year_of(today),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub period: BudgetPeriod,
    pub alert_threshold: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub category_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub period: BudgetPeriod,
    #[serde(default = "default_threshold")]
    pub alert_threshold: u8,
}

fn default_threshold() -> u8 {
    DEFAULT_ALERT_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Good,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    pub fn from_percentage(percentage: f64, alert_threshold: u8) -> Self {
        if percentage >= 100.0 {
            Self::Exceeded
        } else if percentage >= f64::from(alert_threshold) {
            Self::Warning
        } else {
            Self::Good
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Good => "#10b981",
            Self::Warning => "#f59e0b",
            Self::Exceeded => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    #[serde(with = "rust_decimal::serde::float")]
    pub spent: Decimal,
    /// Uncapped; may exceed 100.
    pub percentage: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining: Decimal,
    /// Percentage clamped to 100 for progress bars.
    pub bar_width: f64,
    pub status: BudgetStatus,
}

impl Budget {
    pub fn progress(
        &self,
        expenses: &[Expense],
        categories: &CategoryIndex<'_>,
        today: NaiveDate,
    ) -> BudgetProgress {
        let spent = if categories.contains(&self.category_id) {
            let window = self.period.window(today);
            total(
                expenses
                    .iter()
                    .filter(|e| e.category_id == self.category_id && window.contains_instant(&e.date)),
            )
        } else {
            Decimal::ZERO
        };

        let percentage = percentage_of(spent, self.amount);
        BudgetProgress {
            spent,
            percentage,
            remaining: self.amount.saturating_sub(spent).max(Decimal::ZERO),
            bar_width: percentage.min(100.0),
            status: BudgetStatus::from_percentage(percentage, self.alert_threshold),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetView {
    #[serde(flatten)]
    pub budget: Budget,
    pub category_name: String,
    pub category_color: String,
    pub progress: BudgetProgress,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlert {
    pub id: String,
    pub category_name: String,
    pub percentage: f64,
    pub status: BudgetStatus,
}

impl BudgetAlert {
    pub fn message(&self) -> String {
        let mut text = format!("{}: {:.1}% of budget used", self.category_name, self.percentage);
        if self.status == BudgetStatus::Exceeded {
            text.push_str(" - Budget exceeded!");
        }
        text
    }
}

pub fn budget_views(
    budgets: Vec<Budget>,
    expenses: &[Expense],
    categories: &[Category],
    today: NaiveDate,
) -> Vec<BudgetView> {
    let index = CategoryIndex::new(categories);
    budgets
        .into_iter()
        .map(|budget| {
            let category = index.resolve(&budget.category_id);
            BudgetView {
                progress: budget.progress(expenses, &index, today),
                category_name: category.name().to_string(),
                category_color: category.color().to_string(),
                budget,
            }
        })
        .collect()
}

/// Budgets at or beyond their alert threshold.
pub fn budget_alerts(views: &[BudgetView]) -> Vec<BudgetAlert> {
    views
        .iter()
        .filter(|view| view.progress.percentage >= f64::from(view.budget.alert_threshold))
        .map(|view| BudgetAlert {
            id: view.budget.id.clone(),
            category_name: view.category_name.clone(),
            percentage: view.progress.percentage,
            status: if view.progress.percentage >= 100.0 {
                BudgetStatus::Exceeded
            } else {
                BudgetStatus::Warning
            },
        })
        .collect()
}

/// Budget list persisted in the local store.
#[derive(Clone)]
pub struct BudgetBook {
    store: LocalStore,
}

impl BudgetBook {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Vec<Budget> {
        self.store.load_list(BUDGETS).await
    }

    pub async fn add(&self, new: NewBudget, now: DateTime<Utc>) -> Result<Budget, ClientError> {
        if new.category_id.trim().is_empty() {
            return Err(ClientError::validation("Please fill in all required fields"));
        }
        if new.amount <= Decimal::ZERO {
            return Err(ClientError::validation("Budget amount must be greater than zero"));
        }
        check_amount_cap(new.amount)?;
        if !(1..=100).contains(&new.alert_threshold) {
            return Err(ClientError::validation("Alert threshold must be between 1 and 100"));
        }

        let mut budgets = self.list().await;
        if budgets.iter().any(|b| b.category_id == new.category_id) {
            return Err(ClientError::validation(
                "Budget already exists for this category. Edit the existing budget instead.",
            ));
        }

        let budget = Budget {
            id: Uuid::new_v4().to_string(),
            category_id: new.category_id,
            amount: new.amount,
            period: new.period,
            alert_threshold: new.alert_threshold,
            created_at: now,
        };
        budgets.push(budget.clone());
        self.store.set_json(BUDGETS, &budgets).await?;
        info!("budget {} added for category {}", budget.id, budget.category_id);
        Ok(budget)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let mut budgets = self.list().await;
        let before = budgets.len();
        budgets.retain(|b| b.id != id);
        if budgets.len() == before {
            return Err(ClientError::not_found("Budget not found"));
        }
        self.store.set_json(BUDGETS, &budgets).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn food() -> Vec<Category> {
        vec![Category {
            id: "food".into(),
            user_id: "u".into(),
            name: "Food".into(),
            color: "#FF5733".into(),
            description: None,
            icon: None,
        }]
    }

    fn expense(amount: i64, category: &str, day: NaiveDate) -> Expense {
        Expense {
            id: format!("{category}-{day}-{amount}"),
            user_id: "u".into(),
            amount: Decimal::from(amount),
            currency: "USD".into(),
            category_id: category.into(),
            description: String::new(),
            date: Utc.from_utc_datetime(&day.and_hms_opt(9, 0, 0).unwrap()),
            created_at: None,
            updated_at: None,
        }
    }

    fn budget(amount: i64, period: BudgetPeriod, threshold: u8) -> Budget {
        Budget {
            id: "b1".into(),
            category_id: "food".into(),
            amount: Decimal::from(amount),
            period,
            alert_threshold: threshold,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_edges() {
        let categories = food();
        let index = CategoryIndex::new(&categories);
        let today = date(2025, 1, 20);

        let none = budget(200, BudgetPeriod::Monthly, 80).progress(&[], &index, today);
        assert_eq!(none.percentage, 0.0);
        assert_eq!(none.status, BudgetStatus::Good);
        assert_eq!(none.remaining, Decimal::from(200));

        let full = budget(200, BudgetPeriod::Monthly, 80).progress(
            &[expense(150, "food", date(2025, 1, 2)), expense(50, "food", date(2025, 1, 19))],
            &index,
            today,
        );
        assert_eq!(full.percentage, 100.0);
        assert_eq!(full.status, BudgetStatus::Exceeded);
        assert_eq!(full.remaining, Decimal::ZERO);
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(BudgetStatus::from_percentage(79.9, 80), BudgetStatus::Good);
        assert_eq!(BudgetStatus::from_percentage(80.0, 80), BudgetStatus::Warning);
        assert_eq!(BudgetStatus::from_percentage(99.99, 80), BudgetStatus::Warning);
        assert_eq!(BudgetStatus::from_percentage(100.0, 80), BudgetStatus::Exceeded);
        assert_eq!(BudgetStatus::from_percentage(100.0, 100), BudgetStatus::Exceeded);
    }

    #[test]
    fn overspend_is_uncapped_but_bar_is_clamped() {
        let categories = food();
        let index = CategoryIndex::new(&categories);
        let progress = budget(100, BudgetPeriod::Yearly, 50).progress(
            &[
                expense(120, "food", date(2025, 3, 1)),
                expense(30, "food", date(2025, 11, 30)),
                expense(500, "food", date(2024, 12, 31)),
                expense(500, "other", date(2025, 3, 1)),
            ],
            &index,
            date(2025, 6, 1),
        );
        assert_eq!(progress.spent, Decimal::from(150));
        assert_eq!(progress.percentage, 150.0);
        assert_eq!(progress.bar_width, 100.0);
    }

    #[test]
    fn deleted_category_reports_nothing_spent() {
        let index = CategoryIndex::new(&[]);
        let progress = budget(100, BudgetPeriod::Monthly, 80).progress(
            &[expense(90, "food", date(2025, 1, 2))],
            &index,
            date(2025, 1, 3),
        );
        assert_eq!(progress.spent, Decimal::ZERO);
        assert_eq!(progress.remaining, Decimal::from(100));
    }

    #[test]
    fn alerts_only_above_threshold() {
        let categories = food();
        let views = budget_views(
            vec![budget(100, BudgetPeriod::Monthly, 50)],
            &[expense(60, "food", date(2025, 1, 2))],
            &categories,
            date(2025, 1, 3),
        );
        let alerts = budget_alerts(&views);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].status, BudgetStatus::Warning);
        assert_eq!(alerts[0].message(), "Food: 60.0% of budget used");

        let quiet = budget_views(
            vec![budget(100, BudgetPeriod::Monthly, 80)],
            &[expense(60, "food", date(2025, 1, 2))],
            &categories,
            date(2025, 1, 3),
        );
        assert!(budget_alerts(&quiet).is_empty());
    }

    #[tokio::test]
    async fn one_budget_per_category() {
        let book = BudgetBook::new(LocalStore::in_memory());
        let new = || NewBudget {
            category_id: "food".into(),
            amount: Decimal::from(300),
            period: BudgetPeriod::Monthly,
            alert_threshold: 80,
        };
        let first = book.add(new(), Utc::now()).await.unwrap();
        assert!(matches!(book.add(new(), Utc::now()).await, Err(ClientError::Validation(_))));

        book.delete(&first.id).await.unwrap();
        assert!(book.list().await.is_empty());
        assert!(book.delete(&first.id).await.is_err());
    }

    #[tokio::test]
    async fn rejects_bad_threshold_and_amount() {
        let book = BudgetBook::new(LocalStore::in_memory());
        let zero = NewBudget {
            category_id: "food".into(),
            amount: Decimal::ZERO,
            period: BudgetPeriod::Monthly,
            alert_threshold: 80,
        };
        assert!(book.add(zero, Utc::now()).await.is_err());

        let threshold = NewBudget {
            category_id: "food".into(),
            amount: Decimal::from(10),
            period: BudgetPeriod::Monthly,
            alert_threshold: 0,
        };
        assert!(book.add(threshold, Utc::now()).await.is_err());

        let huge = NewBudget {
            category_id: "food".into(),
            amount: Decimal::MAX,
            period: BudgetPeriod::Monthly,
            alert_threshold: 80,
        };
        match book.add(huge, Utc::now()).await {
            Err(ClientError::Validation(message)) => assert_eq!(message, "Amount is too large"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(book.list().await.is_empty());
    }

    #[test]
    fn progress_survives_extreme_spending() {
        let categories = food();
        let index = CategoryIndex::new(&categories);
        let today = date(2025, 1, 20);
        let mut big = expense(1, "food", date(2025, 1, 2));
        big.amount = Decimal::MAX;

        let progress = budget(100, BudgetPeriod::Monthly, 80).progress(&[big.clone(), big], &index, today);
        assert_eq!(progress.spent, Decimal::MAX);
        assert_eq!(progress.remaining, Decimal::ZERO);
        assert_eq!(progress.bar_width, 100.0);
        assert_eq!(progress.status, BudgetStatus::Exceeded);
    }
}
