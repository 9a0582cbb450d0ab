//! Recurring expense templates, kept in the local store under
//! `recurring_expenses`.

use crate::errors::ClientError;
use crate::models::{DEFAULT_CURRENCY, Expense, NewExpense, check_amount_cap};
use crate::storage::{LocalStore, RECURRING_EXPENSES};
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Frequency {
    /// One step forward. Month and year steps clamp to the end of shorter
    /// months.
    pub fn advance(self, from: DateTime<Utc>) -> DateTime<Utc> {
        let next = match self {
            Self::Daily => from.checked_add_signed(Duration::days(1)),
            Self::Weekly => from.checked_add_signed(Duration::weeks(1)),
            Self::Monthly => from.checked_add_months(Months::new(1)),
            Self::Yearly => from.checked_add_months(Months::new(12)),
        };
        next.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
        }
    }
}

/// First occurrence strictly after `now`, stepping from `start`. A start in
/// the future is returned as is.
pub fn next_due(start: DateTime<Utc>, frequency: Frequency, now: DateTime<Utc>) -> DateTime<Utc> {
    if start > now {
        return start;
    }
    let mut next = start;
    while next <= now {
        next = frequency.advance(next);
    }
    next
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpense {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_processed: Option<DateTime<Utc>>,
    pub next_due: DateTime<Utc>,
}

impl RecurringExpense {
    /// Active, reached its due date, and that date is not past the end date.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.next_due <= now
            && self.end_date.is_none_or(|end| self.next_due.date_naive() <= end)
    }

    pub fn to_expense(&self, now: DateTime<Utc>) -> NewExpense {
        NewExpense {
            amount: self.amount,
            currency: self.currency.clone(),
            category_id: self.category_id.clone(),
            description: format!("{} (Recurring)", self.name),
            date: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecurring {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Clone)]
pub struct RecurringBook {
    store: LocalStore,
}

impl RecurringBook {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Vec<RecurringExpense> {
        self.store.load_list(RECURRING_EXPENSES).await
    }

    pub async fn due(&self, now: DateTime<Utc>) -> Vec<RecurringExpense> {
        self.list().await.into_iter().filter(|r| r.is_due(now)).collect()
    }

    pub async fn add(
        &self,
        new: NewRecurring,
        now: DateTime<Utc>,
    ) -> Result<RecurringExpense, ClientError> {
        let name = new.name.trim();
        if name.is_empty() || new.category_id.trim().is_empty() || new.amount <= Decimal::ZERO {
            return Err(ClientError::validation("Please fill in all required fields"));
        }
        check_amount_cap(new.amount)?;

        let start_date = new.start_date.unwrap_or_else(|| now.date_naive());
        if new.end_date.is_some_and(|end| end < start_date) {
            return Err(ClientError::validation("End date cannot be before the start date"));
        }
        let start = start_date.and_time(chrono::NaiveTime::MIN).and_utc();

        let recurring = RecurringExpense {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            amount: new.amount,
            currency: new
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            category_id: new.category_id,
            description: new.description,
            frequency: new.frequency,
            start_date,
            end_date: new.end_date,
            is_active: new.is_active,
            created_at: now,
            last_processed: None,
            next_due: next_due(start, new.frequency, now),
        };

        let mut all = self.list().await;
        all.push(recurring.clone());
        self.save(&all).await?;
        info!("recurring expense {} added, next due {}", recurring.id, recurring.next_due);
        Ok(recurring)
    }

    pub async fn toggle(&self, id: &str) -> Result<RecurringExpense, ClientError> {
        self.update(id, |r| r.is_active = !r.is_active).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let mut all = self.list().await;
        let before = all.len();
        all.retain(|r| r.id != id);
        if all.len() == before {
            return Err(not_found());
        }
        self.save(&all).await
    }

    /// Creates one expense from the template through `create`, then moves
    /// `nextDue` exactly one period past its previous value. Missed periods
    /// stay due and are caught up by processing again.
    pub async fn process<F, Fut>(
        &self,
        id: &str,
        now: DateTime<Utc>,
        create: F,
    ) -> Result<(Expense, RecurringExpense), ClientError>
    where
        F: FnOnce(NewExpense) -> Fut,
        Fut: Future<Output = Result<Expense, ClientError>>,
    {
        let recurring = self
            .list()
            .await
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(not_found)?;
        if !recurring.is_active {
            return Err(ClientError::validation(format!(
                "Recurring expense \"{}\" is paused",
                recurring.name
            )));
        }

        let expense = create(recurring.to_expense(now)).await?;

        let updated = self
            .update(id, |r| {
                r.last_processed = Some(now);
                r.next_due = r.frequency.advance(r.next_due);
            })
            .await?;
        info!(
            "recurring expense \"{}\" processed, next due {}",
            updated.name, updated.next_due
        );
        Ok((expense, updated))
    }

    async fn update(
        &self,
        id: &str,
        change: impl FnOnce(&mut RecurringExpense),
    ) -> Result<RecurringExpense, ClientError> {
        let mut all = self.list().await;
        let entry = all.iter_mut().find(|r| r.id == id).ok_or_else(not_found)?;
        change(entry);
        let updated = entry.clone();
        self.save(&all).await?;
        Ok(updated)
    }

    async fn save(&self, all: &[RecurringExpense]) -> Result<(), ClientError> {
        self.store.set_json(RECURRING_EXPENSES, all).await
    }
}

fn not_found() -> ClientError {
    ClientError::not_found("Recurring expense not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MAX_AMOUNT_UNITS;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn future_start_is_unchanged() {
        let start = at(2025, 3, 1, 0);
        assert_eq!(next_due(start, Frequency::Daily, at(2025, 2, 1, 0)), start);
    }

    #[test]
    fn past_monthly_start_lands_within_a_month() {
        let now = at(2025, 6, 15, 10);
        for start in [at(2020, 1, 31, 0), at(2025, 6, 15, 10), at(2024, 2, 29, 0), at(2025, 5, 16, 0)] {
            let due = next_due(start, Frequency::Monthly, now);
            assert!(due > now, "{start} -> {due}");
            assert!(due <= now.checked_add_months(Months::new(1)).unwrap(), "{start} -> {due}");
        }
    }

    #[test]
    fn steps_by_frequency() {
        let now = at(2025, 1, 10, 12);
        let start = at(2025, 1, 1, 0);
        assert_eq!(next_due(start, Frequency::Daily, now), at(2025, 1, 11, 0));
        assert_eq!(next_due(start, Frequency::Weekly, now), at(2025, 1, 15, 0));
        assert_eq!(next_due(start, Frequency::Monthly, now), at(2025, 2, 1, 0));
        assert_eq!(next_due(start, Frequency::Yearly, now), at(2026, 1, 1, 0));
    }

    #[test]
    fn month_end_clamps() {
        assert_eq!(Frequency::Monthly.advance(at(2025, 1, 31, 0)), at(2025, 2, 28, 0));
        assert_eq!(Frequency::Yearly.advance(at(2024, 2, 29, 0)), at(2025, 2, 28, 0));
    }

    fn new_rent(start: NaiveDate) -> NewRecurring {
        NewRecurring {
            name: "Rent".into(),
            amount: Decimal::from(1200),
            currency: None,
            category_id: "housing".into(),
            description: String::new(),
            frequency: Frequency::Monthly,
            start_date: Some(start),
            end_date: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn processing_advances_one_period() {
        let book = RecurringBook::new(LocalStore::in_memory());
        let created = book
            .add(new_rent(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), at(2024, 12, 1, 0))
            .await
            .unwrap();
        assert_eq!(created.next_due, at(2025, 1, 1, 0));
        assert_eq!(created.currency, "USD");

        // Three periods behind.
        let now = at(2025, 3, 20, 9);
        assert_eq!(book.due(now).await.len(), 1);

        let (expense, updated) = book
            .process(&created.id, now, |new| async move {
                assert_eq!(new.description, "Rent (Recurring)");
                assert_eq!(new.date, now);
                Ok(Expense {
                    id: "e1".into(),
                    user_id: "u".into(),
                    amount: new.amount,
                    currency: new.currency,
                    category_id: new.category_id,
                    description: new.description,
                    date: new.date,
                    created_at: None,
                    updated_at: None,
                })
            })
            .await
            .unwrap();
        assert_eq!(expense.amount, Decimal::from(1200));
        assert_eq!(updated.next_due, at(2025, 2, 1, 0));
        assert_eq!(updated.last_processed, Some(now));
        assert!(book.due(now).await[0].id == created.id);
    }

    #[tokio::test]
    async fn oversized_amount_is_rejected() {
        let book = RecurringBook::new(LocalStore::in_memory());
        let mut rent = new_rent(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        rent.amount = Decimal::from(MAX_AMOUNT_UNITS) + Decimal::ONE;
        let err = book.add(rent, at(2024, 12, 1, 0)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(message) if message == "Amount is too large"));
        assert!(book.list().await.is_empty());
    }

    #[tokio::test]
    async fn failed_creation_leaves_schedule_alone() {
        let book = RecurringBook::new(LocalStore::in_memory());
        let created = book
            .add(new_rent(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), at(2024, 12, 1, 0))
            .await
            .unwrap();

        let result = book
            .process(&created.id, at(2025, 1, 2, 0), |_| async {
                Err::<Expense, _>(ClientError::Timeout)
            })
            .await;
        assert!(matches!(result, Err(ClientError::Timeout)));
        assert_eq!(book.list().await[0].next_due, created.next_due);
    }

    #[tokio::test]
    async fn paused_entries_are_not_due_or_processed() {
        let book = RecurringBook::new(LocalStore::in_memory());
        let created = book
            .add(new_rent(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), at(2024, 12, 1, 0))
            .await
            .unwrap();
        let paused = book.toggle(&created.id).await.unwrap();
        assert!(!paused.is_active);

        let now = at(2025, 2, 1, 0);
        assert!(book.due(now).await.is_empty());
        let result = book
            .process(&created.id, now, |_| async {
                Err::<Expense, _>(ClientError::Timeout)
            })
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));

        book.delete(&created.id).await.unwrap();
        assert!(book.list().await.is_empty());
    }

    #[tokio::test]
    async fn add_requires_fields() {
        let book = RecurringBook::new(LocalStore::in_memory());
        let mut missing = new_rent(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        missing.name = " ".into();
        assert!(book.add(missing, Utc::now()).await.is_err());
    }
}
