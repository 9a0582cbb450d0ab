//! In-memory stand-in for the REST backend, used for offline development and
//! behind the mock REST server.

use crate::errors::ClientError;
use crate::models::{
    Category, Credentials, Expense, NewCategory, NewExpense, RegisterRequest, TokenResponse, User,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::sleep};
use tracing::info;
use uuid::Uuid;

pub const MOCK_USER_ID: &str = "mock-user-1";
pub const MOCK_TOKEN_LIFETIME_MS: i64 = 3_600_000;

#[derive(Debug, Default)]
struct MockData {
    user: Option<User>,
    token: Option<String>,
    categories: Vec<Category>,
    expenses: Vec<Expense>,
}

#[derive(Clone)]
pub struct MockBackend {
    data: Arc<Mutex<MockData>>,
    delay: Duration,
}

impl MockBackend {
    /// Two categories and two January 2025 expenses.
    pub fn seeded(delay: Duration) -> Self {
        let data = MockData {
            categories: vec![
                seed_category("mock-cat-1", "Groceries", "#FF5733"),
                seed_category("mock-cat-2", "Transportation", "#3b82f6"),
            ],
            expenses: vec![
                seed_expense(
                    "mock-exp-1",
                    Decimal::new(5075, 2),
                    "mock-cat-1",
                    "Weekly groceries",
                    Utc.with_ymd_and_hms(2025, 1, 9, 14, 30, 0).single(),
                ),
                seed_expense(
                    "mock-exp-2",
                    Decimal::new(2500, 2),
                    "mock-cat-2",
                    "Bus fare",
                    Utc.with_ymd_and_hms(2025, 1, 8, 9, 15, 0).single(),
                ),
            ],
            ..MockData::default()
        };
        Self {
            data: Arc::new(Mutex::new(data)),
            delay,
        }
    }

    pub fn empty() -> Self {
        Self {
            data: Arc::new(Mutex::new(MockData::default())),
            delay: Duration::ZERO,
        }
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> TokenResponse {
        self.pause().await;
        info!("mock backend: registering {}", request.email);
        let user = User {
            id: MOCK_USER_ID.to_string(),
            email: request.email.clone(),
            full_name: request.full_name.clone(),
            roles: vec!["USER".to_string()],
        };
        self.issue_token(user).await
    }

    /// Any credentials are accepted.
    pub async fn login(&self, credentials: &Credentials) -> TokenResponse {
        self.pause().await;
        info!("mock backend: logging in {}", credentials.email);
        let user = User {
            id: MOCK_USER_ID.to_string(),
            email: credentials.email.clone(),
            full_name: "Mock User".to_string(),
            roles: vec!["USER".to_string()],
        };
        self.issue_token(user).await
    }

    async fn issue_token(&self, user: User) -> TokenResponse {
        let token = format!("mock-jwt-token-{}", Utc::now().timestamp_millis());
        let mut data = self.data.lock().await;
        data.user = Some(user);
        data.token = Some(token.clone());
        TokenResponse {
            access_token: token,
            expires_in: MOCK_TOKEN_LIFETIME_MS,
        }
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        self.pause().await;
        let data = self.data.lock().await;
        match (&data.token, &data.user) {
            (Some(_), Some(user)) => Ok(user.clone()),
            _ => Err(ClientError::Unauthorized),
        }
    }

    pub async fn token_is_valid(&self, token: &str) -> bool {
        self.data.lock().await.token.as_deref() == Some(token)
    }

    pub async fn list_categories(&self) -> Vec<Category> {
        self.pause().await;
        self.data.lock().await.categories.clone()
    }

    pub async fn create_category(&self, new: NewCategory) -> Category {
        self.pause().await;
        let mut data = self.data.lock().await;
        let category = Category {
            id: generate_id(),
            user_id: owner_id(&data),
            name: new.name,
            color: new.color,
            description: new.description,
            icon: new.icon,
        };
        data.categories.push(category.clone());
        category
    }

    pub async fn update_category(&self, id: &str, new: NewCategory) -> Result<Category, ClientError> {
        self.pause().await;
        let mut data = self.data.lock().await;
        let category = data
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ClientError::not_found("Category not found"))?;
        category.name = new.name;
        category.color = new.color;
        category.description = new.description;
        category.icon = new.icon;
        Ok(category.clone())
    }

    /// Expenses that reference the category are left alone.
    pub async fn delete_category(&self, id: &str) -> Result<(), ClientError> {
        self.pause().await;
        let mut data = self.data.lock().await;
        let before = data.categories.len();
        data.categories.retain(|c| c.id != id);
        if data.categories.len() == before {
            return Err(ClientError::not_found("Category not found"));
        }
        Ok(())
    }

    pub async fn list_expenses(&self) -> Vec<Expense> {
        self.pause().await;
        self.data.lock().await.expenses.clone()
    }

    pub async fn get_expense(&self, id: &str) -> Result<Expense, ClientError> {
        self.pause().await;
        self.data
            .lock()
            .await
            .expenses
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("Expense not found"))
    }

    pub async fn create_expense(&self, new: NewExpense) -> Expense {
        self.pause().await;
        let now = Utc::now();
        let mut data = self.data.lock().await;
        let expense = Expense {
            id: generate_id(),
            user_id: owner_id(&data),
            amount: new.amount,
            currency: new.currency,
            category_id: new.category_id,
            description: new.description,
            date: new.date,
            created_at: Some(now),
            updated_at: Some(now),
        };
        data.expenses.push(expense.clone());
        expense
    }

    pub async fn update_expense(&self, id: &str, new: NewExpense) -> Result<Expense, ClientError> {
        self.pause().await;
        let mut data = self.data.lock().await;
        let expense = data
            .expenses
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ClientError::not_found("Expense not found"))?;
        expense.amount = new.amount;
        expense.currency = new.currency;
        expense.category_id = new.category_id;
        expense.description = new.description;
        expense.date = new.date;
        expense.updated_at = Some(Utc::now());
        Ok(expense.clone())
    }

    pub async fn delete_expense(&self, id: &str) -> Result<(), ClientError> {
        self.pause().await;
        let mut data = self.data.lock().await;
        let before = data.expenses.len();
        data.expenses.retain(|e| e.id != id);
        if data.expenses.len() == before {
            return Err(ClientError::not_found("Expense not found"));
        }
        Ok(())
    }
}

fn generate_id() -> String {
    format!("mock-{}", Uuid::new_v4())
}

fn owner_id(data: &MockData) -> String {
    data.user
        .as_ref()
        .map(|u| u.id.clone())
        .unwrap_or_else(|| MOCK_USER_ID.to_string())
}

fn seed_category(id: &str, name: &str, color: &str) -> Category {
    Category {
        id: id.to_string(),
        user_id: MOCK_USER_ID.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        description: None,
        icon: None,
    }
}

fn seed_expense(
    id: &str,
    amount: Decimal,
    category_id: &str,
    description: &str,
    date: Option<DateTime<Utc>>,
) -> Expense {
    let date = date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    Expense {
        id: id.to_string(),
        user_id: MOCK_USER_ID.to_string(),
        amount,
        currency: "USD".to_string(),
        category_id: category_id.to_string(),
        description: description.to_string(),
        date,
        created_at: Some(date),
        updated_at: Some(date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_expense(description: &str) -> NewExpense {
        NewExpense {
            amount: Decimal::new(1999, 2),
            currency: "USD".into(),
            category_id: "mock-cat-1".into(),
            description: description.into(),
            date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn seeded_data_matches_fixture() {
        let mock = MockBackend::seeded(Duration::ZERO);
        let categories = mock.list_categories().await;
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "Groceries");
        assert_eq!(categories[0].color, "#FF5733");

        let expenses = mock.list_expenses().await;
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].amount, Decimal::new(5075, 2));
        assert_eq!(expenses[1].description, "Bus fare");
    }

    #[tokio::test]
    async fn login_issues_token_and_user() {
        let mock = MockBackend::empty();
        assert!(matches!(mock.current_user().await, Err(ClientError::Unauthorized)));

        let token = mock
            .login(&Credentials {
                email: "a@b.c".into(),
                password: "pw".into(),
            })
            .await;
        assert!(token.access_token.starts_with("mock-jwt-token-"));
        assert_eq!(token.expires_in, MOCK_TOKEN_LIFETIME_MS);
        assert!(mock.token_is_valid(&token.access_token).await);
        assert!(!mock.token_is_valid("other").await);

        let user = mock.current_user().await.unwrap();
        assert_eq!(user.email, "a@b.c");
        assert_eq!(user.id, MOCK_USER_ID);
    }

    #[tokio::test]
    async fn update_merges_and_bumps_timestamp() {
        let mock = MockBackend::seeded(Duration::ZERO);
        let updated = mock
            .update_expense("mock-exp-2", new_expense("Train fare"))
            .await
            .unwrap();
        assert_eq!(updated.description, "Train fare");
        assert_eq!(updated.id, "mock-exp-2");
        assert!(updated.updated_at > updated.created_at);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let mock = MockBackend::empty();
        let err = mock.get_expense("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Expense not found");
        let err = mock.delete_category("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Category not found");
    }

    #[tokio::test]
    async fn deleting_category_keeps_expenses() {
        let mock = MockBackend::seeded(Duration::ZERO);
        mock.delete_category("mock-cat-1").await.unwrap();
        let expenses = mock.list_expenses().await;
        assert!(expenses.iter().any(|e| e.category_id == "mock-cat-1"));

        let created = mock.create_expense(new_expense("Snacks")).await;
        assert!(created.id.starts_with("mock-"));
        assert_eq!(mock.list_expenses().await.len(), 3);
    }
}
