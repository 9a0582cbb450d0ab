//! Category and expense services. Every call goes either to the REST backend
//! or to the in-process mock, chosen once at startup.

use crate::api::{ApiClient, ConnectionStatus};
use crate::config::Config;
use crate::errors::ClientError;
use crate::mock::MockBackend;
use crate::models::{
    Category, Credentials, Expense, NewCategory, NewExpense, RegisterRequest, TokenResponse, User,
};
use crate::storage::LocalStore;
use tracing::info;

#[derive(Clone)]
pub enum Backend {
    Http(ApiClient),
    Mock(MockBackend),
}

impl Backend {
    pub fn from_config(config: &Config, store: LocalStore) -> Result<Self, ClientError> {
        if config.use_mock_backend {
            info!("using in-process mock backend");
            return Ok(Self::Mock(MockBackend::seeded(config.mock_delay)));
        }
        info!("using REST backend at {}", config.api_base_url);
        Ok(Self::Http(ApiClient::new(
            config.api_base_url.clone(),
            config.api_timeout,
            store,
        )?))
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, ClientError> {
        match self {
            Self::Http(api) => api.post("/v1/auth/register", request, "Registration failed").await,
            Self::Mock(mock) => Ok(mock.register(request).await),
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ClientError> {
        match self {
            Self::Http(api) => api.post("/v1/auth/login", credentials, "Login failed").await,
            Self::Mock(mock) => Ok(mock.login(credentials).await),
        }
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        match self {
            Self::Http(api) => api.get("/users/me", "Failed to fetch user").await,
            Self::Mock(mock) => mock.current_user().await,
        }
    }

    pub async fn check_connection(&self) -> ConnectionStatus {
        match self {
            Self::Http(api) => api.check_connection().await,
            Self::Mock(_) => ConnectionStatus {
                reachable: true,
                status: None,
                message: "Using mock backend".to_string(),
            },
        }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        match self {
            Self::Http(api) => api.get("/categories", "Failed to fetch categories").await,
            Self::Mock(mock) => Ok(mock.list_categories().await),
        }
    }

    pub async fn create_category(&self, new: NewCategory) -> Result<Category, ClientError> {
        let new = new.normalized()?;
        let category: Category = match self {
            Self::Http(api) => api.post("/categories", &new, "Failed to create category").await?,
            Self::Mock(mock) => mock.create_category(new).await,
        };
        info!("category {} created", category.id);
        Ok(category)
    }

    pub async fn update_category(&self, id: &str, new: NewCategory) -> Result<Category, ClientError> {
        let new = new.normalized()?;
        match self {
            Self::Http(api) => {
                api.put(&format!("/categories/{id}"), &new, "Failed to update category")
                    .await
            }
            Self::Mock(mock) => mock.update_category(id, new).await,
        }
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ClientError> {
        match self {
            Self::Http(api) => {
                api.delete(&format!("/categories/{id}"), "Failed to delete category")
                    .await?
            }
            Self::Mock(mock) => mock.delete_category(id).await?,
        }
        info!("category {id} deleted");
        Ok(())
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, ClientError> {
        match self {
            Self::Http(api) => api.get("/expenses", "Failed to fetch expenses").await,
            Self::Mock(mock) => Ok(mock.list_expenses().await),
        }
    }

    pub async fn get_expense(&self, id: &str) -> Result<Expense, ClientError> {
        match self {
            Self::Http(api) => api.get(&format!("/expenses/{id}"), "Failed to fetch expense").await,
            Self::Mock(mock) => mock.get_expense(id).await,
        }
    }

    pub async fn create_expense(&self, new: NewExpense) -> Result<Expense, ClientError> {
        new.validate()?;
        let expense: Expense = match self {
            Self::Http(api) => api.post("/expenses", &new, "Failed to create expense").await?,
            Self::Mock(mock) => mock.create_expense(new).await,
        };
        info!("expense {} created", expense.id);
        Ok(expense)
    }

    pub async fn update_expense(&self, id: &str, new: NewExpense) -> Result<Expense, ClientError> {
        new.validate()?;
        match self {
            Self::Http(api) => {
                api.put(&format!("/expenses/{id}"), &new, "Failed to update expense")
                    .await
            }
            Self::Mock(mock) => mock.update_expense(id, new).await,
        }
    }

    pub async fn delete_expense(&self, id: &str) -> Result<(), ClientError> {
        match self {
            Self::Http(api) => {
                api.delete(&format!("/expenses/{id}"), "Failed to delete expense")
                    .await?
            }
            Self::Mock(mock) => mock.delete_expense(id).await?,
        }
        info!("expense {id} deleted");
        Ok(())
    }
}
