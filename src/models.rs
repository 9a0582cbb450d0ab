use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::ClientError;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_CATEGORY_COLOR: &str = "#3b82f6";
pub const DEFAULT_CATEGORY_ICON: &str = "💰";

/// Largest amount accepted on any form, in whole currency units.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;

/// Rejects amounts above `MAX_AMOUNT_UNITS` so totals stay far from the
/// `Decimal` range.
pub fn check_amount_cap(amount: Decimal) -> Result<(), ClientError> {
    if amount > Decimal::from(MAX_AMOUNT_UNITS) {
        return Err(ClientError::validation("Amount is too large"));
    }
    Ok(())
}

/// Amount with exactly two decimals.
pub fn format_amount(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating or replacing an expense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub category_id: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.amount < Decimal::ZERO {
            return Err(ClientError::validation("Amount cannot be negative"));
        }
        check_amount_cap(self.amount)?;
        if self.category_id.trim().is_empty() || self.description.trim().is_empty() {
            return Err(ClientError::validation("Please fill in all required fields"));
        }
        Ok(())
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NewCategory {
    /// Trims the name, fills in the default icon and drops an empty
    /// description. Fails when the name is blank.
    pub fn normalized(mut self) -> Result<Self, ClientError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ClientError::validation("Category name is required"));
        }
        self.name = name.to_string();
        if self.color.trim().is_empty() {
            self.color = default_color();
        }
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if self.icon.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            self.icon = Some(DEFAULT_CATEGORY_ICON.to_string());
        }
        Ok(self)
    }
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    /// Token lifetime in milliseconds.
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: User,
    pub access_token: String,
}
