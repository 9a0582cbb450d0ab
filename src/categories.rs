use crate::models::{Category, Expense};
use serde::Serialize;
use std::collections::HashMap;

pub const UNKNOWN_CATEGORY: &str = "Unknown";
pub const UNKNOWN_COLOR: &str = "#9ca3af";

/// Category looked up by id. Expenses may point at a category that has since
/// been deleted, in which case the reference is empty and displays as
/// "Unknown".
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryRef<'a>(Option<&'a Category>);

impl<'a> CategoryRef<'a> {
    pub fn category(&self) -> Option<&'a Category> {
        self.0
    }

    pub fn name(&self) -> &'a str {
        self.0.map(|c| c.name.as_str()).unwrap_or(UNKNOWN_CATEGORY)
    }

    pub fn color(&self) -> &'a str {
        self.0.map(|c| c.color.as_str()).unwrap_or(UNKNOWN_COLOR)
    }
}

/// Resolves category ids once per request.
pub struct CategoryIndex<'a> {
    by_id: HashMap<&'a str, &'a Category>,
}

impl<'a> CategoryIndex<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        Self {
            by_id: categories.iter().map(|c| (c.id.as_str(), c)).collect(),
        }
    }

    pub fn resolve(&self, category_id: &str) -> CategoryRef<'a> {
        CategoryRef(self.by_id.get(category_id).copied())
    }

    pub fn contains(&self, category_id: &str) -> bool {
        self.by_id.contains_key(category_id)
    }

    pub fn resolve_all<I>(&self, expenses: I) -> Vec<ResolvedExpense<'a>>
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        expenses
            .into_iter()
            .map(|expense| ResolvedExpense {
                expense,
                category: self.resolve(&expense.category_id),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedExpense<'a> {
    pub expense: &'a Expense,
    pub category: CategoryRef<'a>,
}

impl<'a> ResolvedExpense<'a> {
    pub fn view(&self) -> ExpenseView<'a> {
        ExpenseView {
            expense: self.expense,
            category_name: self.category.name(),
            category_color: self.category.color(),
        }
    }
}

/// Expense as shown to the user, carrying its resolved category.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView<'a> {
    #[serde(flatten)]
    pub expense: &'a Expense,
    pub category_name: &'a str,
    pub category_color: &'a str,
}
