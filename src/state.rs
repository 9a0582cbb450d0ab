use crate::auth::AuthService;
use crate::backend::Backend;
use crate::budgets::BudgetBook;
use crate::receipts::ReceiptBook;
use crate::recurring::RecurringBook;
use crate::storage::LocalStore;

#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub auth: AuthService,
    pub budgets: BudgetBook,
    pub recurring: RecurringBook,
    pub receipts: ReceiptBook,
}

impl AppState {
    pub fn new(store: LocalStore, backend: Backend) -> Self {
        Self {
            auth: AuthService::new(backend.clone(), store.clone()),
            budgets: BudgetBook::new(store.clone()),
            recurring: RecurringBook::new(store.clone()),
            receipts: ReceiptBook::new(store),
            backend,
        }
    }
}
