use crate::endpoints;
use crate::handlers;
use crate::state::AppState;
use crate::receipts::MAX_UPLOAD_BODY;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route("/register", post(handlers::register_submit))
        .route("/logout", post(handlers::logout))
        .route("/dashboard", get(handlers::dashboard))
        .route("/dashboard/expenses", post(handlers::create_expense))
        .route("/dashboard/expenses/:id/delete", post(handlers::delete_expense))
        .route("/dashboard/categories", post(handlers::create_category))
        .route("/analytics", get(handlers::analytics))
        .route("/analytics/budgets", post(handlers::create_budget))
        .route("/analytics/budgets/:id/delete", post(handlers::delete_budget))
        .route("/analytics/recurring", post(handlers::create_recurring))
        .route("/analytics/recurring/:id/process", post(handlers::process_recurring))
        .route("/analytics/recurring/:id/toggle", post(handlers::toggle_recurring))
        .route("/analytics/recurring/:id/delete", post(handlers::delete_recurring))
        .route("/api/session", get(endpoints::session))
        .route("/api/session/login", post(endpoints::session_login))
        .route("/api/session/register", post(endpoints::session_register))
        .route("/api/session/logout", post(endpoints::session_logout))
        .route("/api/connection", get(endpoints::connection))
        .route("/api/expenses", get(endpoints::list_expenses).post(endpoints::create_expense))
        .route(
            "/api/expenses/:id",
            get(endpoints::get_expense)
                .put(endpoints::update_expense)
                .delete(endpoints::delete_expense),
        )
        .route("/api/categories", get(endpoints::list_categories).post(endpoints::create_category))
        .route(
            "/api/categories/:id",
            put(endpoints::update_category).delete(endpoints::delete_category),
        )
        .route("/api/summary", get(endpoints::summary))
        .route("/api/analytics", get(endpoints::analytics))
        .route("/api/charts", get(endpoints::charts))
        .route("/api/budgets", get(endpoints::list_budgets).post(endpoints::create_budget))
        .route("/api/budgets/alerts", get(endpoints::budget_alert_list))
        .route("/api/budgets/:id", delete(endpoints::delete_budget))
        .route("/api/recurring", get(endpoints::list_recurring).post(endpoints::create_recurring))
        .route("/api/recurring/due", get(endpoints::due_recurring))
        .route("/api/recurring/:id", delete(endpoints::delete_recurring))
        .route("/api/recurring/:id/toggle", post(endpoints::toggle_recurring))
        .route("/api/recurring/:id/process", post(endpoints::process_recurring))
        .route(
            "/api/receipts",
            get(endpoints::list_receipts)
                .post(endpoints::upload_receipts)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        )
        .route("/api/receipts/:id", delete(endpoints::delete_receipt))
        .route("/api/export", get(endpoints::export_expenses))
        .with_state(state)
}
