pub mod api;
pub mod app;
pub mod auth;
pub mod backend;
pub mod budgets;
pub mod categories;
pub mod charts;
pub mod config;
pub mod endpoints;
pub mod errors;
pub mod export;
pub mod filters;
pub mod handlers;
pub mod mock;
pub mod mock_api;
pub mod models;
pub mod period;
pub mod receipts;
pub mod recurring;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod state;

pub use app::router;
pub use state::AppState;
pub use storage::{LocalStore, resolve_data_path};
