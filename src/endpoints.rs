//! JSON API mirroring the pages, for scripts and the integration tests.

use crate::api::ConnectionStatus;
use crate::budgets::{BudgetAlert, NewBudget, budget_alerts, budget_views};
use crate::categories::{CategoryIndex, ExpenseView};
use crate::charts::build_charts_at;
use crate::errors::AppError;
use crate::export::{ExportFormat, ExportScope, export};
use crate::filters::{FilterParams, total};
use crate::handlers::{PeriodQuery, load_records, require_session};
use crate::models::{
    Category, Credentials, Expense, NewCategory, NewExpense, RegisterRequest, SessionResponse, User,
};
use crate::period::summary_selection;
use crate::receipts::{Receipt, ReceiptUpload, UploadOutcome};
use crate::recurring::{NewRecurring, RecurringExpense};
use crate::state::AppState;
use crate::stats::{build_analytics_at, build_summary_at};
use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub user: Option<User>,
    pub mock: bool,
}

pub async fn session(State(state): State<AppState>) -> Json<SessionInfo> {
    let authenticated = state.auth.is_authenticated().await;
    let user = if authenticated {
        state.auth.current_user().await
    } else {
        None
    };
    Json(SessionInfo {
        authenticated,
        user,
        mock: state.backend.is_mock(),
    })
}

pub async fn session_login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(state.auth.login(credentials).await?))
}

pub async fn session_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn session_logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.auth.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn connection(State(state): State<AppState>) -> Json<ConnectionStatus> {
    Json(state.backend.check_connection().await)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseList<'a> {
    expenses: Vec<ExpenseView<'a>>,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
    count: usize,
    active_filters: Vec<String>,
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Response, AppError> {
    require_session(&state).await?;
    let filter = params.into_filter()?;
    let (expenses, categories) = load_records(&state).await?;
    let index = CategoryIndex::new(&categories);

    let matching = filter.apply(&expenses, Utc::now().date_naive());
    let list = ExpenseList {
        total: total(matching.iter().copied()),
        count: matching.len(),
        active_filters: filter.describe(&index),
        expenses: index.resolve_all(matching).iter().map(|r| r.view()).collect(),
    };
    Ok(Json(list).into_response())
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Expense>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.get_expense(&id).await?))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Json(new): Json<NewExpense>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    require_session(&state).await?;
    let expense = state.backend.create_expense(new).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(new): Json<NewExpense>,
) -> Result<Json<Expense>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.update_expense(&id, new).await?))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_session(&state).await?;
    state.backend.delete_expense(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.list_categories().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(new): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    require_session(&state).await?;
    let category = state.backend.create_category(new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(new): Json<NewCategory>,
) -> Result<Json<Category>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.update_category(&id, new).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_session(&state).await?;
    state.backend.delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    require_session(&state).await?;
    let (period, compare) = summary_selection(query.period.as_deref(), query.compare.as_deref())?;
    let (expenses, categories) = load_records(&state).await?;
    let report = build_summary_at(
        Utc::now().date_naive(),
        &expenses,
        &categories,
        period,
        compare,
    );
    Ok(Json(report).into_response())
}

pub async fn analytics(State(state): State<AppState>) -> Result<Response, AppError> {
    require_session(&state).await?;
    let (expenses, categories) = load_records(&state).await?;
    let summary = build_analytics_at(Utc::now().date_naive(), &expenses, &categories);
    Ok(Json(summary).into_response())
}

pub async fn charts(State(state): State<AppState>) -> Result<Response, AppError> {
    require_session(&state).await?;
    let (expenses, categories) = load_records(&state).await?;
    let charts = build_charts_at(Utc::now().date_naive(), &expenses, &categories);
    Ok(Json(charts).into_response())
}

pub async fn list_budgets(State(state): State<AppState>) -> Result<Response, AppError> {
    require_session(&state).await?;
    let (expenses, categories) = load_records(&state).await?;
    let views = budget_views(
        state.budgets.list().await,
        &expenses,
        &categories,
        Utc::now().date_naive(),
    );
    Ok(Json(views).into_response())
}

pub async fn create_budget(
    State(state): State<AppState>,
    Json(new): Json<NewBudget>,
) -> Result<Response, AppError> {
    require_session(&state).await?;
    let budget = state.budgets.add(new, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(budget)).into_response())
}

pub async fn delete_budget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_session(&state).await?;
    state.budgets.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: BudgetAlert,
    pub message: String,
}

pub async fn budget_alert_list(State(state): State<AppState>) -> Result<Json<Vec<AlertView>>, AppError> {
    require_session(&state).await?;
    let (expenses, categories) = load_records(&state).await?;
    let views = budget_views(
        state.budgets.list().await,
        &expenses,
        &categories,
        Utc::now().date_naive(),
    );
    let alerts = budget_alerts(&views)
        .into_iter()
        .map(|alert| AlertView {
            message: alert.message(),
            alert,
        })
        .collect();
    Ok(Json(alerts))
}

pub async fn list_recurring(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecurringExpense>>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.recurring.list().await))
}

pub async fn due_recurring(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecurringExpense>>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.recurring.due(Utc::now()).await))
}

pub async fn create_recurring(
    State(state): State<AppState>,
    Json(new): Json<NewRecurring>,
) -> Result<(StatusCode, Json<RecurringExpense>), AppError> {
    require_session(&state).await?;
    let recurring = state.recurring.add(new, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(recurring)))
}

pub async fn toggle_recurring(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecurringExpense>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.recurring.toggle(&id).await?))
}

#[derive(Debug, Serialize)]
pub struct ProcessedRecurring {
    pub expense: Expense,
    pub recurring: RecurringExpense,
}

pub async fn process_recurring(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ProcessedRecurring>), AppError> {
    require_session(&state).await?;
    let backend = state.backend.clone();
    let (expense, recurring) = state
        .recurring
        .process(&id, Utc::now(), move |new| async move {
            backend.create_expense(new).await
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ProcessedRecurring { expense, recurring })))
}

pub async fn delete_recurring(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_session(&state).await?;
    state.recurring.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_receipts(State(state): State<AppState>) -> Result<Json<Vec<Receipt>>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.receipts.list().await))
}

pub async fn upload_receipts(
    State(state): State<AppState>,
    Json(uploads): Json<Vec<ReceiptUpload>>,
) -> Result<(StatusCode, Json<UploadOutcome>), AppError> {
    require_session(&state).await?;
    let outcome = state.receipts.upload(uploads, Utc::now()).await?;
    let status = if outcome.receipts.is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome)))
}

pub async fn delete_receipt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_session(&state).await?;
    state.receipts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub scope: ExportScope,
}

/// Serves the export as a download. The filtered scope applies the same
/// query parameters as the expense list.
pub async fn export_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    Query(params): Query<FilterParams>,
) -> Result<Response, AppError> {
    require_session(&state).await?;
    let filter = match query.scope {
        ExportScope::All => Default::default(),
        ExportScope::Filtered => params.into_filter()?,
    };
    let (expenses, categories) = load_records(&state).await?;
    let now = Utc::now();
    let index = CategoryIndex::new(&categories);
    let selected = index.resolve_all(filter.apply(&expenses, now.date_naive()));

    let file = export(query.format, &selected, &categories, now)?;
    info!("exported {} expense(s) to {}", selected.len(), file.file_name);
    let headers = [
        (header::CONTENT_TYPE, file.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        ),
    ];
    Ok((headers, file.bytes).into_response())
}
