use crate::budgets::{
    BudgetPeriod, DEFAULT_ALERT_THRESHOLD, NewBudget, budget_alerts, budget_views,
};
use crate::categories::CategoryIndex;
use crate::charts::monthly_trend;
use crate::errors::{AppError, ClientError};
use crate::filters::{FilterParams, total};
use crate::models::{
    Category, Credentials, DEFAULT_CURRENCY, Expense, NewCategory, NewExpense, RegisterRequest, User,
};
use crate::period::summary_selection;
use crate::recurring::{Frequency, NewRecurring};
use crate::state::AppState;
use crate::stats::{build_analytics_at, build_summary_at};
use crate::ui::{
    AnalyticsPage, DashboardPage, render_analytics, render_dashboard, render_home, render_login,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

/// Fails with `Unauthorized` (a redirect to `/login`) unless a live session
/// exists.
pub async fn require_session(state: &AppState) -> Result<Option<User>, AppError> {
    if state.auth.is_authenticated().await {
        Ok(state.auth.current_user().await)
    } else {
        Err(AppError::unauthorized())
    }
}

pub async fn load_records(state: &AppState) -> Result<(Vec<Expense>, Vec<Category>), ClientError> {
    tokio::try_join!(state.backend.list_expenses(), state.backend.list_categories())
}

pub async fn home(State(state): State<AppState>) -> Html<String> {
    let user = if state.auth.is_authenticated().await {
        state.auth.current_user().await
    } else {
        None
    };
    Html(render_home(user.as_ref()))
}

pub async fn login_page(State(state): State<AppState>) -> Response {
    if state.auth.is_authenticated().await {
        return Redirect::to("/dashboard").into_response();
    }
    Html(render_login(None)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let credentials = Credentials {
        email: form.email.trim().to_string(),
        password: form.password,
    };
    match state.auth.login(credentials).await {
        Ok(_) => Redirect::to("/dashboard").into_response(),
        Err(err) => login_failure(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: Option<String>,
}

pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form
        .confirm_password
        .as_deref()
        .is_some_and(|confirm| !confirm.is_empty() && confirm != form.password)
    {
        return login_failure(ClientError::validation("Passwords do not match"));
    }
    let request = RegisterRequest {
        email: form.email.trim().to_string(),
        password: form.password,
        full_name: form.full_name.trim().to_string(),
    };
    match state.auth.register(request).await {
        Ok(_) => Redirect::to("/dashboard").into_response(),
        Err(err) => login_failure(err),
    }
}

fn login_failure(err: ClientError) -> Response {
    let message = match &err {
        ClientError::Unauthorized => "Invalid email or password".to_string(),
        other => other.to_string(),
    };
    warn!("sign-in failed: {message}");
    let status = match err {
        ClientError::Validation(_) => StatusCode::BAD_REQUEST,
        ClientError::Unauthorized => StatusCode::UNAUTHORIZED,
        _ => AppError::from(err).status,
    };
    (status, Html(render_login(Some(&message)))).into_response()
}

pub async fn logout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.auth.logout().await?;
    Ok(Redirect::to("/"))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let user = require_session(&state).await?;
    Ok(Html(dashboard_html(&state, user.as_ref(), None).await?))
}

async fn dashboard_html(
    state: &AppState,
    user: Option<&User>,
    error: Option<&str>,
) -> Result<String, AppError> {
    let (expenses, categories) = load_records(state).await?;
    let index = CategoryIndex::new(&categories);
    let resolved = index.resolve_all(&expenses);
    Ok(render_dashboard(&DashboardPage {
        user,
        expenses: &resolved,
        categories: &categories,
        total: total(&expenses),
        error,
    }))
}

/// Re-renders the dashboard with the failure shown above the forms.
async fn dashboard_failure(
    state: &AppState,
    user: Option<&User>,
    err: ClientError,
) -> Result<Response, AppError> {
    let failure = AppError::from(err);
    if failure.status == StatusCode::UNAUTHORIZED {
        return Err(failure);
    }
    warn!("dashboard action failed: {}", failure.message);
    let html = dashboard_html(state, user, Some(&failure.message)).await?;
    Ok((failure.status, Html(html)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseForm {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
}

impl ExpenseForm {
    pub fn into_new_expense(self, now: DateTime<Utc>) -> Result<NewExpense, ClientError> {
        let raw_amount = self.amount.trim();
        if raw_amount.is_empty() {
            return Err(ClientError::validation("Please fill in all required fields"));
        }
        let amount = raw_amount
            .parse::<Decimal>()
            .map_err(|_| ClientError::validation(format!("invalid amount: {raw_amount}")))?;
        let currency = match self.currency.trim() {
            "" => DEFAULT_CURRENCY.to_string(),
            code => code.to_uppercase(),
        };
        Ok(NewExpense {
            amount,
            currency,
            category_id: self.category_id.trim().to_string(),
            description: self.description.trim().to_string(),
            date: parse_form_date(&self.date, now)?,
        })
    }
}

/// Accepts RFC 3339, `datetime-local` values and plain dates. Blank means
/// `now`.
pub fn parse_form_date(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClientError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(now);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| ClientError::validation(format!("invalid date: {raw}")))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Form(form): Form<ExpenseForm>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    let result = match form.into_new_expense(Utc::now()) {
        Ok(new) => state.backend.create_expense(new).await.map(|_| ()),
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => Ok(Redirect::to("/dashboard").into_response()),
        Err(err) => dashboard_failure(&state, user.as_ref(), err).await,
    }
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    match state.backend.delete_expense(&id).await {
        Ok(()) => Ok(Redirect::to("/dashboard").into_response()),
        Err(err) => dashboard_failure(&state, user.as_ref(), err).await,
    }
}

pub async fn create_category(
    State(state): State<AppState>,
    Form(new): Form<NewCategory>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    match state.backend.create_category(new).await {
        Ok(_) => Ok(Redirect::to("/dashboard").into_response()),
        Err(err) => dashboard_failure(&state, user.as_ref(), err).await,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
    pub compare: Option<String>,
}

pub async fn analytics(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
    Query(period): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    let html = analytics_html(&state, user.as_ref(), params, period, None).await?;
    Ok(Html(html).into_response())
}

async fn analytics_html(
    state: &AppState,
    user: Option<&User>,
    params: FilterParams,
    query: PeriodQuery,
    error: Option<&str>,
) -> Result<String, AppError> {
    let (expenses, categories) = load_records(state).await?;
    let now = Utc::now();
    let today = now.date_naive();

    let filter = params.clone().into_filter()?;
    let (period, compare) = summary_selection(query.period.as_deref(), query.compare.as_deref())?;

    let index = CategoryIndex::new(&categories);
    let filtered = index.resolve_all(filter.apply(&expenses, today));
    let filtered_total = total(filtered.iter().map(|r| r.expense));
    let active_filters = filter.describe(&index);

    let summary = build_analytics_at(today, &expenses, &categories);
    let report = build_summary_at(today, &expenses, &categories, period, compare);
    let budgets = budget_views(state.budgets.list().await, &expenses, &categories, today);
    let alerts = budget_alerts(&budgets);
    let recurring = state.recurring.list().await;
    let receipts = state.receipts.list().await;
    let trend = monthly_trend(&expenses);

    Ok(render_analytics(&AnalyticsPage {
        user,
        now,
        summary: &summary,
        report: &report,
        period,
        params: &params,
        active_filters: &active_filters,
        filtered: &filtered,
        filtered_total,
        categories: &categories,
        budgets: &budgets,
        alerts: &alerts,
        recurring: &recurring,
        receipts: &receipts,
        monthly_trend: &trend,
        error,
    }))
}

/// Redirects back to the analytics page on success, otherwise re-renders it
/// with the failure message.
async fn analytics_outcome<T>(
    state: &AppState,
    user: Option<&User>,
    result: Result<T, ClientError>,
) -> Result<Response, AppError> {
    let err = match result {
        Ok(_) => return Ok(Redirect::to("/analytics").into_response()),
        Err(err) => err,
    };
    let failure = AppError::from(err);
    if failure.status == StatusCode::UNAUTHORIZED {
        return Err(failure);
    }
    warn!("analytics action failed: {}", failure.message);
    let html = analytics_html(
        state,
        user,
        FilterParams::default(),
        PeriodQuery::default(),
        Some(&failure.message),
    )
    .await?;
    Ok((failure.status, Html(html)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    #[serde(default)]
    category_id: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    alert_threshold: Option<String>,
}

impl BudgetForm {
    fn into_new_budget(self) -> Result<NewBudget, ClientError> {
        let amount = self
            .amount
            .trim()
            .parse::<Decimal>()
            .map_err(|_| ClientError::validation("Please fill in all required fields"))?;
        let period = match self.period.as_deref().map(str::trim) {
            Some("yearly") => BudgetPeriod::Yearly,
            _ => BudgetPeriod::Monthly,
        };
        let alert_threshold = match self.alert_threshold.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_ALERT_THRESHOLD,
            Some(raw) => raw
                .parse::<u8>()
                .map_err(|_| ClientError::validation("Alert threshold must be between 1 and 100"))?,
        };
        Ok(NewBudget {
            category_id: self.category_id.trim().to_string(),
            amount,
            period,
            alert_threshold,
        })
    }
}

pub async fn create_budget(
    State(state): State<AppState>,
    Form(form): Form<BudgetForm>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    let result = match form.into_new_budget() {
        Ok(new) => state.budgets.add(new, Utc::now()).await,
        Err(err) => Err(err),
    };
    analytics_outcome(&state, user.as_ref(), result).await
}

pub async fn delete_budget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    let result = state.budgets.delete(&id).await;
    analytics_outcome(&state, user.as_ref(), result).await
}

#[derive(Debug, Deserialize)]
pub struct RecurringForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    category_id: String,
    #[serde(default)]
    frequency: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    description: String,
}

impl RecurringForm {
    fn into_new_recurring(self) -> Result<NewRecurring, ClientError> {
        let amount = self
            .amount
            .trim()
            .parse::<Decimal>()
            .map_err(|_| ClientError::validation("Please fill in all required fields"))?;
        let frequency = match self.frequency.as_deref().map(str::trim) {
            Some("daily") => Frequency::Daily,
            Some("weekly") => Frequency::Weekly,
            Some("yearly") => Frequency::Yearly,
            _ => Frequency::Monthly,
        };
        let date = |raw: Option<String>| -> Result<Option<NaiveDate>, ClientError> {
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|_| ClientError::validation(format!("invalid date: {value}"))),
            }
        };
        Ok(NewRecurring {
            name: self.name,
            amount,
            currency: None,
            category_id: self.category_id.trim().to_string(),
            description: self.description.trim().to_string(),
            frequency,
            start_date: date(self.start_date)?,
            end_date: date(self.end_date)?,
            is_active: true,
        })
    }
}

pub async fn create_recurring(
    State(state): State<AppState>,
    Form(form): Form<RecurringForm>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    let result = match form.into_new_recurring() {
        Ok(new) => state.recurring.add(new, Utc::now()).await,
        Err(err) => Err(err),
    };
    analytics_outcome(&state, user.as_ref(), result).await
}

pub async fn process_recurring(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    let backend = state.backend.clone();
    let result = state
        .recurring
        .process(&id, Utc::now(), move |new| async move {
            backend.create_expense(new).await
        })
        .await;
    analytics_outcome(&state, user.as_ref(), result).await
}

pub async fn toggle_recurring(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    let result = state.recurring.toggle(&id).await;
    analytics_outcome(&state, user.as_ref(), result).await
}

pub async fn delete_recurring(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = require_session(&state).await?;
    let result = state.recurring.delete(&id).await;
    analytics_outcome(&state, user.as_ref(), result).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn form_dates_accept_browser_formats() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_form_date("", now).unwrap(), now);
        assert_eq!(
            parse_form_date("2025-01-09T14:30", now).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 9, 14, 30, 0).unwrap()
        );
        assert_eq!(
            parse_form_date("2025-01-09T14:30:00Z", now).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 9, 14, 30, 0).unwrap()
        );
        assert_eq!(
            parse_form_date("2025-01-09", now).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap()
        );
        assert!(parse_form_date("yesterday", now).is_err());
    }

    #[test]
    fn expense_form_requires_amount() {
        let form = ExpenseForm {
            category_id: "c".into(),
            description: "Lunch".into(),
            ..ExpenseForm::default()
        };
        let err = form.into_new_expense(Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Please fill in all required fields");
    }

    #[test]
    fn expense_form_defaults_currency() {
        let form = ExpenseForm {
            amount: " 12.5 ".into(),
            category_id: "c".into(),
            description: " Lunch ".into(),
            ..ExpenseForm::default()
        };
        let new = form.into_new_expense(Utc::now()).unwrap();
        assert_eq!(new.amount, Decimal::new(125, 1));
        assert_eq!(new.currency, "USD");
        assert_eq!(new.description, "Lunch");
    }
}
