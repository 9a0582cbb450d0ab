//! The mock backend served over HTTP with the same paths as the real REST
//! API, so the HTTP client can be run against it.

use crate::errors::ClientError;
use crate::mock::MockBackend;
use crate::models::{
    Category, Credentials, Expense, NewCategory, NewExpense, RegisterRequest, TokenResponse, User,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::warn;

pub fn router(mock: MockBackend) -> Router {
    Router::new()
        .route("/v1", get(status))
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/users/me", get(current_user))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .with_state(mock)
}

#[derive(Debug)]
struct MockApiError {
    status: StatusCode,
    message: String,
}

impl From<ClientError> for MockApiError {
    fn from(err: ClientError) -> Self {
        let status = match &err {
            ClientError::Validation(_) => StatusCode::BAD_REQUEST,
            ClientError::NotFound(_) => StatusCode::NOT_FOUND,
            ClientError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for MockApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

async fn authorize(mock: &MockBackend, headers: &HeaderMap) -> Result<(), MockApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match token {
        Some(token) if mock.token_is_valid(token).await => Ok(()),
        _ => {
            warn!("mock backend: rejected request without a valid token");
            Err(ClientError::Unauthorized.into())
        }
    }
}

async fn status() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn register(
    State(mock): State<MockBackend>,
    Json(request): Json<RegisterRequest>,
) -> Json<TokenResponse> {
    Json(mock.register(&request).await)
}

async fn login(
    State(mock): State<MockBackend>,
    Json(credentials): Json<Credentials>,
) -> Json<TokenResponse> {
    Json(mock.login(&credentials).await)
}

async fn current_user(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
) -> Result<Json<User>, MockApiError> {
    authorize(&mock, &headers).await?;
    Ok(Json(mock.current_user().await?))
}

async fn list_categories(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
) -> Result<Json<Vec<Category>>, MockApiError> {
    authorize(&mock, &headers).await?;
    Ok(Json(mock.list_categories().await))
}

async fn create_category(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Json(new): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), MockApiError> {
    authorize(&mock, &headers).await?;
    let category = mock.create_category(new.normalized()?).await;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(new): Json<NewCategory>,
) -> Result<Json<Category>, MockApiError> {
    authorize(&mock, &headers).await?;
    Ok(Json(mock.update_category(&id, new.normalized()?).await?))
}

async fn delete_category(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, MockApiError> {
    authorize(&mock, &headers).await?;
    mock.delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_expenses(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
) -> Result<Json<Vec<Expense>>, MockApiError> {
    authorize(&mock, &headers).await?;
    Ok(Json(mock.list_expenses().await))
}

async fn get_expense(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Expense>, MockApiError> {
    authorize(&mock, &headers).await?;
    Ok(Json(mock.get_expense(&id).await?))
}

async fn create_expense(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Json(new): Json<NewExpense>,
) -> Result<(StatusCode, Json<Expense>), MockApiError> {
    authorize(&mock, &headers).await?;
    new.validate()?;
    Ok((StatusCode::CREATED, Json(mock.create_expense(new).await)))
}

async fn update_expense(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(new): Json<NewExpense>,
) -> Result<Json<Expense>, MockApiError> {
    authorize(&mock, &headers).await?;
    new.validate()?;
    Ok(Json(mock.update_expense(&id, new).await?))
}

async fn delete_expense(
    State(mock): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, MockApiError> {
    authorize(&mock, &headers).await?;
    mock.delete_expense(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
