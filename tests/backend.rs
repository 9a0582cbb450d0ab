use chrono::{TimeZone, Utc};
use expense_tracker::api::ApiClient;
use expense_tracker::auth::AuthService;
use expense_tracker::backend::Backend;
use expense_tracker::errors::ClientError;
use expense_tracker::mock::MockBackend;
use expense_tracker::mock_api;
use expense_tracker::models::{Credentials, NewCategory, NewExpense};
use expense_tracker::storage::{ACCESS_TOKEN, LocalStore, SESSION_KEYS, TOKEN_EXPIRY, USER};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::net::TcpListener;

struct Harness {
    backend: Backend,
    auth: AuthService,
    store: LocalStore,
}

/// Serves the seeded mock REST API on an ephemeral port and points an HTTP
/// backend at it.
async fn harness() -> Harness {
    harness_with(LocalStore::in_memory()).await
}

async fn harness_with(store: LocalStore) -> Harness {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = mock_api::router(MockBackend::seeded(Duration::ZERO));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = ApiClient::new(format!("http://{addr}/"), Duration::from_secs(5), store.clone()).unwrap();
    assert_eq!(client.base_url(), format!("http://{addr}"));
    let backend = Backend::Http(client);
    Harness {
        auth: AuthService::new(backend.clone(), store.clone()),
        backend,
        store,
    }
}

async fn logged_in() -> Harness {
    log_in(harness().await).await
}

async fn log_in(harness: Harness) -> Harness {
    harness
        .auth
        .login(Credentials {
            email: "remote@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    harness
}

#[tokio::test]
async fn login_over_http_stores_session() {
    let harness = logged_in().await;

    assert!(harness.auth.is_authenticated().await);
    let token = harness.store.get(ACCESS_TOKEN).await.unwrap();
    assert!(token.starts_with("mock-jwt-token-"));
    assert!(harness.store.get(TOKEN_EXPIRY).await.is_some());
    assert!(harness.store.get(USER).await.is_some());
    assert_eq!(harness.auth.current_user().await.unwrap().full_name, "Mock User");
}

#[tokio::test]
async fn connection_check_reaches_mock_api() {
    let harness = harness().await;
    let status = harness.backend.check_connection().await;
    assert!(status.reachable);
    assert_eq!(status.status, Some(200));
}

#[tokio::test]
async fn categories_and_expenses_round_trip_over_http() {
    let harness = logged_in().await;
    let backend = &harness.backend;

    assert_eq!(backend.list_categories().await.unwrap().len(), 2);
    assert_eq!(backend.list_expenses().await.unwrap().len(), 2);

    let category = backend
        .create_category(NewCategory {
            name: "  Utilities ".into(),
            color: "#00aa00".into(),
            description: Some(String::new()),
            icon: None,
        })
        .await
        .unwrap();
    assert_eq!(category.name, "Utilities");

    let expense = backend
        .create_expense(NewExpense {
            amount: Decimal::new(8999, 2),
            currency: "USD".into(),
            category_id: category.id.clone(),
            description: "Electricity".into(),
            date: Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(expense.amount, Decimal::new(8999, 2));
    assert_eq!(backend.get_expense(&expense.id).await.unwrap().description, "Electricity");

    let updated = backend
        .update_expense(
            &expense.id,
            NewExpense {
                amount: Decimal::new(9500, 2),
                currency: "USD".into(),
                category_id: category.id.clone(),
                description: "Electricity (Feb)".into(),
                date: expense.date,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "Electricity (Feb)");
    assert_eq!(updated.amount, Decimal::new(9500, 2));

    backend.delete_expense(&expense.id).await.unwrap();
    let err = backend.get_expense(&expense.id).await.unwrap_err();
    match err {
        ClientError::NotFound(message) => assert_eq!(message, "Expense not found"),
        other => panic!("expected not found, got {other:?}"),
    }

    backend.delete_category(&category.id).await.unwrap();
    assert_eq!(backend.list_categories().await.unwrap().len(), 2);
}

#[tokio::test]
async fn rejected_token_clears_session() {
    let harness = logged_in().await;
    harness.store.set(ACCESS_TOKEN, "not-a-real-token").await.unwrap();

    let err = harness.backend.list_expenses().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    for key in SESSION_KEYS {
        assert!(harness.store.get(key).await.is_none(), "{key} should be cleared");
    }
    assert!(!harness.auth.is_authenticated().await);
}

#[tokio::test]
async fn rejected_token_is_unauthorized_even_if_store_cannot_be_written() {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("expense_backend_{}_{nanos}.json", std::process::id()));
    let store = LocalStore::open(path.clone()).await;
    let harness = log_in(harness_with(store).await).await;
    harness.store.set(ACCESS_TOKEN, "not-a-real-token").await.unwrap();

    // A directory where the store file should be makes every write fail.
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let err = harness.backend.list_expenses().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized), "got {err:?}");

    let _ = std::fs::remove_dir(&path);
}

#[tokio::test]
async fn missing_category_surfaces_backend_message() {
    let harness = logged_in().await;
    let err = harness
        .backend
        .update_category(
            "missing-category",
            NewCategory {
                name: "Anything".into(),
                color: "#000000".into(),
                description: None,
                icon: None,
            },
        )
        .await
        .unwrap_err();
    match err {
        ClientError::NotFound(message) => assert_eq!(message, "Category not found"),
        other => panic!("expected not found, got {other:?}"),
    }
}
