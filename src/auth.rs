use crate::backend::Backend;
use crate::errors::ClientError;
use crate::models::{Credentials, RegisterRequest, SessionResponse, TokenResponse, User};
use crate::storage::{ACCESS_TOKEN, LocalStore, SESSION_KEYS, TOKEN_EXPIRY, USER};
use chrono::Utc;
use tracing::{info, warn};

/// Session handling on top of the backend. The token, its expiry (epoch
/// milliseconds) and the user are kept in the local store.
#[derive(Clone)]
pub struct AuthService {
    backend: Backend,
    store: LocalStore,
}

impl AuthService {
    pub fn new(backend: Backend, store: LocalStore) -> Self {
        Self { backend, store }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<SessionResponse, ClientError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(ClientError::validation("Please fill in all fields"));
        }
        let token = self.backend.register(&request).await?;
        info!("registered {}", request.email);
        self.start_session(token).await
    }

    pub async fn login(&self, credentials: Credentials) -> Result<SessionResponse, ClientError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(ClientError::validation("Please fill in all fields"));
        }
        let token = self.backend.login(&credentials).await?;
        info!("logged in {}", credentials.email);
        self.start_session(token).await
    }

    async fn start_session(&self, token: TokenResponse) -> Result<SessionResponse, ClientError> {
        let expiry = Utc::now().timestamp_millis().saturating_add(token.expires_in);
        self.store.set(ACCESS_TOKEN, token.access_token.clone()).await?;
        self.store.set(TOKEN_EXPIRY, expiry.to_string()).await?;

        let user = match self.backend.current_user().await {
            Ok(user) => user,
            Err(err) => {
                self.logout().await?;
                return Err(err);
            }
        };
        self.store.set_json(USER, &user).await?;

        Ok(SessionResponse {
            user,
            access_token: token.access_token,
        })
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.store.remove(&SESSION_KEYS).await
    }

    pub async fn current_user(&self) -> Option<User> {
        self.store.get_json(USER).await
    }

    /// False when the token is missing or past its expiry; the stale session
    /// is cleared in that case.
    pub async fn is_authenticated(&self) -> bool {
        let token = self.store.get(ACCESS_TOKEN).await;
        let expiry = self
            .store
            .get(TOKEN_EXPIRY)
            .await
            .and_then(|raw| raw.trim().parse::<i64>().ok());

        match (token, expiry) {
            (Some(_), Some(expiry)) if Utc::now().timestamp_millis() < expiry => true,
            (None, None) => false,
            _ => {
                warn!("session missing or expired, logging out");
                if let Err(err) = self.logout().await {
                    warn!("failed to clear session: {err}");
                }
                false
            }
        }
    }
}
