//! Thin HTTP wrapper around the remote REST backend.

use crate::errors::ClientError;
use crate::storage::{ACCESS_TOKEN, LocalStore, SESSION_KEYS};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Reachability of the backend as seen from this client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub reachable: bool,
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: LocalStore,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: LocalStore,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T, ClientError> {
        let response = self.send(self.http.get(self.url(path)), fallback).await?;
        Ok(response.json().await?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        let response = self.send(request, fallback).await?;
        Ok(response.json().await?)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.put(self.url(path)).json(body);
        let response = self.send(request, fallback).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, path: &str, fallback: &str) -> Result<(), ClientError> {
        self.send(self.http.delete(self.url(path)), fallback).await?;
        Ok(())
    }

    /// Unauthenticated reachability check of `<base>/v1`.
    pub async fn check_connection(&self) -> ConnectionStatus {
        match self.http.get(self.url("/v1")).send().await {
            Ok(response) if response.status().is_success() => ConnectionStatus {
                reachable: true,
                status: Some(response.status().as_u16()),
                message: "Backend is accessible".to_string(),
            },
            Ok(response) => ConnectionStatus {
                reachable: true,
                status: Some(response.status().as_u16()),
                message: format!("Backend responded with status: {}", response.status()),
            },
            Err(err) if err.is_timeout() => ConnectionStatus {
                reachable: false,
                status: None,
                message: "Connection timeout".to_string(),
            },
            Err(err) => ConnectionStatus {
                reachable: false,
                status: None,
                message: format!("Cannot reach backend server: {err}"),
            },
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, fallback: &str) -> Result<Response, ClientError> {
        let request = match self.store.get(ACCESS_TOKEN).await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|err| {
            error!("{fallback}: {err}");
            ClientError::from(err)
        })?;
        let status = response.status();
        debug!("{} {}", status, response.url().path());
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!("backend answered 401, clearing session");
            if let Err(err) = self.store.remove(&SESSION_KEYS).await {
                error!("failed to clear session after 401: {err}");
            }
            return Err(ClientError::Unauthorized);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        error!("{fallback}: {status} {message}");

        Err(match status {
            StatusCode::BAD_REQUEST => ClientError::Validation(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }
}
