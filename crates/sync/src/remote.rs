//! HTTP accessor for the hosted API.
//!
//! One [`RemoteStore`] per client, built from [`SyncConfig`]. Every call is
//! bounded by the configured request timeout so callers can fail over to the
//! local cache instead of hanging on a dead network.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use repatlas_core::types::DbId;

use crate::config::SyncConfig;

/// Errors surfaced by remote calls.
///
/// Only [`RemoteError::Transport`] and server-side 5xx responses count as
/// unavailability; domain errors (validation, conflict, not-found) are
/// returned to the caller untouched and never trigger the fallback chain.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote store unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Remote store returned status {0}")]
    Status(u16),
}

impl RemoteError {
    /// Whether the failure means the remote store is unavailable (as opposed
    /// to having rejected the request).
    pub fn is_unavailable(&self) -> bool {
        match self {
            RemoteError::Transport(_) => true,
            RemoteError::Status(code) => *code >= 500,
            _ => false,
        }
    }
}

/// Standard response envelope used by the API.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Thin typed client over the REST API.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    admin_email: Option<String>,
}

impl RemoteStore {
    pub fn new(config: &SyncConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            base_url: config.base_url.clone(),
            admin_email: None,
        }
    }

    /// Return a copy of this store that authenticates as the given admin.
    /// Required for mutating calls and admin-only reads.
    pub fn with_admin(mut self, email: impl Into<String>) -> Self {
        self.admin_email = Some(email.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, format!("{}{path}", self.base_url));
        if let Some(email) = &self.admin_email {
            builder = builder.header("x-admin-email", email);
        }
        builder
    }

    /// GET a whole collection.
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, RemoteError> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        decode(response).await
    }

    /// GET a single row. A 404 is a valid outcome, not an error.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        id: DbId,
    ) -> Result<Option<T>, RemoteError> {
        let response = self
            .request(reqwest::Method::GET, &format!("{path}/{id}"))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    /// POST a new row.
    pub async fn create<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    /// PUT a full-row replacement.
    pub async fn update<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        id: DbId,
        body: &B,
    ) -> Result<T, RemoteError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("{path}/{id}"))
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    /// DELETE a row, returning the removed entity.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str, id: DbId) -> Result<T, RemoteError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("{path}/{id}"))
            .send()
            .await?;
        decode(response).await
    }

    /// POST to a collection-level action endpoint (e.g. `/reset`).
    pub async fn post_action<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let response = self.request(reqwest::Method::POST, path).send().await?;
        decode(response).await
    }
}

/// Unwrap the `{"data": ...}` envelope or map the error status.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status, response).await);
    }
    let envelope: Envelope<T> = response.json().await?;
    Ok(envelope.data)
}

async fn status_error(status: reqwest::StatusCode, response: reqwest::Response) -> RemoteError {
    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_default();
    match status {
        reqwest::StatusCode::NOT_FOUND => RemoteError::NotFound,
        reqwest::StatusCode::CONFLICT => RemoteError::Conflict(message),
        reqwest::StatusCode::BAD_REQUEST => RemoteError::Validation(message),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            RemoteError::Unauthorized
        }
        other => RemoteError::Status(other.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_count_as_unavailable() {
        assert!(RemoteError::Status(503).is_unavailable());
        assert!(!RemoteError::Status(418).is_unavailable());
        assert!(!RemoteError::NotFound.is_unavailable());
        assert!(!RemoteError::Validation("Name is required".into()).is_unavailable());
    }
}
