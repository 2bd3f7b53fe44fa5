//! Store error types and result alias.
//!
//! Every backend maps its failures onto [`StoreError`]. Callers above the store
//! layer treat any variant as an upstream failure; the detail is for logs.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response (connect, TLS, body read).
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A response or stored record did not have the expected shape.
    #[error("Malformed {what}: {detail}")]
    Decode { what: &'static str, detail: String },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub(crate) fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { service, source }
    }

    pub(crate) fn decode(what: &'static str, detail: impl ToString) -> Self {
        Self::Decode {
            what,
            detail: detail.to_string(),
        }
    }
}

/// Turn a non-2xx response into [`StoreError::Status`], keeping the body text.
pub(crate) async fn check_status(
    service: &'static str,
    resp: reqwest::Response,
) -> StoreResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}
