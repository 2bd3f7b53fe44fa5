use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use geopost_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// Login with an unknown username or the wrong password.
    #[error("Wrong username or password")]
    Unauthorized,

    /// Missing, malformed, forged or expired bearer token.
    #[error("Invalid or missing token")]
    Unauthenticated,

    #[error("User already exists")]
    Conflict,

    /// A downstream store failed. `context` is what the client sees; the
    /// store error itself only reaches the log.
    #[error("{context}")]
    Upstream {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Wrap a store error with the message shown to the client.
    pub fn upstream(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Upstream { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            // Duplicate usernames surface as 400, matching the signup contract.
            Self::BadRequest(_) | Self::Conflict => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Upstream { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Upstream { context, source } = &self {
            tracing::error!("{}: {}", context, source);
        }
        (self.status_code(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);

        let err = ApiError::upstream("Failed to save post")(StoreError::NotFound("x".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_message_hides_store_detail() {
        let err = ApiError::upstream("Failed to read from search index")(StoreError::Status {
            service: "elasticsearch",
            status: 503,
            body: "secret cluster detail".into(),
        });
        assert_eq!(err.to_string(), "Failed to read from search index");
    }
}
