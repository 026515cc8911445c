use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Everything that can go wrong between an inbound request and Lawmatics.
///
/// The HTTP layer maps these straight to responses; nothing is retried
/// automatically beyond the natural "next request" or "next keep-alive tick".
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No token record exists yet; the authorization flow must be completed
    #[error("not authorized with Lawmatics yet, visit /auth to connect")]
    Unauthorized,

    /// A record exists but cannot refresh itself
    #[error("stored token has no refresh token, re-authorization required")]
    MissingRefreshToken,

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("authorization code exchange failed: {0}")]
    CodeExchangeFailed(String),

    /// Bad inbound lead payload; reported before any network call
    #[error("{0}")]
    Validation(String),

    #[error("lead submission failed: {0}")]
    SubmissionFailed(String),

    /// Durable token write failed. Reads are downgraded to "no record"
    /// instead, so this only ever covers writes.
    #[error("token store error: {0}")]
    Store(String),
}

impl RelayError {
    /// Stable machine-readable name for the JSON `error` field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::MissingRefreshToken => "missing_refresh_token",
            Self::RefreshFailed(_) => "refresh_failed",
            Self::CodeExchangeFailed(_) => "code_exchange_failed",
            Self::Validation(_) => "validation_error",
            Self::SubmissionFailed(_) => "submission_failed",
            Self::Store(_) => "token_store_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, kind = self.kind(), "Request failed");

        let body = Json(json!({
            "error": self.kind(),
            "details": self.to_string(),
        }));

        (self.status_code(), body).into_response()
    }
}
