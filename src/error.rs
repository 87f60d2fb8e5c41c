//! Error taxonomy and the single error-to-response conversion point.
//!
//! Every handler returns `Result<ProxyResponse>`; failures are converted to
//! the uniform JSON envelope `{"reason": "<message>"}` exactly once, in the
//! `IntoResponse` impl below. Upstream failures keep the offending URL in
//! structured form so callers can distinguish failure kinds without parsing
//! message text.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    /// No route matched the request
    #[error("Resource not found")]
    NotFound,

    /// Fetching a manifest from the origin failed
    #[error("{source}: {url}")]
    UpstreamFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The origin returned something that does not parse as the expected
    /// playlist kind
    #[error("Failed to parse manifest ({message}): {url}")]
    PlaylistParse { url: String, message: String },

    /// User-supplied manifest URL is malformed or points at a blocked host
    #[error("Invalid origin URL: {0}")]
    InvalidOrigin(String),

    /// A query parameter the operation depends on is absent
    #[error("Missing required query parameter '{0}'")]
    MissingParameter(&'static str),

    /// Compression or serialization I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariant violation that should not happen in normal operation
    #[error("{0}")]
    Internal(String),
}

impl RelayError {
    /// HTTP status for the error envelope
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::InvalidOrigin(_) | RelayError::MissingParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::UpstreamFetch { .. }
            | RelayError::PlaylistParse { .. }
            | RelayError::Io(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let reason = self.to_string();

        error!("Request failed ({}): {}", status.as_u16(), reason);

        let body = serde_json::json!({ "reason": reason }).to_string();

        (
            status,
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Origin"),
            ],
            body,
        )
            .into_response()
    }
}
