//! # Error Handling for Collection APIs
//!
//! Two layers of errors live in this crate:
//!
//! - Library errors ([`CastError`](crate::filtering::CastError),
//!   [`StoreError`](crate::store::StoreError)) are plain `thiserror` enums.
//!   Cast errors never leave the filter pipeline: an uncastable filter key is
//!   dropped and logged at `debug`.
//! - [`ApiError`] is what handlers, authorizers and input transformers
//!   return. It maps to an HTTP status code, sends a JSON body of the form
//!   `{"error": "...", "details": [...]}` and logs store internals through
//!   `tracing`.
//!
//! ## Logging
//!
//! The crate never installs a subscriber. To see internal errors, set one up
//! in your application:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt()
//!     .with_target(false)
//!     .compact()
//!     .init();
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Rejected input, e.g. from an
    /// [`InputTransformer`](crate::payload::InputTransformer).
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Vec<String>,
    },

    #[error("{0}")]
    Unauthorized(String),

    /// The caller lacks the permission an ACL gate asked for.
    #[error("{0}")]
    Forbidden(String),

    /// A store failure, reported under the status the operation uses for it.
    #[error("{message}")]
    Store {
        status: StatusCode,
        message: String,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// ```rust,ignore
    /// return Err(ApiError::bad_request("Body must be a JSON object"));
    /// ```
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::bad_request_with_details(message, Vec::new())
    }

    pub fn bad_request_with_details(message: impl Into<String>, details: Vec<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// ```rust,ignore
    /// return Err(ApiError::forbidden("Missing permission posts.delete"));
    /// ```
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Wraps a store failure. The store's user-facing messages travel as
    /// `details`; database internals are only logged.
    pub fn from_store(status: StatusCode, message: impl Into<String>, err: StoreError) -> Self {
        Self::Store {
            status,
            message: message.into(),
            source: err,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Store { status, .. } => *status,
        }
    }

    fn details(&self) -> Option<Vec<String>> {
        let details = match self {
            Self::BadRequest { details, .. } => details.clone(),
            Self::Store { source, .. } => source.user_details(),
            Self::Unauthorized(_) | Self::Forbidden(_) => Vec::new(),
        };
        (!details.is_empty()).then_some(details)
    }

    fn log(&self) {
        match self {
            Self::Store { status, source, .. } => match source.internal_details() {
                Some(internal) => {
                    tracing::error!(status = %status, details = %internal, "Store error occurred");
                }
                None => {
                    tracing::debug!(status = %status, error = %source, "Store rejected request");
                }
            },
            _ => tracing::debug!(error = %self, status = %self.status_code(), "API error"),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let body = ErrorResponse {
            error: self.to_string(),
            details: self.details(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Default mapping for store failures outside the collection handlers:
/// missing documents are 404, rejected input 400, anything else 500.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let (status, message) = match &err {
            StoreError::NotFound => (StatusCode::NOT_FOUND, "Element does not exist"),
            StoreError::InvalidId(_) | StoreError::Validation(_) | StoreError::Duplicate(_) => {
                (StatusCode::BAD_REQUEST, "Bad request")
            }
            StoreError::Database(_) | StoreError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "A storage error occurred")
            }
        };
        Self::from_store(status, message, err)
    }
}
