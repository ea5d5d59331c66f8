//! Error responses.
//!
//! Handlers fail with an [`ApiError`], which renders as an [`ErrorBody`]. Domain
//! refusals keep their message key and pick a status from their kind; anything
//! else is logged and reported as `error.general`.

use aide::OperationOutput;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use finance_api::{
    models::{Failure, FailureKind},
    ports::AsFailure,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

/// The body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    /// Message keys describing what went wrong
    pub messages: Vec<String>,
    /// The response status code
    pub status: u16,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    key: String,
}

impl ApiError {
    fn new(status: StatusCode, key: impl Into<String>) -> Self {
        Self {
            status,
            key: key.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "error.unauthorized")
    }

    pub fn general() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "error.general")
    }

    /// The rate source could not be read
    pub fn upstream() -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "error.exchangeRate.retrievalFailed")
    }

    /// Translate a repository error, logging it if it is not a domain refusal
    pub fn repository<E>(err: E) -> Self
    where
        E: std::error::Error + AsFailure,
    {
        match err.as_failure() {
            Some(failure) => failure.clone().into(),
            None => {
                event!(Level::ERROR, err = err.to_string());
                Self::general()
            }
        }
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        let status = match failure.kind() {
            FailureKind::NotFound => StatusCode::NOT_FOUND,
            FailureKind::Invalid => StatusCode::BAD_REQUEST,
            FailureKind::Conflict => StatusCode::CONFLICT,
            FailureKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            FailureKind::Upstream => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, failure.key())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            messages: vec![self.key],
            status: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl OperationOutput for ApiError {
    type Inner = ErrorBody;
}
