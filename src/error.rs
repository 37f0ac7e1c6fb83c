//! Error types for store operations and the HTTP boundary.
//!
//! `HospitalError` is what workflows and queries return. Handlers wrap it in an `ApiError`
//! naming the action that failed, which decides the status code and how much of the cause is
//! shown to the caller.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum HospitalError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("referential constraint failed: {0}")]
    Referential(String),
    #[error("store is busy")]
    Busy,
    #[error("database error: {0}")]
    Database(DieselError),
    #[error("failed to get a pooled connection: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type HospitalResult<T> = std::result::Result<T, HospitalError>;

impl From<DieselError> for HospitalError {
    fn from(err: DieselError) -> Self {
        match &err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                HospitalError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                HospitalError::Referential(info.message().to_string())
            }
            DieselError::DatabaseError(_, info) if is_busy_message(info.message()) => {
                HospitalError::Busy
            }
            _ => HospitalError::Database(err),
        }
    }
}

fn is_busy_message(message: &str) -> bool {
    message.contains("database is locked") || message.contains("database is busy")
}

/// A `HospitalError` tagged with the action the request attempted.
#[derive(Debug)]
pub struct ApiError {
    action: &'static str,
    source: HospitalError,
}

impl ApiError {
    pub fn new(action: &'static str, source: HospitalError) -> Self {
        Self { action, source }
    }

    pub fn source_error(&self) -> &HospitalError {
        &self.source
    }

    fn message(&self) -> String {
        match &self.source {
            HospitalError::InvalidInput(message) | HospitalError::Conflict(message) => {
                message.clone()
            }
            HospitalError::NotFound(what) => format!("{what} not found"),
            HospitalError::Busy => {
                format!("Timed out waiting to {}; please retry", self.action)
            }
            _ => format!("Failed to {}", self.action),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to {}: {}", self.action, self.source)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.source {
            HospitalError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            HospitalError::NotFound(_) => StatusCode::NOT_FOUND,
            HospitalError::Conflict(_) => StatusCode::CONFLICT,
            HospitalError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(action = self.action, error = %self.source, "request failed");
        } else {
            tracing::debug!(action = self.action, error = %self.source, "request rejected");
        }
        HttpResponse::build(status).json(json!({ "error": self.message() }))
    }
}

/// Attaches the attempted action to a store result.
pub trait ActionContext<T> {
    fn action(self, action: &'static str) -> Result<T, ApiError>;
}

impl<T> ActionContext<T> for HospitalResult<T> {
    fn action(self, action: &'static str) -> Result<T, ApiError> {
        self.map_err(|err| ApiError::new(action, err))
    }
}
