use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Failure raised by a persistence backend.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "duplicate key: {}", _0)]
    Duplicate(String),
    #[display(fmt = "corrupt row: {}", _0)]
    Corrupt(String),
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        // 23000: integrity constraint violation (duplicate unique key)
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::Duplicate(db_err.message().to_string());
            }
        }
        StoreError::Database(e)
    }
}

/// Business-rule and infrastructure failures reported by the service layer.
///
/// Every variant except `Internal` is a recoverable rejection whose message is
/// safe to show to the caller. `Internal` carries detail for the log only.
#[derive(Debug, Display)]
pub enum ServiceError {
    #[display(fmt = "Not authorized")]
    NotAuthorized,
    #[display(fmt = "{}", _0)]
    InvalidState(String),
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),
    #[display(fmt = "No changes provided")]
    NoOp,
    #[display(fmt = "Current password is incorrect")]
    InvalidCredentials,
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "Internal Server Error")]
    Internal(String),
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        ServiceError::Internal(detail.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => ServiceError::Conflict("Record already exists".into()),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotAuthorized => StatusCode::FORBIDDEN,
            ServiceError::InvalidState(_) => StatusCode::CONFLICT,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::NoOp => StatusCode::BAD_REQUEST,
            ServiceError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ServiceError::Internal(detail) = self {
            tracing::error!(error = %detail, "Request failed");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}
