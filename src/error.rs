use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::Car;
use crate::repositories::RepositoryError;

/// Every failure a request can end with.
///
/// Each variant carries only the context it needs and resolves to exactly one
/// status through [`AppError::status_code`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found!")]
    NotFound { method: String, url: String },

    #[error("{model} not found!")]
    RecordNotFound { model: String },

    #[error("{email} is not registered!")]
    EmailNotRegistered { email: String },

    #[error("{email} already taken")]
    EmailAlreadyTaken { email: String },

    #[error("{} is already rented!!", .car.name)]
    CarAlreadyRented { car: Box<Car> },

    #[error("{field} must be a positive integer")]
    InvalidArgument { field: &'static str, value: i64 },

    /// A collaborator refused a write on behalf of the client.
    #[error("{0}")]
    Rejected(RepositoryError),

    #[error("Password is not correct!")]
    WrongPassword,

    #[error("Access forbidden!")]
    InsufficientAccess { role: String },

    #[error("{reason}")]
    Unauthorized { reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn record_not_found(model: impl Into<String>) -> Self {
        AppError::RecordNotFound {
            model: model.into(),
        }
    }

    pub fn not_found(method: impl Into<String>, url: impl Into<String>) -> Self {
        AppError::NotFound {
            method: method.into(),
            url: url.into(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        AppError::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn car_already_rented(car: Car) -> Self {
        AppError::CarAlreadyRented { car: Box::new(car) }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. }
            | AppError::RecordNotFound { .. }
            | AppError::EmailNotRegistered { .. } => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyTaken { .. }
            | AppError::CarAlreadyRented { .. }
            | AppError::InvalidArgument { .. }
            | AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::WrongPassword
            | AppError::InsufficientAccess { .. }
            | AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Repository(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NotFoundError",
            AppError::RecordNotFound { .. } => "RecordNotFoundError",
            AppError::EmailNotRegistered { .. } => "EmailNotRegisteredError",
            AppError::EmailAlreadyTaken { .. } => "EmailAlreadyTakenError",
            AppError::CarAlreadyRented { .. } => "CarAlreadyRentedError",
            AppError::InvalidArgument { .. } => "InvalidArgumentError",
            AppError::WrongPassword => "WrongPasswordError",
            AppError::InsufficientAccess { .. } => "InsufficientAccessError",
            AppError::Unauthorized { .. } => "UnauthorizedError",
            AppError::Rejected(err) | AppError::Repository(err) => err.name(),
            AppError::Internal(_) => "Error",
        }
    }

    /// Structured context for the client, `null` when the kind has none.
    pub fn details(&self) -> Value {
        match self {
            AppError::NotFound { method, url } => json!({ "method": method, "url": url }),
            AppError::RecordNotFound { model } => json!({ "model": model }),
            AppError::EmailNotRegistered { email } | AppError::EmailAlreadyTaken { email } => {
                json!({ "email": email })
            }
            AppError::CarAlreadyRented { car } => json!({ "car": car }),
            AppError::InvalidArgument { field, value } => json!({ "field": field, "value": value }),
            AppError::InsufficientAccess { role } => json!({
                "role": role,
                "reason": format!("{role} is not allowed to perform this operation."),
            }),
            _ => Value::Null,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorPayload {
                name: self.name().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub name: String,
    pub message: String,
    pub details: Value,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(name = self.name(), "request failed: {}", self);
        } else {
            tracing::debug!(name = self.name(), status = status.as_u16(), "{}", self);
        }

        (status, Json(self.to_body())).into_response()
    }
}
