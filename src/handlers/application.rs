use std::any::Any;

use axum::{
    extract::{OriginalUri, State},
    http::Method,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;
use crate::error::AppError;

pub async fn handle_get_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "message": format!("{} API is up and running!", state.service_name),
    }))
}

pub async fn handle_not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::not_found(method.as_str(), uri.to_string())
}

/// Turns a handler panic into the regular 500 error body.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "Unknown panic".to_string()
    };

    AppError::Internal(message).into_response()
}
