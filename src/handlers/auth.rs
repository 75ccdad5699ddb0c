use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::{LoginRequest, NewUser, RegisterRequest, TokenResponse, ROLE_CUSTOMER};
use crate::repositories::RepositoryError;
use crate::utils::validate_email;

pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let email = request.email.trim().to_lowercase();

    if !validate_email(&email) {
        return Err(invalid("Invalid email format"));
    }

    if state.users.find_one_by_email(&email).await?.is_some() {
        return Err(AppError::EmailAlreadyTaken { email });
    }

    if request.name.trim().is_empty() {
        return Err(invalid("Name is required"));
    }
    if request.password.is_empty() {
        return Err(invalid("Password is required"));
    }

    let role = state
        .roles
        .find_one_by_name(ROLE_CUSTOMER)
        .await?
        .ok_or_else(|| AppError::record_not_found("Role"))?;

    let encrypted_password = state.auth_service.hash_password(&request.password)?;
    let user = state
        .users
        .create(NewUser {
            name: request.name.trim().to_string(),
            email: email.clone(),
            encrypted_password,
            role_id: role.id,
        })
        .await
        .map_err(|err| match err {
            // Lost a race with a concurrent registration
            RepositoryError::Conflict(_) => AppError::EmailAlreadyTaken { email },
            other => AppError::Repository(other),
        })?;
    tracing::info!(user_id = user.id, "user registered");

    let access_token = state.auth_service.create_token(&user, &role)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { access_token })))
}

pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = request.email.trim().to_lowercase();

    let user = state
        .users
        .find_one_by_email(&email)
        .await?
        .ok_or(AppError::EmailNotRegistered { email })?;

    if !state
        .auth_service
        .verify_password(&request.password, &user.encrypted_password)?
    {
        return Err(AppError::WrongPassword);
    }

    let role = state
        .roles
        .find_by_pk(user.role_id)
        .await?
        .ok_or_else(|| AppError::record_not_found("Role"))?;

    let access_token = state.auth_service.create_token(&user, &role)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { access_token })))
}

pub async fn handle_get_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let user = state
        .users
        .find_by_pk(claims.id)
        .await?
        .ok_or_else(|| AppError::record_not_found("User"))?;

    // A user whose role row is gone is treated as missing
    state
        .roles
        .find_by_pk(user.role_id)
        .await?
        .ok_or_else(|| AppError::record_not_found("Role"))?;

    Ok(Json(user))
}

fn invalid(message: &str) -> AppError {
    AppError::Rejected(RepositoryError::Validation(message.to_string()))
}
