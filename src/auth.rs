use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Role, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleClaim {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: RoleClaim,
    pub exp: i64, // expiration time
}

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(jwt_secret: impl Into<String>, token_ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl,
            bcrypt_cost,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
    }

    pub fn create_token(&self, user: &User, role: &Role) -> Result<String, AppError> {
        let expiration = Utc::now()
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| AppError::Internal("Token expiry overflowed".to_string()))?
            .timestamp();

        let claims = Claims {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            role: RoleClaim {
                id: role.id,
                name: role.name.clone(),
            },
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| AppError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

// Middleware for JWT authentication
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

/// Layer state for [`authorize`]: who may pass.
#[derive(Clone)]
pub struct Authorize {
    auth_service: AuthService,
    role: Option<&'static str>,
}

impl Authorize {
    /// Any holder of a valid token.
    pub fn authenticated(auth_service: AuthService) -> Self {
        Self {
            auth_service,
            role: None,
        }
    }

    /// Only tokens issued to `role`.
    pub fn role(auth_service: AuthService, role: &'static str) -> Self {
        Self {
            auth_service,
            role: Some(role),
        }
    }
}

pub async fn authorize(
    State(guard): State<Authorize>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("Missing bearer token"))?;

    let claims = guard.auth_service.decode_token(token)?;

    if let Some(required) = guard.role {
        if claims.role.name != required {
            tracing::debug!(user = claims.id, role = %claims.role.name, required, "role check failed");
            return Err(AppError::InsufficientAccess {
                role: claims.role.name,
            });
        }
    }

    // Add user info to request extensions
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Claims of the caller, available behind [`authorize`].
pub struct CurrentUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Missing bearer token"))?;

        Ok(CurrentUser(claims))
    }
}
