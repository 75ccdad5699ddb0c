//! Application state and router assembly.

use std::sync::Arc;

use axum::{
    handler::Handler,
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{authorize, AuthService, Authorize};
use crate::config::AppConfig;
use crate::handlers::{application, auth, cars};
use crate::models::{ROLE_ADMIN, ROLE_CUSTOMER};
use crate::repositories::{
    CarRepository, PgCarRepository, PgRentalRepository, PgRoleRepository, PgUserRepository,
    RentalRepository, RoleRepository, UserRepository,
};
use crate::utils::PaginationDefaults;

#[derive(Clone)]
pub struct AppState {
    pub cars: Arc<dyn CarRepository>,
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub rentals: Arc<dyn RentalRepository>,
    pub auth_service: AuthService,
    pub pagination: PaginationDefaults,
    pub service_name: String,
}

impl AppState {
    /// State backed by PostgreSQL repositories sharing `pool`.
    pub fn from_pool(pool: PgPool, config: &AppConfig) -> Self {
        Self {
            cars: Arc::new(PgCarRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            roles: Arc::new(PgRoleRepository::new(pool.clone())),
            rentals: Arc::new(PgRentalRepository::new(pool)),
            auth_service: AuthService::new(
                config.jwt_secret.clone(),
                chrono::Duration::hours(config.token_ttl_hours),
                config.bcrypt_cost,
            ),
            pagination: config.pagination,
            service_name: config.service_name.clone(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let authenticated = middleware::from_fn_with_state(
        Authorize::authenticated(state.auth_service.clone()),
        authorize,
    );
    let admin_only = middleware::from_fn_with_state(
        Authorize::role(state.auth_service.clone(), ROLE_ADMIN),
        authorize,
    );
    let customer_only = middleware::from_fn_with_state(
        Authorize::role(state.auth_service.clone(), ROLE_CUSTOMER),
        authorize,
    );

    Router::new()
        // Health check
        .route("/", or_not_found(get(application::handle_get_root)))
        // Auth routes
        .route("/v1/auth/register", or_not_found(post(auth::handle_register)))
        .route("/v1/auth/login", or_not_found(post(auth::handle_login)))
        .route(
            "/v1/auth/user",
            or_not_found(get(auth::handle_get_user.layer(authenticated))),
        )
        // Car routes
        .route(
            "/v1/cars",
            or_not_found(
                get(cars::handle_list_cars)
                    .post(cars::handle_create_car.layer(admin_only.clone())),
            ),
        )
        .route(
            "/v1/cars/:id",
            or_not_found(
                get(cars::handle_get_car)
                    .put(cars::handle_update_car.layer(admin_only.clone()))
                    .delete(cars::handle_delete_car.layer(admin_only)),
            ),
        )
        .route(
            "/v1/cars/:id/rent",
            or_not_found(post(cars::handle_rent_car.layer(customer_only))),
        )
        .fallback(application::handle_not_found)
        .layer(CatchPanicLayer::custom(application::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Unsupported methods on a known path get the same 404 body as unknown paths.
fn or_not_found(method_router: MethodRouter<AppState>) -> MethodRouter<AppState> {
    method_router.fallback(application::handle_not_found)
}
