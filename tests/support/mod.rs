// tests/support/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt as _;

use bcr_api::auth::AuthService;
use bcr_api::models::{
    Car, CarAttributes, CarFilter, NewRental, NewUser, Rental, Role, User, ROLE_ADMIN,
    ROLE_CUSTOMER,
};
use bcr_api::repositories::{
    CarRepository, RentalRepository, RepositoryError, RepositoryResult, RoleRepository,
    UserRepository,
};
use bcr_api::{build_router, AppState, PaginationDefaults};

pub const ADMIN_ROLE_ID: i32 = 1;
pub const CUSTOMER_ROLE_ID: i32 = 2;

pub fn car(id: i32, name: &str, size: &str) -> Car {
    Car {
        id,
        name: name.to_string(),
        price: 1200000,
        size: size.to_string(),
        image: format!("{}.png", name.to_lowercase().replace(' ', "")),
        is_currently_rented: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn user(id: i32, name: &str, role_id: i32) -> User {
    User {
        id,
        name: name.to_string(),
        email: format!("{name}@gmail.com"),
        encrypted_password: String::new(),
        image: Some(format!("{name}-ava.png")),
        role_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn role(id: i32, name: &str) -> Role {
    Role {
        id,
        name: name.to_string(),
    }
}

/// In-memory cars; `failing` makes every call reject with a validation error.
///
/// `availableAt` filtering consults the rentals linked by [`TestApp`].
#[derive(Default)]
pub struct InMemoryCars {
    rows: Mutex<Vec<Car>>,
    fail_with: Option<String>,
    gone_before_destroy: bool,
    rentals: Option<Arc<InMemoryRentals>>,
    pub created: Mutex<Vec<CarAttributes>>,
}

impl InMemoryCars {
    pub fn with(rows: Vec<Car>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Rows that another request deletes between lookup and `destroy`.
    pub fn deleted_concurrently(rows: Vec<Car>) -> Self {
        Self {
            gone_before_destroy: true,
            ..Self::with(rows)
        }
    }

    fn linked_to(mut self, rentals: Arc<InMemoryRentals>) -> Self {
        self.rentals = Some(rentals);
        self
    }

    pub async fn snapshot(&self) -> Vec<Car> {
        self.rows.lock().await.clone()
    }

    fn check(&self) -> RepositoryResult<()> {
        match &self.fail_with {
            Some(message) => Err(RepositoryError::Validation(message.clone())),
            None => Ok(()),
        }
    }

    async fn filtered(&self, filter: &CarFilter) -> Vec<Car> {
        let booked: Vec<i32> = match (&self.rentals, filter.available_at) {
            (Some(rentals), Some(at)) => rentals
                .snapshot()
                .await
                .into_iter()
                .filter(|rental| rental.rent_started_at <= at && rental.rent_ended_at >= at)
                .map(|rental| rental.car_id)
                .collect(),
            _ => Vec::new(),
        };

        self.rows
            .lock()
            .await
            .iter()
            .filter(|car| filter.size.as_ref().map_or(true, |size| &car.size == size))
            .filter(|car| !booked.contains(&car.id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CarRepository for InMemoryCars {
    async fn create(&self, attrs: CarAttributes) -> RepositoryResult<Car> {
        self.created.lock().await.push(attrs.clone());
        self.check()?;

        let mut rows = self.rows.lock().await;
        let id = rows.iter().map(|car| car.id).max().unwrap_or(0) + 1;
        let car = Car {
            id,
            name: attrs.name,
            price: attrs.price,
            size: attrs.size,
            image: attrs.image,
            is_currently_rented: attrs.is_currently_rented,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        rows.push(car.clone());
        Ok(car)
    }

    async fn find_by_pk(&self, id: i32) -> RepositoryResult<Option<Car>> {
        self.check()?;
        Ok(self.rows.lock().await.iter().find(|car| car.id == id).cloned())
    }

    async fn find_all(&self, filter: &CarFilter, limit: i64, offset: i64) -> RepositoryResult<Vec<Car>> {
        self.check()?;
        Ok(self
            .filtered(filter)
            .await
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: &CarFilter) -> RepositoryResult<i64> {
        self.check()?;
        Ok(self.filtered(filter).await.len() as i64)
    }

    async fn update(&self, id: i32, attrs: CarAttributes) -> RepositoryResult<Option<Car>> {
        self.check()?;
        let mut rows = self.rows.lock().await;
        Ok(rows.iter_mut().find(|car| car.id == id).map(|car| {
            car.name = attrs.name;
            car.price = attrs.price;
            car.size = attrs.size;
            car.image = attrs.image;
            car.is_currently_rented = attrs.is_currently_rented;
            car.updated_at = Utc::now();
            car.clone()
        }))
    }

    async fn destroy(&self, id: i32) -> RepositoryResult<bool> {
        self.check()?;
        let mut rows = self.rows.lock().await;
        if self.gone_before_destroy {
            rows.clear();
        }
        let before = rows.len();
        rows.retain(|car| car.id != id);
        Ok(rows.len() < before)
    }
}

/// In-memory users; `create` enforces unique emails like the database does.
#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<Vec<User>>,
    hidden_from_lookup: bool,
}

impl InMemoryUsers {
    pub fn with(rows: Vec<User>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    /// Rows inserted by a concurrent request after this one looked up the email.
    pub fn inserted_concurrently(rows: Vec<User>) -> Self {
        Self {
            hidden_from_lookup: true,
            ..Self::with(rows)
        }
    }

    pub async fn snapshot(&self) -> Vec<User> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create(&self, new_user: NewUser) -> RepositoryResult<User> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|user| user.email == new_user.email) {
            return Err(RepositoryError::Conflict(
                "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
            ));
        }
        let id = rows.iter().map(|user| user.id).max().unwrap_or(0) + 1;
        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
            encrypted_password: new_user.encrypted_password,
            image: None,
            role_id: new_user.role_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_pk(&self, id: i32) -> RepositoryResult<Option<User>> {
        Ok(self.rows.lock().await.iter().find(|user| user.id == id).cloned())
    }

    async fn find_one_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        if self.hidden_from_lookup {
            return Ok(None);
        }
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }
}

pub struct InMemoryRoles {
    rows: Vec<Role>,
}

impl InMemoryRoles {
    pub fn with(rows: Vec<Role>) -> Self {
        Self { rows }
    }
}

impl Default for InMemoryRoles {
    fn default() -> Self {
        Self::with(vec![
            role(ADMIN_ROLE_ID, ROLE_ADMIN),
            role(CUSTOMER_ROLE_ID, ROLE_CUSTOMER),
        ])
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoles {
    async fn find_by_pk(&self, id: i32) -> RepositoryResult<Option<Role>> {
        Ok(self.rows.iter().find(|role| role.id == id).cloned())
    }

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Role>> {
        Ok(self.rows.iter().find(|role| role.name == name).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryRentals {
    rows: Mutex<Vec<Rental>>,
}

impl InMemoryRentals {
    pub async fn snapshot(&self) -> Vec<Rental> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl RentalRepository for InMemoryRentals {
    async fn find_overlapping(
        &self,
        car_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Option<Rental>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|rental| {
                rental.car_id == car_id && rental.rent_started_at <= end && rental.rent_ended_at >= start
            })
            .cloned())
    }

    async fn create(&self, new_rental: NewRental) -> RepositoryResult<Rental> {
        let mut rows = self.rows.lock().await;
        let rental = Rental {
            id: rows.len() as i32 + 1,
            user_id: new_rental.user_id,
            car_id: new_rental.car_id,
            rent_started_at: new_rental.rent_started_at,
            rent_ended_at: new_rental.rent_ended_at,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        rows.push(rental.clone());
        Ok(rental)
    }
}

pub struct TestApp {
    pub cars: Arc<InMemoryCars>,
    pub users: Arc<InMemoryUsers>,
    pub roles: Arc<InMemoryRoles>,
    pub rentals: Arc<InMemoryRentals>,
    pub auth_service: AuthService,
}

impl Default for TestApp {
    fn default() -> Self {
        let rentals = Arc::new(InMemoryRentals::default());
        Self {
            cars: Arc::new(InMemoryCars::default().linked_to(rentals.clone())),
            users: Arc::default(),
            roles: Arc::default(),
            rentals,
            auth_service: AuthService::new("test-secret", Duration::hours(1), 4),
        }
    }
}

impl TestApp {
    pub fn with_cars(mut self, cars: InMemoryCars) -> Self {
        self.cars = Arc::new(cars.linked_to(self.rentals.clone()));
        self
    }

    pub fn with_users(mut self, users: InMemoryUsers) -> Self {
        self.users = Arc::new(users);
        self
    }

    pub fn with_roles(mut self, roles: InMemoryRoles) -> Self {
        self.roles = Arc::new(roles);
        self
    }

    pub fn router(&self) -> Router {
        build_router(AppState {
            cars: self.cars.clone(),
            users: self.users.clone(),
            roles: self.roles.clone(),
            rentals: self.rentals.clone(),
            auth_service: self.auth_service.clone(),
            pagination: PaginationDefaults::default(),
            service_name: "BCR".to_string(),
        })
    }

    pub fn token(&self, user: &User, role: &Role) -> String {
        self.auth_service
            .create_token(user, role)
            .expect("token")
    }

    pub fn admin_token(&self) -> String {
        self.token(&user(100, "admin", ADMIN_ROLE_ID), &role(ADMIN_ROLE_ID, ROLE_ADMIN))
    }

    pub fn customer_token(&self) -> String {
        self.token(
            &user(200, "customer", CUSTOMER_ROLE_ID),
            &role(CUSTOMER_ROLE_ID, ROLE_CUSTOMER),
        )
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let resp = self
            .router()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");
        read_json(resp).await
    }
}

pub async fn read_json(resp: axum::response::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    let json = serde_json::from_slice(&bytes).expect("expected a JSON body");
    (status, json)
}
