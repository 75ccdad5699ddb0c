//! Data-access contracts used by the handlers.
//!
//! Handlers only see these traits; `postgres` provides the sqlx-backed
//! implementations and tests plug in in-memory ones.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Car, CarAttributes, CarFilter, NewRental, NewUser, Rental, Role, User};

pub mod postgres;

pub use postgres::{PgCarRepository, PgRentalRepository, PgRoleRepository, PgUserRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Validation(String),

    /// A unique constraint refused the write.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn name(&self) -> &'static str {
        match self {
            RepositoryError::Validation(_) => "ValidationError",
            RepositoryError::Conflict(_) => "UniqueConstraintError",
            RepositoryError::Database(_) => "DatabaseError",
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn create(&self, attrs: CarAttributes) -> RepositoryResult<Car>;

    async fn find_by_pk(&self, id: i32) -> RepositoryResult<Option<Car>>;

    async fn find_all(&self, filter: &CarFilter, limit: i64, offset: i64) -> RepositoryResult<Vec<Car>>;

    async fn count(&self, filter: &CarFilter) -> RepositoryResult<i64>;

    /// Returns `None` when no car has this id.
    async fn update(&self, id: i32, attrs: CarAttributes) -> RepositoryResult<Option<Car>>;

    /// Returns whether a row was removed.
    async fn destroy(&self, id: i32) -> RepositoryResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> RepositoryResult<User>;

    async fn find_by_pk(&self, id: i32) -> RepositoryResult<Option<User>>;

    async fn find_one_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_pk(&self, id: i32) -> RepositoryResult<Option<Role>>;

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Role>>;
}

#[async_trait]
pub trait RentalRepository: Send + Sync {
    /// First rental of `car_id` whose period intersects `[start, end]`.
    async fn find_overlapping(
        &self,
        car_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Option<Rental>>;

    async fn create(&self, rental: NewRental) -> RepositoryResult<Rental>;
}
