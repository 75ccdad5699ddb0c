use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    CarRepository, RentalRepository, RepositoryError, RepositoryResult, RoleRepository,
    UserRepository,
};
use crate::models::{Car, CarAttributes, CarFilter, NewRental, NewUser, Rental, Role, User};

const CAR_COLUMNS: &str =
    "id, name, price, size, image, is_currently_rented, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, name, email, encrypted_password, image, role_id, created_at, updated_at";
const RENTAL_COLUMNS: &str =
    "id, user_id, car_id, rent_started_at, rent_ended_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgCarRepository {
    pool: PgPool,
}

impl PgCarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_car_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a CarFilter) {
    builder.push(" WHERE 1=1");

    if let Some(size) = &filter.size {
        builder.push(" AND c.size = ").push_bind(size);
    }

    if let Some(available_at) = filter.available_at {
        builder
            .push(" AND NOT EXISTS (SELECT 1 FROM rentals r WHERE r.car_id = c.id AND r.rent_started_at <= ")
            .push_bind(available_at)
            .push(" AND r.rent_ended_at >= ")
            .push_bind(available_at)
            .push(")");
    }
}

#[async_trait]
impl CarRepository for PgCarRepository {
    async fn create(&self, attrs: CarAttributes) -> RepositoryResult<Car> {
        let car = sqlx::query_as::<_, Car>(&format!(
            r#"
            INSERT INTO cars (name, price, size, image, is_currently_rented)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CAR_COLUMNS}
            "#
        ))
        .bind(attrs.name)
        .bind(attrs.price)
        .bind(attrs.size)
        .bind(attrs.image)
        .bind(attrs.is_currently_rented)
        .fetch_one(&self.pool)
        .await?;

        Ok(car)
    }

    async fn find_by_pk(&self, id: i32) -> RepositoryResult<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(car)
    }

    async fn find_all(&self, filter: &CarFilter, limit: i64, offset: i64) -> RepositoryResult<Vec<Car>> {
        let mut builder = QueryBuilder::new(
            "SELECT c.id, c.name, c.price, c.size, c.image, c.is_currently_rented, c.created_at, c.updated_at FROM cars c",
        );
        push_car_filter(&mut builder, filter);
        builder
            .push(" ORDER BY c.id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let cars = builder.build_query_as::<Car>().fetch_all(&self.pool).await?;
        Ok(cars)
    }

    async fn count(&self, filter: &CarFilter) -> RepositoryResult<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM cars c");
        push_car_filter(&mut builder, filter);

        let total = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn update(&self, id: i32, attrs: CarAttributes) -> RepositoryResult<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(&format!(
            r#"
            UPDATE cars
            SET name = $1, price = $2, size = $3, image = $4, is_currently_rented = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING {CAR_COLUMNS}
            "#
        ))
        .bind(attrs.name)
        .bind(attrs.price)
        .bind(attrs.size)
        .bind(attrs.image)
        .bind(attrs.is_currently_rented)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(car)
    }

    async fn destroy(&self, id: i32) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn unique_violation_as_conflict(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(db.message().to_string())
        }
        other => RepositoryError::Database(other),
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, encrypted_password, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.name)
        .bind(user.email)
        .bind(user.encrypted_password)
        .bind(user.role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_violation_as_conflict)?;

        Ok(user)
    }

    async fn find_by_pk(&self, id: i32) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_one_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn find_by_pk(&self, id: i32) -> RepositoryResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }
}

#[derive(Clone)]
pub struct PgRentalRepository {
    pool: PgPool,
}

impl PgRentalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RentalRepository for PgRentalRepository {
    async fn find_overlapping(
        &self,
        car_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Option<Rental>> {
        let rental = sqlx::query_as::<_, Rental>(&format!(
            r#"
            SELECT {RENTAL_COLUMNS}
            FROM rentals
            WHERE car_id = $1 AND rent_started_at <= $3 AND rent_ended_at >= $2
            ORDER BY rent_started_at ASC
            LIMIT 1
            "#
        ))
        .bind(car_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rental)
    }

    async fn create(&self, rental: NewRental) -> RepositoryResult<Rental> {
        let rental = sqlx::query_as::<_, Rental>(&format!(
            r#"
            INSERT INTO rentals (user_id, car_id, rent_started_at, rent_ended_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {RENTAL_COLUMNS}
            "#
        ))
        .bind(rental.user_id)
        .bind(rental.car_id)
        .bind(rental.rent_started_at)
        .bind(rental.rent_ended_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(rental)
    }
}
