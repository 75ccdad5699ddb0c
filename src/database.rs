use sqlx::{postgres::PgPoolOptions, Executor, PgPool};

use crate::config::AppConfig;
use crate::models::{ROLE_ADMIN, ROLE_CUSTOMER};

pub async fn create_connection_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create tables if they don't exist
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS roles (
            id SERIAL PRIMARY KEY,
            name VARCHAR(50) UNIQUE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) UNIQUE NOT NULL,
            encrypted_password VARCHAR(255) NOT NULL,
            image VARCHAR(500),
            role_id INTEGER NOT NULL REFERENCES roles(id),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );

        CREATE TABLE IF NOT EXISTS cars (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            price INTEGER NOT NULL CHECK (price >= 0),
            size VARCHAR(50) NOT NULL,
            image VARCHAR(500) NOT NULL,
            is_currently_rented BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );

        CREATE TABLE IF NOT EXISTS rentals (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            car_id INTEGER NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
            rent_started_at TIMESTAMP WITH TIME ZONE NOT NULL,
            rent_ended_at TIMESTAMP WITH TIME ZONE NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CHECK (rent_ended_at >= rent_started_at)
        );

        -- Indexes
        CREATE INDEX IF NOT EXISTS idx_cars_size ON cars(size);
        CREATE INDEX IF NOT EXISTS idx_rentals_car_period ON rentals(car_id, rent_started_at, rent_ended_at);
        "#,
    )
    .await?;

    for role in [ROLE_ADMIN, ROLE_CUSTOMER] {
        sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(role)
            .execute(pool)
            .await?;
    }

    tracing::info!("database schema is up to date");
    Ok(())
}
