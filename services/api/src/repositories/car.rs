//! Car repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::CarStore;
use crate::models::{Car, CarChanges, NewCar};

/// Car repository backed by the `cars` table
#[derive(Clone)]
pub struct CarRepository {
    pool: PgPool,
}

impl CarRepository {
    /// Create a new car repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CarStore for CarRepository {
    async fn create(&self, new_car: &NewCar) -> Result<Car> {
        let car = sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (name, brand, price, description, images, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, brand, price, description, images, user_id, created_at, updated_at
            "#,
        )
        .bind(&new_car.name)
        .bind(&new_car.brand)
        .bind(new_car.price)
        .bind(&new_car.description)
        .bind(&new_car.images)
        .bind(new_car.user_id)
        .fetch_one(&self.pool)
        .await?;

        info!("Created car {} for user {}", car.id, car.user_id);
        Ok(car)
    }

    async fn list(&self) -> Result<Vec<Car>> {
        let cars = sqlx::query_as::<_, Car>(
            r#"
            SELECT id, name, brand, price, description, images, user_id, created_at, updated_at
            FROM cars
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(cars)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Car>> {
        let cars = sqlx::query_as::<_, Car>(
            r#"
            SELECT id, name, brand, price, description, images, user_id, created_at, updated_at
            FROM cars
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cars)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(
            r#"
            SELECT id, name, brand, price, description, images, user_id, created_at, updated_at
            FROM cars
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(car)
    }

    async fn update(&self, id: Uuid, changes: &CarChanges) -> Result<Option<Car>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Car>(
            r#"
            SELECT id, name, brand, price, description, images, user_id, created_at, updated_at
            FROM cars
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(None);
        };

        let car = sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars
            SET name = COALESCE($2, name),
                brand = COALESCE($3, brand),
                price = COALESCE($4, price),
                description = COALESCE($5, description),
                images = COALESCE($6, images),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, brand, price, description, images, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.brand)
        .bind(changes.price)
        .bind(&changes.description)
        .bind(&changes.images)
        .fetch_one(&mut *tx)
        .await?;

        let dropped = current.images_dropped_by(&car);
        let removed = storage::postgres::delete_files(&mut *tx, &dropped).await?;

        tx.commit().await?;

        info!("Updated car {} ({} replaced images removed)", car.id, removed);
        Ok(Some(car))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Car>> {
        let mut tx = self.pool.begin().await?;

        let car = sqlx::query_as::<_, Car>(
            r#"
            DELETE FROM cars
            WHERE id = $1
            RETURNING id, name, brand, price, description, images, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(car) = car else {
            return Ok(None);
        };

        let removed = storage::postgres::delete_files(&mut *tx, &car.images).await?;
        tx.commit().await?;

        info!("Deleted car {} and {} stored images", car.id, removed);
        Ok(Some(car))
    }
}
