//! In-memory car store

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use storage::MemoryBucket;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::CarStore;
use crate::models::{Car, CarChanges, NewCar};

/// Car store kept in process memory
///
/// Shares the [`MemoryBucket`] holding the images so deletes can remove a
/// car's objects while the car map is locked.
#[derive(Clone)]
pub struct MemoryCarStore {
    cars: Arc<Mutex<HashMap<Uuid, Car>>>,
    bucket: MemoryBucket,
}

impl MemoryCarStore {
    pub fn new(bucket: MemoryBucket) -> Self {
        Self {
            cars: Arc::new(Mutex::new(HashMap::new())),
            bucket,
        }
    }
}

fn oldest_first(mut cars: Vec<Car>) -> Vec<Car> {
    cars.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    cars
}

#[async_trait]
impl CarStore for MemoryCarStore {
    async fn create(&self, new_car: &NewCar) -> Result<Car> {
        let now = Utc::now();
        let car = Car {
            id: Uuid::new_v4(),
            name: new_car.name.clone(),
            brand: new_car.brand.clone(),
            price: new_car.price,
            description: new_car.description.clone(),
            images: new_car.images.clone(),
            user_id: new_car.user_id,
            created_at: now,
            updated_at: now,
        };

        self.cars.lock().await.insert(car.id, car.clone());
        Ok(car)
    }

    async fn list(&self) -> Result<Vec<Car>> {
        let cars = self.cars.lock().await;
        Ok(oldest_first(cars.values().cloned().collect()))
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Car>> {
        let cars = self.cars.lock().await;
        Ok(oldest_first(
            cars.values()
                .filter(|car| car.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>> {
        Ok(self.cars.lock().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: &CarChanges) -> Result<Option<Car>> {
        let mut cars = self.cars.lock().await;
        let Some(car) = cars.get_mut(&id) else {
            return Ok(None);
        };

        let previous = car.clone();
        changes.apply_to(car);
        let updated = car.clone();

        self.bucket
            .delete_many(&previous.images_dropped_by(&updated))
            .await;
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Car>> {
        let mut cars = self.cars.lock().await;
        let Some(car) = cars.remove(&id) else {
            return Ok(None);
        };

        self.bucket.delete_many(&car.images).await;
        Ok(Some(car))
    }
}
