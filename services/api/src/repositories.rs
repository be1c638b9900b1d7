//! Repositories for car records
//!
//! [`CarStore`] is the data-access seam. Deleting a car, or replacing its
//! images, also removes the stored objects it no longer references, as one
//! unit with the record change.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Car, CarChanges, NewCar};

pub mod car;
pub mod memory;

pub use car::CarRepository;
pub use memory::MemoryCarStore;

/// Data-access trait for car records
#[async_trait]
pub trait CarStore: Send + Sync {
    /// Insert a car
    async fn create(&self, new_car: &NewCar) -> Result<Car>;

    /// Every car, oldest first
    async fn list(&self) -> Result<Vec<Car>>;

    /// Cars owned by `user_id`, oldest first
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Car>>;

    /// Find a car by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>>;

    /// Apply `changes`. When the image list is replaced, objects dropped from
    /// it are deleted along with the update. `None` when the car is absent.
    async fn update(&self, id: Uuid, changes: &CarChanges) -> Result<Option<Car>>;

    /// Delete a car and every object it references. Returns the removed car.
    async fn delete(&self, id: Uuid) -> Result<Option<Car>>;
}
