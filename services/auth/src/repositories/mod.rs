//! User persistence
//!
//! [`UserStore`] is the data-access seam; [`UserRepository`] implements it on
//! PostgreSQL and [`MemoryUserStore`] in process memory.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewUser, User};

pub mod memory;
pub mod user;

pub use memory::MemoryUserStore;
pub use user::UserRepository;

/// Data-access trait for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Returns `None` when the email is already registered.
    async fn create(&self, new_user: &NewUser) -> Result<Option<User>>;

    /// Find a user by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}
