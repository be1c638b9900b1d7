//! Car listing HTTP service
//!
//! Car CRUD with image uploads, the user endpoints from the `auth` crate and
//! image downloads from the object store, assembled into one router.

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod upload;

pub use routes::create_router;
pub use state::AppState;
