//! Authentication models

pub mod user;

pub use user::{NewUser, PublicUser, User, normalize_email};
