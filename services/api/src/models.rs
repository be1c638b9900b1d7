//! API models for request and response payloads

pub mod car;

pub use car::{Car, CarChanges, NewCar};
