//! Core business logic for circles.

pub mod services;

pub use services::*;
