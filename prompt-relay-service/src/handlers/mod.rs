//! HTTP handlers for prompt-relay-service.

pub mod generate;
pub mod health;

pub use generate::generate_image;
pub use health::{health_check, metrics_endpoint, readiness_check};
