//! service-core: Shared infrastructure for the prompt relay workspace.
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod observability;

pub use axum;
pub use serde;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
