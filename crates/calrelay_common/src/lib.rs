// --- File: crates/calrelay_common/src/lib.rs ---

pub mod error; // Error handling
pub mod handlers; // Shared HTTP handlers
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod routes; // Shared route definitions
pub mod services; // Service abstractions

// Re-export the routes function to be used by the main backend service
pub use routes::routes;

// Re-export error types and utilities for easier access
pub use error::{
    config_error, upstream_error, validation_error, HttpStatusCode, RelayError,
};

// Re-export HTTP utilities for easier access
pub use http::{client::create_client, ApiResponse};

pub use services::BoxFuture;
