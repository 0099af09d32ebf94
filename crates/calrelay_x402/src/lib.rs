// --- File: crates/calrelay_x402/src/lib.rs ---

// Declare modules within this crate
pub mod client; // Paying client for 402-protected endpoints
pub mod error;
pub mod facilitator; // Verify/settle calls to the facilitator
pub mod gate; // Axum middleware charging for priced routes
pub mod price;
pub mod routes; // Wiring of the gate onto a router
pub mod types; // x402 v1 wire format
#[cfg(feature = "openapi")]
pub mod doc;
#[cfg(test)]
mod test_support;

pub use error::X402Error;
pub use routes::with_payment_gate;
