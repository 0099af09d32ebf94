// File: crates/services/calrelay_backend/src/lib.rs
pub mod app; // Router composition
pub mod service_factory; // Cal.com client and x402 facilitator construction

pub use app::build_app;
pub use service_factory::RelayServices;
