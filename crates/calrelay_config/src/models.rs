// --- File: crates/calrelay_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the booking form; not served when unset.
    #[serde(default)]
    pub static_dir: Option<String>,
}

// --- Cal.com Config ---
// Holds non-secret Cal.com config. The API key is loaded from CAL_API_KEY
// through the "secret_from_env" marker.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CalConfig {
    #[serde(default = "default_cal_base_url")]
    pub base_url: String,
    pub api_key: String,
    /// Attendee language used when a booking request does not carry one.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// IANA time zone used when a booking request does not carry one.
    #[serde(default = "default_time_zone")]
    pub default_time_zone: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound on concurrent slot lookups for one aggregation.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

/// One entry of the route to price table consulted by the payment gate.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PricedRoute {
    /// Request path, matched exactly (e.g. "/book-meeting-x402").
    pub path: String,
    /// Dollar price such as "$0.001".
    pub price: String,
    #[serde(default)]
    pub description: Option<String>,
}

// --- x402 Config ---
// The receiving address is loaded from X402_PAY_TO through the marker.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct X402Config {
    #[serde(default = "default_facilitator_url")]
    pub facilitator_url: String,
    pub pay_to: String,
    #[serde(default = "default_network")]
    pub network: String,
    /// Token contract override; the USDC deployment for `network` otherwise.
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default = "default_max_timeout_seconds")]
    pub max_timeout_seconds: u64,
    #[serde(default)]
    pub routes: Vec<PricedRoute>,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,
    pub cal: CalConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_x402: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub x402: Option<X402Config>,
}

fn default_cal_base_url() -> String {
    "https://api.cal.com/v2".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_time_zone() -> String {
    "America/New_York".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_facilitator_url() -> String {
    "https://x402.org/facilitator".to_string()
}

fn default_network() -> String {
    "base-sepolia".to_string()
}

fn default_max_timeout_seconds() -> u64 {
    60
}
