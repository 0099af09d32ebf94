// --- File: crates/services/calrelay_backend/src/service_factory.rs ---
//! Builds the external services the relay talks to.

use calrelay_calcom::client::{CalComClient, CalendarProvider};
use calrelay_common::{config_error, RelayError};
use calrelay_config::AppConfig;
use calrelay_x402::facilitator::{Facilitator, HttpFacilitator};
use std::sync::Arc;
use tracing::info;

/// The calendar provider and, when payments are enabled, the facilitator.
///
/// Tests build this directly with fakes or mock-backed clients.
#[derive(Clone)]
pub struct RelayServices {
    pub provider: Arc<dyn CalendarProvider>,
    pub facilitator: Option<Arc<dyn Facilitator>>,
}

impl RelayServices {
    /// Creates the HTTP-backed services described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, RelayError> {
        let provider = CalComClient::new(&config.cal)
            .map_err(|e| config_error(format!("failed to build Cal.com client: {e}")))?;
        info!("📅 Cal.com client ready for {}", config.cal.base_url);

        let facilitator: Option<Arc<dyn Facilitator>> =
            match config.x402.as_ref().filter(|_| config.use_x402) {
                Some(x402) => {
                    let facilitator =
                        HttpFacilitator::new(&x402.facilitator_url, x402.max_timeout_seconds)?;
                    info!("💰 x402 facilitator at {}", x402.facilitator_url);
                    Some(Arc::new(facilitator))
                }
                None => {
                    info!("x402 payments disabled");
                    None
                }
            };

        Ok(Self {
            provider: Arc::new(provider),
            facilitator,
        })
    }
}
