// --- File: crates/calrelay_x402/src/routes.rs ---

use crate::facilitator::Facilitator;
use crate::gate::{x402_payment_middleware, X402GateState};
use axum::{middleware, Router};
use calrelay_common::RelayError;
use calrelay_config::AppConfig;
use std::sync::Arc;
use tracing::info;

/// Puts the payment gate in front of every route of `router`.
///
/// Leaves the router untouched when the gate is disabled in config. Every
/// path in `paid_paths` must have a price in `x402.routes`, otherwise the
/// router is rejected with a config error.
pub fn with_payment_gate(
    router: Router,
    config: &AppConfig,
    facilitator: Arc<dyn Facilitator>,
    paid_paths: &[&str],
) -> Result<Router, RelayError> {
    let Some(x402) = config.x402.as_ref().filter(|_| config.use_x402) else {
        return Ok(router);
    };

    let gate_state = Arc::new(X402GateState::from_config(x402, facilitator)?);
    for path in paid_paths {
        gate_state.ensure_priced(path)?;
    }
    for (path, paid) in gate_state.priced_paths() {
        info!(
            "💡 x402: Charging {} atomic units on {} for {} (pay to {})",
            paid.max_amount_required, x402.network, path, x402.pay_to
        );
    }

    Ok(router.layer(middleware::from_fn_with_state(
        gate_state,
        x402_payment_middleware,
    )))
}
