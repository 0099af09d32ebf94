// --- File: crates/calrelay_calcom/src/routes.rs ---

use crate::client::CalendarProvider;
use crate::handlers::{book_meeting_handler, get_slots_handler, CalState};
use crate::logic::BookingDefaults;
use axum::{routing::post, Router};
use calrelay_common::RelayError;
use calrelay_config::AppConfig;
use std::sync::Arc;
use tracing::info;

/// Path of the booking route that sits behind the payment gate.
pub const PAID_BOOKING_PATH: &str = "/book-meeting-x402";

/// Creates a router containing all Cal.com routes, backed by `provider`.
///
/// The paid booking route is only mounted when the payment gate is enabled.
/// The gate in turn refuses to start unless this path is priced.
pub fn routes(
    config: Arc<AppConfig>,
    provider: Arc<dyn CalendarProvider>,
) -> Result<Router, RelayError> {
    let booking_defaults = BookingDefaults::from_config(&config.cal)?;
    let gate_enabled = config.use_x402 && config.x402.is_some();

    let state = Arc::new(CalState {
        config,
        provider,
        booking_defaults,
    });

    let mut router = Router::new()
        .route("/get-slots", post(get_slots_handler))
        .route("/book-meeting", post(book_meeting_handler));

    if gate_enabled {
        info!("💡 Cal.com: Adding {} route.", PAID_BOOKING_PATH);
        router = router.route(PAID_BOOKING_PATH, post(book_meeting_handler));
    }

    Ok(router.with_state(state))
}
