// File: crates/calrelay_calcom/src/handlers.rs
use crate::client::CalendarProvider;
use crate::logic::{
    book_meeting, get_available_slots, prepare_booking, BookingDefaults, BookingRequest,
    SlotGroup, SlotsRequest,
};
use axum::{extract::State, http::HeaderMap, response::Json};
use calrelay_common::{logging::log_result, ApiResponse, RelayError};
use calrelay_config::AppConfig;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Header a client may use instead of the `idempotencyKey` body field.
pub const IDEMPOTENCY_KEY_REQUEST_HEADER: &str = "Idempotency-Key";

// Define shared state needed by the Cal.com handlers
#[derive(Clone)]
pub struct CalState {
    pub config: Arc<AppConfig>,
    pub provider: Arc<dyn CalendarProvider>,
    pub booking_defaults: BookingDefaults,
}

/// Handler to list available slots grouped by event type and date.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/get-slots",
    request_body = SlotsRequest,
    responses(
        (status = 200, description = "Availability per event type: {message, data: SlotGroup[]}"),
        (status = 400, description = "Username missing or malformed window/duration"),
        (status = 500, description = "Cal.com failed or was unreachable")
    ),
    tag = "Cal.com"
))]
pub async fn get_slots_handler(
    State(state): State<Arc<CalState>>,
    Json(payload): Json<SlotsRequest>,
) -> Result<Json<ApiResponse<Vec<SlotGroup>>>, RelayError> {
    let query = payload.into_query(Utc::now())?;
    info!(
        "Fetching slots for {} between {} and {}",
        query.username, query.start, query.end
    );

    let groups = log_result(
        get_available_slots(
            state.provider.as_ref(),
            &query,
            state.config.cal.max_concurrent_fetches,
        )
        .await,
        "Slots fetched",
        "Error fetching slots from Cal.com",
    )
    .map_err(|e| RelayError::from(e).in_context("Failed to fetch slots"))?;

    Ok(Json(ApiResponse::new("Slots fetched successfully", groups)))
}

/// Handler to book a meeting. Serves both the open and the payment-gated route.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/book-meeting",
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Cal.com booking confirmation: {message, data}"),
        (status = 400, description = "A required field is missing"),
        (status = 500, description = "Cal.com rejected the booking or was unreachable")
    ),
    tag = "Cal.com"
))]
pub async fn book_meeting_handler(
    State(state): State<Arc<CalState>>,
    headers: HeaderMap,
    Json(payload): Json<BookingRequest>,
) -> Result<Json<ApiResponse<Value>>, RelayError> {
    let header_key = headers
        .get(IDEMPOTENCY_KEY_REQUEST_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let submission = prepare_booking(payload, &state.booking_defaults, header_key)?;

    let confirmation = log_result(
        book_meeting(state.provider.as_ref(), &submission).await,
        "Meeting booked",
        "Error booking meeting with Cal.com",
    )
    .map_err(|e| RelayError::from(e).in_context("Failed to book meeting"))?;

    Ok(Json(ApiResponse::new(
        "Meeting booked successfully",
        confirmation,
    )))
}
