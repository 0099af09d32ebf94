// File: crates/calrelay_calcom/src/doc.rs
#![allow(dead_code)] // Allow dead code for doc functions

#[cfg(feature = "openapi")]
use crate::client::EventType;
#[cfg(feature = "openapi")]
use crate::logic::{BookingRequest, DayAvailability, SlotGroup, SlotsRequest};
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

// The paid route shares its handler with /book-meeting; document it separately.
#[cfg(feature = "openapi")]
#[utoipa::path(
    post,
    path = "/book-meeting-x402",
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Cal.com booking confirmation, X-PAYMENT-RESPONSE header set"),
        (status = 400, description = "A required field is missing"),
        (status = 402, description = "Payment required: x402 payment requirements"),
        (status = 500, description = "Cal.com rejected the booking or was unreachable")
    ),
    tag = "Cal.com"
)]
fn doc_book_meeting_x402_handler() {}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::get_slots_handler,
        crate::handlers::book_meeting_handler,
        doc_book_meeting_x402_handler
    ),
    components(
        schemas(SlotsRequest, SlotGroup, DayAvailability, BookingRequest, EventType)
    ),
    tags(
        (name = "Cal.com", description = "Slot aggregation and booking relay")
    )
)]
pub struct CalComApiDoc;
