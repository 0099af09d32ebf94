// --- File: crates/calrelay_calcom/src/logic.rs ---
use crate::client::{Attendee, BookingSubmission, CalComError, CalendarProvider, EventType, SlotMap};
use calrelay_common::{config_error, validation_error, RelayError};
use calrelay_config::CalConfig;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use futures::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

// --- Data Structures ---

/// Body of `POST /get-slots`.
#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SlotsRequest {
    #[cfg_attr(feature = "openapi", schema(example = "alice"))]
    pub username: Option<String>,
    /// Minimum meeting length in minutes; a number or a numeric string.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>, example = 30))]
    pub duration: Option<Value>,
    /// ISO-8601 date or timestamp, defaults to now.
    #[cfg_attr(feature = "openapi", schema(example = "2025-06-12"))]
    pub start_time: Option<String>,
    /// ISO-8601 date or timestamp, defaults to now + 24h.
    #[cfg_attr(feature = "openapi", schema(example = "2025-06-13"))]
    pub end_time: Option<String>,
}

/// A resolved availability lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotQuery {
    pub username: String,
    pub min_duration: f64,
    pub start: String,
    pub end: String,
}

/// Free start times of one event type on one date.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DayAvailability {
    #[cfg_attr(feature = "openapi", schema(example = "2025-06-12"))]
    pub date: String,
    pub availability: Vec<String>,
}

/// All availability of one event type, grouped by date.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SlotGroup {
    #[cfg_attr(feature = "openapi", schema(example = "30 minutes"))]
    pub duration: String,
    #[cfg_attr(feature = "openapi", schema(example = "30min"))]
    pub event_slug: String,
    pub availability: Vec<DayAvailability>,
}

/// Body of `POST /book-meeting` and `POST /book-meeting-x402`.
#[derive(Deserialize, Debug, Default, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[cfg_attr(feature = "openapi", schema(example = "Ada Lovelace"))]
    pub attendee_name: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "ada@example.com"))]
    pub attendee_email: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "2025-06-12T05:00:00.000Z"))]
    pub start_time: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "alice"))]
    pub username: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "30min"))]
    pub event_type_slug: Option<String>,
    /// Attendee language, server default when absent.
    pub language: Option<String>,
    /// IANA time zone of the attendee, server default when absent.
    pub time_zone: Option<String>,
    /// Forwarded to Cal.com so a retried request does not double-book.
    pub idempotency_key: Option<String>,
}

/// Server-wide attendee defaults for bookings.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDefaults {
    pub language: String,
    pub time_zone: String,
}

impl BookingDefaults {
    /// Reads the defaults from config, rejecting an unknown time zone.
    pub fn from_config(config: &CalConfig) -> Result<Self, RelayError> {
        Tz::from_str(&config.default_time_zone).map_err(|_| {
            config_error(format!(
                "cal.default_time_zone '{}' is not an IANA time zone",
                config.default_time_zone
            ))
        })?;
        Ok(Self {
            language: config.default_language.clone(),
            time_zone: config.default_time_zone.clone(),
        })
    }
}

// --- Slot aggregation ---

/// Parses the minimum duration.
///
/// Absent or null means no minimum. Numbers and numeric strings are accepted;
/// anything else is rejected rather than silently matching nothing.
pub fn parse_min_duration(value: Option<&Value>) -> Result<f64, RelayError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    parsed
        .filter(|d| d.is_finite())
        .ok_or_else(|| validation_error("duration must be a number of minutes"))
}

fn parse_time_bound(raw: &str, field: &str) -> Result<DateTime<Utc>, RelayError> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| validation_error(format!("{field} must be an ISO-8601 date or timestamp")))
}

fn iso_string(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Resolves the lookup window.
///
/// Supplied bounds are validated and forwarded as written. A missing start is
/// `now`, a missing end is `now + 24h`.
pub fn resolve_window(
    start_time: Option<&str>,
    end_time: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(String, String), RelayError> {
    let (start_at, start) = match start_time.filter(|s| !s.trim().is_empty()) {
        Some(raw) => (parse_time_bound(raw, "startTime")?, raw.trim().to_string()),
        None => (now, iso_string(now)),
    };
    let default_end = now + Duration::hours(24);
    let (end_at, end) = match end_time.filter(|s| !s.trim().is_empty()) {
        Some(raw) => (parse_time_bound(raw, "endTime")?, raw.trim().to_string()),
        None => (default_end, iso_string(default_end)),
    };

    if end_at < start_at {
        return Err(validation_error("endTime must not be before startTime"));
    }
    Ok((start, end))
}

impl SlotsRequest {
    /// Validates the request and fills in defaults. Fails before any
    /// network call when the username is missing.
    pub fn into_query(self, now: DateTime<Utc>) -> Result<SlotQuery, RelayError> {
        let username = self
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| validation_error("Username is required"))?;
        let min_duration = parse_min_duration(self.duration.as_ref())?;
        let (start, end) =
            resolve_window(self.start_time.as_deref(), self.end_time.as_deref(), now)?;

        Ok(SlotQuery {
            username,
            min_duration,
            start,
            end,
        })
    }
}

/// Keeps event types at least `min_duration` minutes long, in their original order.
pub fn filter_by_min_duration(event_types: Vec<EventType>, min_duration: f64) -> Vec<EventType> {
    event_types
        .into_iter()
        .filter(|event_type| event_type.length_in_minutes as f64 >= min_duration)
        .collect()
}

/// Turns a date to start-times mapping into a list, keeping order.
pub fn reshape_availability(slots: SlotMap) -> Vec<DayAvailability> {
    slots
        .into_iter()
        .map(|(date, availability)| DayAvailability { date, availability })
        .collect()
}

fn slot_group(event_type: &EventType, slots: SlotMap) -> SlotGroup {
    SlotGroup {
        duration: format!("{} minutes", event_type.length_in_minutes),
        event_slug: event_type.slug.clone(),
        availability: reshape_availability(slots),
    }
}

/// Aggregates the availability of every event type of `query.username` that
/// lasts at least `query.min_duration` minutes.
///
/// Slot lookups run concurrently, at most `max_concurrency` at a time, and the
/// groups come back in event-type order. The first failing lookup aborts the
/// whole aggregation.
pub async fn get_available_slots(
    provider: &dyn CalendarProvider,
    query: &SlotQuery,
    max_concurrency: usize,
) -> Result<Vec<SlotGroup>, CalComError> {
    let event_types = provider.list_event_types(&query.username).await?;
    let total = event_types.len();
    let matching = filter_by_min_duration(event_types, query.min_duration);
    debug!(
        "{} of {} event types for {} last at least {} minutes",
        matching.len(),
        total,
        query.username,
        query.min_duration
    );

    stream::iter(matching)
        .map(|event_type| async move {
            let slots = provider
                .list_slots(&query.username, &event_type.slug, &query.start, &query.end)
                .await?;
            Ok::<_, CalComError>(slot_group(&event_type, slots))
        })
        .buffered(max_concurrency.max(1))
        .try_collect()
        .await
}

// --- Booking relay ---

fn non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

// Blank values count as missing; present ones are forwarded as sent.
fn required(value: Option<String>, field: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value.filter(|v| non_blank(v)) {
        Some(v) => v,
        None => {
            missing.push(field);
            String::new()
        }
    }
}

/// Validates a booking request and builds the Cal.com submission.
///
/// All five identity fields must be present and non-empty. Language and time
/// zone fall back to `defaults`. The idempotency key is taken from the body,
/// then from `header_key`, and generated otherwise.
pub fn prepare_booking(
    request: BookingRequest,
    defaults: &BookingDefaults,
    header_key: Option<String>,
) -> Result<BookingSubmission, RelayError> {
    let mut missing = Vec::new();
    let name = required(request.attendee_name, "attendeeName", &mut missing);
    let email = required(request.attendee_email, "attendeeEmail", &mut missing);
    let start = required(request.start_time, "startTime", &mut missing);
    let username = required(request.username, "username", &mut missing);
    let event_type_slug = required(request.event_type_slug, "eventTypeSlug", &mut missing);
    if !missing.is_empty() {
        return Err(validation_error(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let time_zone = match request.time_zone.filter(|tz| !tz.trim().is_empty()) {
        Some(tz) => {
            let tz = tz.trim().to_string();
            Tz::from_str(&tz)
                .map_err(|_| validation_error(format!("timeZone '{tz}' is not an IANA time zone")))?;
            tz
        }
        None => defaults.time_zone.clone(),
    };
    let language = request
        .language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| defaults.language.clone());

    let idempotency_key = request
        .idempotency_key
        .filter(|k| non_blank(k))
        .or(header_key.filter(|k| non_blank(k)))
        .unwrap_or_else(|| {
            let generated = uuid::Uuid::new_v4().to_string();
            debug!("No idempotency key supplied, generated {}", generated);
            generated
        });

    Ok(BookingSubmission {
        start,
        event_type_slug,
        username,
        attendee: Attendee {
            name,
            email,
            time_zone,
            language,
        },
        idempotency_key,
    })
}

/// Forwards a prepared booking to the provider and returns its confirmation verbatim.
pub async fn book_meeting(
    provider: &dyn CalendarProvider,
    submission: &BookingSubmission,
) -> Result<Value, CalComError> {
    let confirmation = provider.create_booking(submission).await?;
    info!(
        "Booked {} for {} at {}",
        submission.event_type_slug, submission.attendee.email, submission.start
    );
    Ok(confirmation)
}
