// --- File: crates/calrelay_calcom/src/client.rs ---
//! Cal.com v2 API client.
//!
//! This module provides the [`CalendarProvider`] trait used by the slot
//! aggregator and the booking relay, and its HTTP implementation against
//! Cal.com.

use std::collections::BTreeMap;

use calrelay_common::{create_client, BoxFuture, RelayError};
use calrelay_config::CalConfig;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

// Cal.com versions every endpoint separately. These must match the endpoint
// they are sent to, they are not interchangeable.
pub const EVENT_TYPES_API_VERSION: &str = "2024-06-14";
pub const SLOTS_API_VERSION: &str = "2024-09-04";
pub const BOOKINGS_API_VERSION: &str = "2024-08-13";

pub const API_VERSION_HEADER: &str = "cal-api-version";
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

const SERVICE_NAME: &str = "Cal.com";

/// Errors that can occur when talking to Cal.com.
#[derive(Error, Debug)]
pub enum CalComError {
    #[error("Cal.com request failed: {0}")]
    RequestError(reqwest::Error),
    #[error("Cal.com request timed out")]
    Timeout,
    #[error("Cal.com returned status {status}")]
    ApiError { status: u16, body: Option<Value> },
    #[error("Failed to parse Cal.com response: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for CalComError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CalComError::Timeout
        } else {
            CalComError::RequestError(err)
        }
    }
}

impl From<CalComError> for RelayError {
    fn from(err: CalComError) -> Self {
        let message = err.to_string();
        let details = match err {
            CalComError::ApiError { body, .. } => body,
            _ => None,
        };
        RelayError::UpstreamError {
            service_name: SERVICE_NAME.to_string(),
            message,
            details,
        }
    }
}

/// A bookable meeting template exposed by a Cal.com user.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    pub slug: String,
    pub length_in_minutes: i64,
}

/// Free start times per calendar date, dates in ascending order.
pub type SlotMap = BTreeMap<String, Vec<String>>;

// Cal.com answers every call with {"status": "...", "data": ...}.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

// Slots come back as objects ({"start": ...}) by default and as bare
// strings in some response formats.
#[derive(Deserialize)]
#[serde(untagged)]
enum SlotEntry {
    Start(String),
    Object { start: String },
}

impl SlotEntry {
    fn into_start(self) -> String {
        match self {
            SlotEntry::Start(start) | SlotEntry::Object { start } => start,
        }
    }
}

/// Attendee block of a booking, as Cal.com expects it.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub name: String,
    pub email: String,
    pub time_zone: String,
    pub language: String,
}

/// A validated booking ready to be sent to Cal.com.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    pub start: String,
    pub event_type_slug: String,
    pub username: String,
    pub attendee: Attendee,
    /// Sent as a header, not in the body.
    #[serde(skip)]
    pub idempotency_key: String,
}

/// Calendar provider operations needed by the relay.
///
/// `create_booking` is not idempotent on the provider side: every call may
/// create a new booking. Callers must not retry it blindly.
pub trait CalendarProvider: Send + Sync {
    /// Lists the event types published by `username`.
    fn list_event_types(&self, username: &str) -> BoxFuture<'_, Vec<EventType>, CalComError>;

    /// Lists free start times for one event type within `[start, end]`.
    fn list_slots(
        &self,
        username: &str,
        event_type_slug: &str,
        start: &str,
        end: &str,
    ) -> BoxFuture<'_, SlotMap, CalComError>;

    /// Creates a booking and returns the provider's response body verbatim.
    fn create_booking(&self, submission: &BookingSubmission) -> BoxFuture<'_, Value, CalComError>;
}

/// HTTP implementation of [`CalendarProvider`] for the Cal.com v2 API.
#[derive(Clone)]
pub struct CalComClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CalComClient {
    /// Create a client from configuration. Every call is bounded by
    /// `request_timeout_secs`.
    pub fn new(config: &CalConfig) -> Result<Self, CalComError> {
        let http = create_client(config.request_timeout_secs, true)?;
        Ok(Self::with_client(http, &config.base_url, &config.api_key))
    }

    pub fn with_client(http: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Reads a Cal.com response, turning non-2xx statuses into `ApiError` with
/// the provider's body attached when there is one.
async fn read_json(response: Response) -> Result<Value, CalComError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let body = serde_json::from_slice::<Value>(&bytes).ok().or_else(|| {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            (!text.is_empty()).then_some(Value::String(text))
        });
        warn!("Cal.com answered {}: {:?}", status, body);
        return Err(CalComError::ApiError {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| CalComError::ParseError(e.to_string()))
}

fn unwrap_data<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, CalComError> {
    serde_json::from_value::<Envelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| CalComError::ParseError(e.to_string()))
}

impl CalendarProvider for CalComClient {
    fn list_event_types(&self, username: &str) -> BoxFuture<'_, Vec<EventType>, CalComError> {
        let username = username.to_string();

        Box::pin(async move {
            let response = self
                .http
                .get(self.url("event-types"))
                .bearer_auth(&self.api_key)
                .header(API_VERSION_HEADER, EVENT_TYPES_API_VERSION)
                .query(&[("username", username.as_str())])
                .send()
                .await?;

            let event_types: Vec<EventType> = unwrap_data(read_json(response).await?)?;
            debug!("{} event types for {}", event_types.len(), username);
            Ok(event_types)
        })
    }

    fn list_slots(
        &self,
        username: &str,
        event_type_slug: &str,
        start: &str,
        end: &str,
    ) -> BoxFuture<'_, SlotMap, CalComError> {
        let query = [
            ("username", username.to_string()),
            ("eventTypeSlug", event_type_slug.to_string()),
            ("start", start.to_string()),
            ("end", end.to_string()),
        ];

        Box::pin(async move {
            let response = self
                .http
                .get(self.url("slots"))
                .bearer_auth(&self.api_key)
                .header(API_VERSION_HEADER, SLOTS_API_VERSION)
                .query(&query)
                .send()
                .await?;

            let raw: BTreeMap<String, Vec<SlotEntry>> = unwrap_data(read_json(response).await?)?;
            Ok(raw
                .into_iter()
                .map(|(date, entries)| {
                    (date, entries.into_iter().map(SlotEntry::into_start).collect())
                })
                .collect())
        })
    }

    fn create_booking(&self, submission: &BookingSubmission) -> BoxFuture<'_, Value, CalComError> {
        let submission = submission.clone();

        Box::pin(async move {
            info!(
                "Creating Cal.com booking for {}/{} at {} (idempotency key {})",
                submission.username,
                submission.event_type_slug,
                submission.start,
                submission.idempotency_key
            );

            let response = self
                .http
                .post(self.url("bookings"))
                .bearer_auth(&self.api_key)
                .header(API_VERSION_HEADER, BOOKINGS_API_VERSION)
                .header(IDEMPOTENCY_KEY_HEADER, &submission.idempotency_key)
                .json(&submission)
                .send()
                .await?;

            read_json(response).await
        })
    }
}
