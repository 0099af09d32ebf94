//! In-memory calendar provider for unit tests.

use crate::client::{BookingSubmission, CalComError, CalendarProvider, EventType, SlotMap};
use calrelay_common::BoxFuture;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub fn event_type(slug: &str, length_in_minutes: i64) -> EventType {
    EventType {
        slug: slug.to_string(),
        length_in_minutes,
    }
}

pub fn slot_map(entries: &[(&str, &[&str])]) -> SlotMap {
    entries
        .iter()
        .map(|(date, times)| (date.to_string(), times.iter().map(|t| t.to_string()).collect()))
        .collect()
}

#[derive(Default)]
pub struct FakeProvider {
    pub event_types: Vec<EventType>,
    pub slots: HashMap<String, SlotMap>,
    /// Artificial latency per slug, to shuffle completion order.
    pub delays: HashMap<String, Duration>,
    pub failing_slug: Option<String>,
    pub fail_event_types: bool,
    pub fail_booking: bool,
    /// Every call as "event-types:<user>", "slots:<slug>" or "booking:<slug>".
    pub calls: Mutex<Vec<String>>,
    pub bookings: Mutex<Vec<BookingSubmission>>,
}

impl FakeProvider {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CalendarProvider for FakeProvider {
    fn list_event_types(&self, username: &str) -> BoxFuture<'_, Vec<EventType>, CalComError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("event-types:{username}"));
        let result = if self.fail_event_types {
            Err(CalComError::ApiError {
                status: 404,
                body: Some(json!({"status": "error"})),
            })
        } else {
            Ok(self.event_types.clone())
        };
        Box::pin(async move { result })
    }

    fn list_slots(
        &self,
        _username: &str,
        event_type_slug: &str,
        _start: &str,
        _end: &str,
    ) -> BoxFuture<'_, SlotMap, CalComError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("slots:{event_type_slug}"));
        let delay = self.delays.get(event_type_slug).copied();
        let result = if self.failing_slug.as_deref() == Some(event_type_slug) {
            Err(CalComError::Timeout)
        } else {
            Ok(self.slots.get(event_type_slug).cloned().unwrap_or_default())
        };
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }

    fn create_booking(&self, submission: &BookingSubmission) -> BoxFuture<'_, Value, CalComError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("booking:{}", submission.event_type_slug));
        self.bookings.lock().unwrap().push(submission.clone());
        let result = if self.fail_booking {
            Err(CalComError::ApiError {
                status: 400,
                body: Some(json!({"status": "error", "error": {"message": "slot unavailable"}})),
            })
        } else {
            Ok(json!({
                "status": "success",
                "data": {
                    "id": 42,
                    "title": "30min between Alice and Ada",
                    "start": submission.start,
                    "meetingUrl": "https://app.cal.com/video/abc"
                }
            }))
        };
        Box::pin(async move { result })
    }
}

/// Configuration pointing the Cal.com client at `base_url`.
pub fn test_config(base_url: &str, use_x402: bool) -> calrelay_config::AppConfig {
    calrelay_config::AppConfig {
        server: calrelay_config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: None,
        },
        cal: calrelay_config::CalConfig {
            base_url: base_url.to_string(),
            api_key: "cal_test_key".to_string(),
            default_language: "en".to_string(),
            default_time_zone: "America/New_York".to_string(),
            request_timeout_secs: 5,
            max_concurrent_fetches: 4,
        },
        use_x402,
        x402: use_x402.then(|| calrelay_config::X402Config {
            facilitator_url: "http://127.0.0.1:1/facilitator".to_string(),
            pay_to: "0x209693Bc6afc0C5328bA36FaF03C514EF312287C".to_string(),
            network: "base-sepolia".to_string(),
            asset: None,
            max_timeout_seconds: 60,
            routes: vec![],
        }),
    }
}
