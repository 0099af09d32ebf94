// File: crates/calrelay_x402/src/bin/calrelay_pay.rs
//! Books a meeting through the paid endpoint, paying with a pre-signed
//! `X-PAYMENT` header taken from `X402_PAYMENT`.
//!
//! Target URL and booking fields come from the environment:
//! `CALRELAY_PAY_URL`, `ATTENDEE_NAME`, `ATTENDEE_EMAIL`, `START_TIME`,
//! `CAL_USERNAME`, `EVENT_TYPE_SLUG`.

use calrelay_common::{create_client, logging};
use calrelay_config::ensure_dotenv_loaded;
use calrelay_x402::client::{PayingClient, PresignedSigner};
use serde_json::json;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_URL: &str = "http://localhost:3000/book-meeting-x402";

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    ensure_dotenv_loaded();
    logging::init();

    let signer = match PresignedSigner::from_env("X402_PAYMENT") {
        Ok(signer) => signer,
        Err(e) => {
            error!("🚨 Cannot pay: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let http = match create_client(60, true) {
        Ok(http) => http,
        Err(e) => {
            error!("🚨 Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let client = PayingClient::new(http, Arc::new(signer));

    let url = var_or("CALRELAY_PAY_URL", DEFAULT_URL);
    let booking = json!({
        "attendeeName": var_or("ATTENDEE_NAME", "Ada Lovelace"),
        "attendeeEmail": var_or("ATTENDEE_EMAIL", "ada@example.com"),
        "startTime": var_or("START_TIME", "2025-06-12T05:00:00.000Z"),
        "username": var_or("CAL_USERNAME", "alice"),
        "eventTypeSlug": var_or("EVENT_TYPE_SLUG", "30min"),
    });
    info!("Posting booking to {}", url);

    match client.post_json(&url, &booking).await {
        Ok(paid) => {
            println!("{}", paid.body);
            match &paid.settlement {
                Some(settlement) => println!(
                    "Paid: transaction {} on {}",
                    settlement.transaction, settlement.network
                ),
                None => println!("No payment was settled"),
            }
            if paid.status.is_success() {
                ExitCode::SUCCESS
            } else {
                error!("🚨 Server answered {}", paid.status);
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("🚨 Request failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
