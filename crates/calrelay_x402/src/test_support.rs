//! Fakes shared by the unit tests of this crate.

use crate::error::X402Error;
use crate::facilitator::Facilitator;
use crate::types::{PaymentPayload, PaymentRequirements, SettleResponse, VerifyResponse};
use calrelay_common::BoxFuture;
use calrelay_config::{AppConfig, CalConfig, PricedRoute, ServerConfig, X402Config};
use serde_json::json;
use std::sync::Mutex;

pub const PAY_TO: &str = "0x209693Bc6afc0C5328bA36FaF03C514EF312287C";
pub const BASE_SEPOLIA_USDC: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

pub fn x402_config(routes: &[(&str, &str)]) -> X402Config {
    X402Config {
        facilitator_url: "http://127.0.0.1:1".to_string(),
        pay_to: PAY_TO.to_string(),
        network: "base-sepolia".to_string(),
        asset: None,
        max_timeout_seconds: 60,
        routes: routes
            .iter()
            .map(|(path, price)| PricedRoute {
                path: path.to_string(),
                price: price.to_string(),
                description: Some(format!("Pay for {path}")),
            })
            .collect(),
    }
}

pub fn app_config(use_x402: bool, routes: &[(&str, &str)]) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: None,
        },
        cal: CalConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: "unused".to_string(),
            default_language: "en".to_string(),
            default_time_zone: "UTC".to_string(),
            request_timeout_secs: 5,
            max_concurrent_fetches: 4,
        },
        use_x402,
        x402: Some(x402_config(routes)),
    }
}

/// A base64 `X-PAYMENT` value for `network`.
pub fn payment_header(network: &str) -> String {
    PaymentPayload {
        x402_version: 1,
        scheme: "exact".to_string(),
        network: network.to_string(),
        payload: json!({
            "signature": "0xdeadbeef",
            "authorization": {"from": "0xpayer", "to": PAY_TO, "value": "1000"}
        }),
    }
    .to_header()
    .unwrap()
}

#[derive(Clone, Copy, PartialEq, Default)]
pub enum Outcome {
    #[default]
    Accept,
    Reject,
    Unreachable,
}

#[derive(Default)]
pub struct FakeFacilitator {
    pub verify: Outcome,
    pub settle: Outcome,
    pub verified: Mutex<Vec<PaymentRequirements>>,
    pub settled: Mutex<Vec<PaymentRequirements>>,
}

impl FakeFacilitator {
    pub fn verify_calls(&self) -> usize {
        self.verified.lock().unwrap().len()
    }

    pub fn settle_calls(&self) -> usize {
        self.settled.lock().unwrap().len()
    }
}

fn unreachable_error() -> X402Error {
    X402Error::FacilitatorError {
        status: 503,
        body: None,
    }
}

impl Facilitator for FakeFacilitator {
    fn verify(
        &self,
        _payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> BoxFuture<'_, VerifyResponse, X402Error> {
        self.verified.lock().unwrap().push(requirements.clone());
        let result = match self.verify {
            Outcome::Accept => Ok(VerifyResponse {
                is_valid: true,
                invalid_reason: None,
                payer: Some("0xpayer".to_string()),
            }),
            Outcome::Reject => Ok(VerifyResponse {
                is_valid: false,
                invalid_reason: Some("insufficient_funds".to_string()),
                payer: Some("0xpayer".to_string()),
            }),
            Outcome::Unreachable => Err(unreachable_error()),
        };
        Box::pin(async move { result })
    }

    fn settle(
        &self,
        _payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> BoxFuture<'_, SettleResponse, X402Error> {
        self.settled.lock().unwrap().push(requirements.clone());
        let result = match self.settle {
            Outcome::Accept => Ok(SettleResponse {
                success: true,
                error_reason: None,
                transaction: "0xtx".to_string(),
                network: requirements.network.clone(),
                payer: Some("0xpayer".to_string()),
            }),
            Outcome::Reject => Ok(SettleResponse {
                success: false,
                error_reason: Some("invalid_transaction_state".to_string()),
                transaction: String::new(),
                network: requirements.network.clone(),
                payer: None,
            }),
            Outcome::Unreachable => Err(unreachable_error()),
        };
        Box::pin(async move { result })
    }
}
