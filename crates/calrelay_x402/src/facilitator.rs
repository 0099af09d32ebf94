// --- File: crates/calrelay_x402/src/facilitator.rs ---
//! Client for an x402 facilitator, the service that checks payment signatures
//! and submits them on-chain.

use calrelay_common::{create_client, BoxFuture};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::X402Error;
use crate::types::{
    FacilitatorRequest, PaymentPayload, PaymentRequirements, SettleResponse, VerifyResponse,
    X402_VERSION,
};

/// Payment verification and settlement.
pub trait Facilitator: Send + Sync {
    /// Checks that `payment` satisfies `requirements` without moving funds.
    fn verify(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> BoxFuture<'_, VerifyResponse, X402Error>;

    /// Executes a previously verified payment.
    fn settle(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> BoxFuture<'_, SettleResponse, X402Error>;
}

/// [`Facilitator`] over HTTP (`POST {url}/verify`, `POST {url}/settle`).
#[derive(Clone)]
pub struct HttpFacilitator {
    http: Client,
    base_url: String,
}

impl HttpFacilitator {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, X402Error> {
        let http = create_client(timeout_secs, true)?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn body(
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> Result<Value, X402Error> {
        serde_json::to_value(FacilitatorRequest {
            x402_version: X402_VERSION,
            payment_payload: payment,
            payment_requirements: requirements,
        })
        .map_err(|e| X402Error::Encoding(e.to_string()))
    }

    fn post<T: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &'static str,
        body: Result<Value, X402Error>,
    ) -> BoxFuture<'_, T, X402Error> {
        Box::pin(async move {
            let url = format!("{}/{}", self.base_url, endpoint);
            debug!("POST {}", url);
            let response = self.http.post(&url).json(&body?).send().await?;
            read_json(response).await
        })
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, X402Error> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let body = serde_json::from_slice::<Value>(&bytes).ok();
        warn!("Facilitator answered {}: {:?}", status, body);
        return Err(X402Error::FacilitatorError {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| X402Error::FacilitatorError {
        status: status.as_u16(),
        body: Some(Value::String(format!("unreadable body: {e}"))),
    })
}

impl Facilitator for HttpFacilitator {
    fn verify(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> BoxFuture<'_, VerifyResponse, X402Error> {
        self.post("verify", Self::body(payment, requirements))
    }

    fn settle(
        &self,
        payment: &PaymentPayload,
        requirements: &PaymentRequirements,
    ) -> BoxFuture<'_, SettleResponse, X402Error> {
        self.post("settle", Self::body(payment, requirements))
    }
}
