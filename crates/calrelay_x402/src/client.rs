// --- File: crates/calrelay_x402/src/client.rs ---
//! Client side of x402: retries a request once with a payment when the
//! server answers 402.

use calrelay_common::BoxFuture;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::X402Error;
use crate::types::{
    PaymentPayload, PaymentRequiredResponse, PaymentRequirements, SettleResponse, PAYMENT_HEADER,
    PAYMENT_RESPONSE_HEADER,
};

/// Produces `X-PAYMENT` header values.
///
/// Returns `None` for requirements the signer will not pay, so the client can
/// try the next offer.
pub trait PaymentSigner: Send + Sync {
    fn sign(&self, requirements: &PaymentRequirements) -> BoxFuture<'_, Option<String>, X402Error>;
}

/// Signer replaying a payment header signed elsewhere, e.g. by a wallet.
///
/// Only offers on the header's scheme and network are paid.
pub struct PresignedSigner {
    header: String,
    payment: PaymentPayload,
}

impl PresignedSigner {
    pub fn new(header: impl Into<String>) -> Result<Self, X402Error> {
        let header = header.into();
        let payment = PaymentPayload::from_header(&header)?;
        Ok(Self { header, payment })
    }

    /// Reads the header from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self, X402Error> {
        let header = std::env::var(var)
            .map_err(|_| X402Error::InvalidPaymentHeader(format!("{var} is not set")))?;
        Self::new(header)
    }
}

impl PaymentSigner for PresignedSigner {
    fn sign(&self, requirements: &PaymentRequirements) -> BoxFuture<'_, Option<String>, X402Error> {
        let accepted = self.payment.scheme == requirements.scheme
            && self.payment.network == requirements.network;
        if !accepted {
            warn!(
                "Pre-signed payment is for {} on {}, server wants {} on {}",
                self.payment.scheme, self.payment.network, requirements.scheme, requirements.network
            );
        }
        let header = accepted.then(|| self.header.clone());
        Box::pin(async move { Ok(header) })
    }
}

/// Final response of a possibly paid request.
#[derive(Debug, Clone, PartialEq)]
pub struct PaidResponse {
    pub status: StatusCode,
    /// JSON body, or the raw text as a JSON string when it is not JSON.
    pub body: Value,
    /// Decoded `X-PAYMENT-RESPONSE`, present when the server settled a payment.
    pub settlement: Option<SettleResponse>,
}

/// HTTP client that pays for 402 responses using a [`PaymentSigner`].
#[derive(Clone)]
pub struct PayingClient {
    http: Client,
    signer: Arc<dyn PaymentSigner>,
}

impl PayingClient {
    pub fn new(http: Client, signer: Arc<dyn PaymentSigner>) -> Self {
        Self { http, signer }
    }

    /// POSTs `body` as JSON to `url`. On a 402 the first offer the signer
    /// accepts is paid and the request is retried exactly once.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<PaidResponse, X402Error> {
        self.send_paying(|| self.http.post(url).json(body)).await
    }

    async fn send_paying<F>(&self, build: F) -> Result<PaidResponse, X402Error>
    where
        F: Fn() -> RequestBuilder,
    {
        let response = build().send().await?;
        if response.status() != StatusCode::PAYMENT_REQUIRED {
            return read_response(response).await;
        }

        let required: PaymentRequiredResponse = response.json().await?;
        info!(
            "💰 Server requires payment ({}), {} option(s) offered",
            required.error,
            required.accepts.len()
        );

        let mut header = None;
        for requirements in &required.accepts {
            if let Some(signed) = self.signer.sign(requirements).await? {
                info!(
                    "Paying {} of {} on {} to {}",
                    requirements.max_amount_required,
                    requirements.asset,
                    requirements.network,
                    requirements.pay_to
                );
                header = Some(signed);
                break;
            }
        }
        let header = header.ok_or(X402Error::NoAcceptablePayment)?;

        let response = build().header(PAYMENT_HEADER, header).send().await?;
        read_response(response).await
    }
}

async fn read_response(response: Response) -> Result<PaidResponse, X402Error> {
    let status = response.status();
    let settlement = match response
        .headers()
        .get(PAYMENT_RESPONSE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(raw) => match SettleResponse::from_header(raw) {
            Ok(settlement) => Some(settlement),
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", PAYMENT_RESPONSE_HEADER, e);
                None
            }
        },
        None => None,
    };

    let bytes = response.bytes().await?;
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    Ok(PaidResponse {
        status,
        body,
        settlement,
    })
}
