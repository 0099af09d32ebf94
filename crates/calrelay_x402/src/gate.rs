// --- File: crates/calrelay_x402/src/gate.rs ---

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use calrelay_config::X402Config;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::X402Error;
use crate::facilitator::Facilitator;
use crate::price::{usd_to_atomic, usdc_asset};
use crate::types::{
    PaymentPayload, PaymentRequiredResponse, PaymentRequirements, EXACT_SCHEME, PAYMENT_HEADER,
    PAYMENT_RESPONSE_HEADER, X402_VERSION,
};

const MIME_TYPE: &str = "application/json";
// Header names inserted into a HeaderMap must be lowercase.
const PAYMENT_RESPONSE_HEADER_NAME: HeaderName = HeaderName::from_static("x-payment-response");

/// Price and description of one gated path.
#[derive(Clone, Debug, PartialEq)]
pub struct PaidResource {
    pub max_amount_required: String,
    pub description: String,
}

// The state that the payment middleware has access to: the route→price table
// and the facilitator that verifies and settles payments.
#[derive(Clone)]
pub struct X402GateState {
    routes: HashMap<String, PaidResource>,
    network: String,
    pay_to: String,
    asset: String,
    max_timeout_seconds: u64,
    facilitator: Arc<dyn Facilitator>,
}

impl X402GateState {
    /// Builds the gate from config. Fails on an unparseable price or when no
    /// asset is configured for an unknown network.
    pub fn from_config(
        config: &X402Config,
        facilitator: Arc<dyn Facilitator>,
    ) -> Result<Self, X402Error> {
        let asset = match &config.asset {
            Some(asset) => asset.clone(),
            None => usdc_asset(&config.network)
                .ok_or_else(|| X402Error::UnknownAsset(config.network.clone()))?
                .to_string(),
        };

        let mut routes = HashMap::new();
        for route in &config.routes {
            let amount = usd_to_atomic(&route.price)?;
            let description = route
                .description
                .clone()
                .unwrap_or_else(|| format!("Access to {}", route.path));
            routes.insert(
                route.path.clone(),
                PaidResource {
                    max_amount_required: amount.to_string(),
                    description,
                },
            );
        }
        if routes.is_empty() {
            warn!("x402 gate is enabled but no routes are priced");
        }

        Ok(Self {
            routes,
            network: config.network.clone(),
            pay_to: config.pay_to.clone(),
            asset,
            max_timeout_seconds: config.max_timeout_seconds,
            facilitator,
        })
    }

    /// Fails when `path` would be served without a charge.
    pub fn ensure_priced(&self, path: &str) -> Result<(), X402Error> {
        if self.routes.contains_key(path) {
            Ok(())
        } else {
            Err(X402Error::UnpricedRoute(path.to_string()))
        }
    }

    pub fn priced_paths(&self) -> impl Iterator<Item = (&str, &PaidResource)> {
        self.routes.iter().map(|(path, paid)| (path.as_str(), paid))
    }

    /// Payment requirements for `path`, or `None` when the path is free.
    pub fn requirements_for(&self, path: &str, resource: String) -> Option<PaymentRequirements> {
        let paid = self.routes.get(path)?;
        Some(PaymentRequirements {
            scheme: EXACT_SCHEME.to_string(),
            network: self.network.clone(),
            max_amount_required: paid.max_amount_required.clone(),
            resource,
            description: paid.description.clone(),
            mime_type: MIME_TYPE.to_string(),
            pay_to: self.pay_to.clone(),
            max_timeout_seconds: self.max_timeout_seconds,
            asset: self.asset.clone(),
            // EIP-712 domain of the USDC contract, needed by signers
            extra: Some(json!({"name": "USDC", "version": "2"})),
        })
    }
}

/// Absolute URL of the requested resource, from the Host header.
fn resource_url(headers: &HeaderMap, path: &str) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}{path}")
}

fn payment_required(requirements: PaymentRequirements, error: impl Into<String>) -> Response {
    let body = PaymentRequiredResponse {
        x402_version: X402_VERSION,
        error: error.into(),
        accepts: vec![requirements],
    };
    (StatusCode::PAYMENT_REQUIRED, Json(body)).into_response()
}

fn check_matches(
    payment: &PaymentPayload,
    requirements: &PaymentRequirements,
) -> Result<(), X402Error> {
    if payment.x402_version != X402_VERSION {
        return Err(X402Error::PaymentMismatch(format!(
            "unsupported x402Version {}",
            payment.x402_version
        )));
    }
    if payment.scheme != requirements.scheme || payment.network != requirements.network {
        return Err(X402Error::PaymentMismatch(format!(
            "expected {} on {}, got {} on {}",
            requirements.scheme, requirements.network, payment.scheme, payment.network
        )));
    }
    Ok(())
}

/// Axum middleware charging for the priced paths of [`X402GateState`].
///
/// Other paths pass straight through. A priced request is only handed to the
/// handler after the facilitator verified its `X-PAYMENT`, and the payment is
/// only settled when the handler succeeded.
pub async fn x402_payment_middleware(
    State(gate): State<Arc<X402GateState>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let resource = resource_url(req.headers(), &path);
    let Some(requirements) = gate.requirements_for(&path, resource) else {
        return next.run(req).await;
    };

    // 1. Decode the payment header
    let raw = match req.headers().get(PAYMENT_HEADER).map(|v| v.to_str()) {
        Some(Ok(raw)) => raw.to_string(),
        Some(Err(_)) => {
            return payment_required(requirements, "X-PAYMENT header is not valid ASCII");
        }
        None => {
            info!("💰 {} requested without payment, answering 402", path);
            return payment_required(requirements, "X-PAYMENT header is required");
        }
    };
    let payment = match PaymentPayload::from_header(&raw)
        .and_then(|payment| check_matches(&payment, &requirements).map(|()| payment))
    {
        Ok(payment) => payment,
        Err(e) => {
            warn!("🚨 Rejected payment for {}: {}", path, e);
            return payment_required(requirements, e.to_string());
        }
    };

    // 2. Verify with the facilitator before doing any work
    match gate.facilitator.verify(&payment, &requirements).await {
        Ok(verified) if verified.is_valid => {
            info!(
                "✅ Payment for {} verified (payer {})",
                path,
                verified.payer.as_deref().unwrap_or("unknown")
            );
        }
        Ok(verified) => {
            let reason = verified
                .invalid_reason
                .unwrap_or_else(|| "payment is not valid".to_string());
            warn!("🚨 Payment for {} failed verification: {}", path, reason);
            return payment_required(requirements, reason);
        }
        Err(e) => {
            error!("🚨 Facilitator verify call failed: {}", e);
            return payment_required(requirements, e.to_string());
        }
    }

    // 3. Run the handler; failed requests are not charged
    let mut response = next.run(req).await;
    if !response.status().is_success() {
        info!(
            "Handler for {} answered {}, payment not settled",
            path,
            response.status()
        );
        return response;
    }

    // 4. Settle and attach the receipt
    let settled = match gate.facilitator.settle(&payment, &requirements).await {
        Ok(settled) if settled.success => settled,
        Ok(settled) => {
            let reason = settled
                .error_reason
                .unwrap_or_else(|| "settlement failed".to_string());
            error!("🚨 Settlement for {} failed: {}", path, reason);
            return payment_required(requirements, reason);
        }
        Err(e) => {
            error!("🚨 Facilitator settle call failed: {}", e);
            return payment_required(requirements, e.to_string());
        }
    };
    info!(
        "💰 Settled payment for {} in transaction {}",
        path, settled.transaction
    );

    match settled.to_header().map(|h| HeaderValue::from_str(&h)) {
        Ok(Ok(value)) => {
            response
                .headers_mut()
                .insert(PAYMENT_RESPONSE_HEADER_NAME, value);
        }
        Ok(Err(e)) => error!("Could not build {} header: {}", PAYMENT_RESPONSE_HEADER, e),
        Err(e) => error!("Could not encode settlement receipt: {}", e),
    }
    response
}
