// --- File: crates/calrelay_x402/src/types.rs ---
//! x402 v1 wire types.
//!
//! Field names follow the protocol's camelCase JSON. Headers carry these
//! structures as base64-encoded JSON.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::X402Error;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub const X402_VERSION: u8 = 1;

/// Request header carrying the client's signed payment.
pub const PAYMENT_HEADER: &str = "X-PAYMENT";
/// Response header carrying the settlement receipt.
pub const PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

pub const EXACT_SCHEME: &str = "exact";

/// What the server accepts as payment for one resource.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    #[cfg_attr(feature = "openapi", schema(example = "exact"))]
    pub scheme: String,
    #[cfg_attr(feature = "openapi", schema(example = "base-sepolia"))]
    pub network: String,
    /// Price in the asset's atomic units, as a decimal string.
    #[cfg_attr(feature = "openapi", schema(example = "1000"))]
    pub max_amount_required: String,
    pub resource: String,
    pub description: String,
    pub mime_type: String,
    pub pay_to: String,
    pub max_timeout_seconds: u64,
    pub asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub extra: Option<Value>,
}

/// Body of a 402 response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredResponse {
    pub x402_version: u8,
    pub error: String,
    pub accepts: Vec<PaymentRequirements>,
}

/// Decoded `X-PAYMENT` header. The scheme-specific `payload` (signature and
/// authorization for `exact`) is opaque to the server and passed to the
/// facilitator as is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u8,
    pub scheme: String,
    pub network: String,
    pub payload: Value,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FacilitatorRequest<'a> {
    pub x402_version: u8,
    pub payment_payload: &'a PaymentPayload,
    pub payment_requirements: &'a PaymentRequirements,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

/// Settlement receipt, also the content of `X-PAYMENT-RESPONSE`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default)]
    pub transaction: String,
    #[serde(default)]
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

fn encode_header<T: Serialize>(value: &T) -> Result<String, X402Error> {
    let json = serde_json::to_vec(value).map_err(|e| X402Error::Encoding(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

fn decode_header<T: DeserializeOwned>(raw: &str) -> Result<T, X402Error> {
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|e| X402Error::InvalidPaymentHeader(format!("not base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| X402Error::InvalidPaymentHeader(format!("not a payment object: {e}")))
}

impl PaymentPayload {
    pub fn from_header(raw: &str) -> Result<Self, X402Error> {
        decode_header(raw)
    }

    pub fn to_header(&self) -> Result<String, X402Error> {
        encode_header(self)
    }
}

impl SettleResponse {
    pub fn from_header(raw: &str) -> Result<Self, X402Error> {
        decode_header(raw)
    }

    pub fn to_header(&self) -> Result<String, X402Error> {
        encode_header(self)
    }
}
