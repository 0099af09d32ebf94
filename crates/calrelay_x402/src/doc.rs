// --- File: crates/calrelay_x402/src/doc.rs ---

// Only compile this module if the 'openapi' feature is enabled
#![cfg(feature = "openapi")]

use utoipa::OpenApi;

use crate::types::{PaymentRequiredResponse, PaymentRequirements};

// The gate adds no paths of its own; it contributes the 402 body schema to
// the documented paid routes.
#[derive(OpenApi)]
#[openapi(
    components(schemas(PaymentRequiredResponse, PaymentRequirements)),
    tags(
        (name = "x402", description = "HTTP 402 payments: send X-PAYMENT, receive X-PAYMENT-RESPONSE")
    )
)]
pub struct X402ApiDoc;
