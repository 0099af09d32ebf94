// --- File: crates/calrelay_x402/src/error.rs ---
use calrelay_common::RelayError;
use serde_json::Value;
use thiserror::Error;

const SERVICE_NAME: &str = "x402 facilitator";

/// Errors of the payment gate, the facilitator client and the paying client.
#[derive(Error, Debug)]
pub enum X402Error {
    #[error("Invalid X-PAYMENT header: {0}")]
    InvalidPaymentHeader(String),

    #[error("Payment does not match requirements: {0}")]
    PaymentMismatch(String),

    #[error("Invalid price '{0}'")]
    InvalidPrice(String),

    #[error("No known USDC asset for network '{0}', set x402.asset")]
    UnknownAsset(String),

    #[error("Paid route '{0}' has no price in x402.routes")]
    UnpricedRoute(String),

    #[error("Facilitator request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Facilitator returned status {status}")]
    FacilitatorError { status: u16, body: Option<Value> },

    #[error("Server offered no payment option the signer accepts")]
    NoAcceptablePayment,

    #[error("Could not encode payment data: {0}")]
    Encoding(String),
}

impl From<X402Error> for RelayError {
    fn from(err: X402Error) -> Self {
        match err {
            X402Error::InvalidPrice(_)
            | X402Error::UnknownAsset(_)
            | X402Error::UnpricedRoute(_) => {
                RelayError::ConfigError(err.to_string())
            }
            X402Error::RequestError(_) => RelayError::UpstreamError {
                service_name: SERVICE_NAME.to_string(),
                message: err.to_string(),
                details: None,
            },
            X402Error::FacilitatorError { ref body, .. } => RelayError::UpstreamError {
                service_name: SERVICE_NAME.to_string(),
                message: err.to_string(),
                details: body.clone(),
            },
            X402Error::Encoding(_) => RelayError::InternalError(err.to_string()),
            _ => RelayError::PaymentRequired(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calrelay_common::HttpStatusCode;

    #[test]
    fn test_relay_status_codes() {
        let cases = [
            (X402Error::InvalidPaymentHeader("x".into()), 402),
            (X402Error::PaymentMismatch("x".into()), 402),
            (X402Error::UnpricedRoute("/paid".into()), 500),
            (X402Error::InvalidPrice("one dollar".into()), 500),
            (
                X402Error::FacilitatorError {
                    status: 503,
                    body: None,
                },
                500,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(RelayError::from(err).status_code(), status);
        }
    }
}
