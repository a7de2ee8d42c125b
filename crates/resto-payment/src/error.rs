//! # Gateway Errors
//!
//! Everything that can go wrong between us and the payment gateway.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// No server key configured; non-cash checkout is unavailable.
    #[error("Payment gateway is not configured")]
    NotConfigured,

    #[error("Payment gateway timed out after {0} seconds")]
    Timeout(u64),

    /// Connection-level failure that survived the retry budget.
    #[error("Payment gateway unreachable: {0}")]
    Transport(String),

    /// The gateway answered with a non-2xx status.
    #[error("Payment gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid response from payment gateway: {0}")]
    InvalidResponse(String),

    #[error("Invalid notification signature")]
    InvalidSignature,
}

impl GatewayError {
    /// Whether the failure is worth another attempt.
    ///
    /// Only connection-level errors qualify. Anything the gateway actually
    /// answered, or a timeout, is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Transport(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // Seconds are filled in by the client, which knows its budget.
            GatewayError::Timeout(0)
        } else if err.is_connect() || err.is_request() {
            GatewayError::Transport(err.to_string())
        } else if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
