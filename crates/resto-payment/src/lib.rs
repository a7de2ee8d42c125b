//! # resto-payment: Payment Gateway Client for Resto POS
//!
//! Talks to Midtrans Snap on behalf of the checkout flow and verifies the
//! signature of inbound payment notifications.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Non-cash Checkout                                 │
//! │                                                                         │
//! │  pos-api checkout service                                              │
//! │     │  resto_core::gateway::build_charge() ──► ChargeRequest           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                resto-payment (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   dyn PaymentGateway                                            │   │
//! │  │     ├── SnapClient   reqwest + backoff, production             │   │
//! │  │     └── MockGateway  records requests, tests                   │   │
//! │  │                                                                 │   │
//! │  │   signature::verify()   webhook SHA-512 check                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Midtrans Snap API ──► SnapToken { token, redirect_url }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod mock;
pub mod signature;
pub mod snap;

pub use error::{GatewayError, GatewayResult};
pub use mock::{MockFailure, MockGateway};
pub use snap::{SnapClient, SnapConfig, SnapRequest, SnapToken};

use async_trait::async_trait;

/// The seam between checkout and the payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests a payment token for an order.
    async fn create_transaction(&self, request: &SnapRequest) -> GatewayResult<SnapToken>;

    /// Key used to sign notifications, if one is configured.
    fn server_key(&self) -> Option<&str>;
}
