//! # Snap Client
//!
//! HTTP client for the Midtrans Snap API.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_transaction()                               │
//! │                                                                         │
//! │   server key? ──no──► NotConfigured                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   POST {base_url}/snap/v1/transactions   (basic auth "server_key:")    │
//! │       │                                                                 │
//! │       ├── 2xx + token ─────────────► SnapToken                         │
//! │       ├── non-2xx ─────────────────► Rejected { status, body }         │
//! │       ├── per-request timeout ─────► Timeout                           │
//! │       └── connect error ──► backoff ──► retry ... until max elapsed    │
//! │                                          └──► Transport                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::PaymentGateway;
use resto_core::gateway::ChargeRequest;

/// Midtrans sandbox host.
pub const SANDBOX_BASE_URL: &str = "https://app.sandbox.midtrans.com";

/// Longest item name the gateway accepts.
const MAX_ITEM_NAME_CHARS: usize = 50;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct SnapConfig {
    pub base_url: String,
    /// `None` leaves the client unconfigured.
    pub server_key: Option<String>,
    /// Budget for a single HTTP attempt.
    pub timeout: Duration,
    /// Total time spent retrying connection errors.
    pub max_retry_elapsed: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for SnapConfig {
    fn default() -> Self {
        SnapConfig {
            base_url: SANDBOX_BASE_URL.to_string(),
            server_key: None,
            timeout: Duration::from_secs(10),
            max_retry_elapsed: Duration::from_secs(15),
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: String,
    pub price: i64,
    pub quantity: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiry {
    pub unit: String,
    pub duration: i64,
}

/// Body of `POST /snap/v1/transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapRequest {
    pub transaction_details: TransactionDetails,
    pub item_details: Vec<ItemDetail>,
    pub customer_details: CustomerDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Expiry>,
}

impl From<&ChargeRequest> for SnapRequest {
    fn from(charge: &ChargeRequest) -> Self {
        SnapRequest {
            transaction_details: TransactionDetails {
                order_id: charge.order_id.clone(),
                gross_amount: charge.gross_amount,
            },
            item_details: charge
                .lines
                .iter()
                .map(|line| ItemDetail {
                    id: line.id.clone(),
                    price: line.price,
                    quantity: line.quantity,
                    name: line.name.chars().take(MAX_ITEM_NAME_CHARS).collect(),
                })
                .collect(),
            customer_details: CustomerDetails {
                first_name: charge.customer.name.clone(),
                email: charge.customer.email.clone(),
                phone: charge.customer.phone.clone(),
            },
            expiry: (charge.expiry_minutes > 0).then(|| Expiry {
                unit: "minutes".to_string(),
                duration: charge.expiry_minutes,
            }),
        }
    }
}

/// Successful Snap response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapToken {
    pub token: String,
    pub redirect_url: String,
}

// =============================================================================
// Client
// =============================================================================

/// Midtrans Snap client.
#[derive(Debug, Clone)]
pub struct SnapClient {
    http: reqwest::Client,
    config: SnapConfig,
}

impl SnapClient {
    pub fn new(config: SnapConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(SnapClient { http, config })
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/snap/v1/transactions", self.config.base_url.trim_end_matches('/'))
    }

    /// Creates the exponential backoff for connection retries.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_interval: self.config.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: Some(self.config.max_retry_elapsed),
            ..Default::default()
        }
    }

    /// One HTTP attempt, no retry.
    async fn send_once(&self, server_key: &str, request: &SnapRequest) -> GatewayResult<SnapToken> {
        let response = self
            .http
            .post(self.endpoint())
            .basic_auth(server_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.config.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: SnapToken = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if token.token.is_empty() {
            return Err(GatewayError::InvalidResponse("empty token".to_string()));
        }

        Ok(token)
    }

    fn classify(&self, err: reqwest::Error) -> GatewayError {
        match GatewayError::from(err) {
            GatewayError::Timeout(_) => GatewayError::Timeout(self.config.timeout.as_secs()),
            other => other,
        }
    }
}

#[async_trait]
impl PaymentGateway for SnapClient {
    async fn create_transaction(&self, request: &SnapRequest) -> GatewayResult<SnapToken> {
        let Some(server_key) = self.config.server_key.as_deref() else {
            return Err(GatewayError::NotConfigured);
        };

        let order_id = &request.transaction_details.order_id;
        debug!(%order_id, gross = request.transaction_details.gross_amount, "Requesting Snap token");

        backoff::future::retry(self.create_backoff(), || async move {
            self.send_once(server_key, request).await.map_err(|e| {
                if e.is_transient() {
                    warn!(%order_id, error = %e, "Snap request failed, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
    }

    fn server_key(&self) -> Option<&str> {
        self.config.server_key.as_deref()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use resto_core::gateway::{ChargeCustomer, ChargeLine};

    fn charge() -> ChargeRequest {
        ChargeRequest {
            order_id: "order-1".into(),
            gross_amount: 27_500,
            lines: vec![
                ChargeLine {
                    id: "m1".into(),
                    name: "Nasi Goreng Spesial dengan Telur Mata Sapi dan Kerupuk Udang".into(),
                    price: 10_000,
                    quantity: 2,
                },
                ChargeLine {
                    id: "m2".into(),
                    name: "Es Teh".into(),
                    price: 5_000,
                    quantity: 1,
                },
                ChargeLine {
                    id: "TAX-PPN".into(),
                    name: "PPN 10%".into(),
                    price: 2_500,
                    quantity: 1,
                },
            ],
            customer: ChargeCustomer {
                name: "Budi".into(),
                phone: "08123456789".into(),
                email: None,
            },
            expiry_minutes: 1440,
        }
    }

    #[test]
    fn test_wire_shape() {
        let request = SnapRequest::from(&charge());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["transaction_details"]["gross_amount"], 27_500);
        assert_eq!(json["item_details"].as_array().unwrap().len(), 3);
        assert_eq!(json["item_details"][0]["name"].as_str().unwrap().chars().count(), 50);
        assert_eq!(json["customer_details"]["first_name"], "Budi");
        assert!(json["customer_details"].get("email").is_none());
        assert_eq!(json["expiry"]["unit"], "minutes");
        assert_eq!(json["expiry"]["duration"], 1440);
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let client = SnapClient::new(SnapConfig {
            base_url: "https://example.test/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), "https://example.test/snap/v1/transactions");
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let client = SnapClient::new(SnapConfig::default()).unwrap();
        let err = client.create_transaction(&SnapRequest::from(&charge())).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured));
        assert!(client.server_key().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_gives_up_within_budget() {
        // Port 9 on localhost: nothing listens, connections are refused.
        let client = SnapClient::new(SnapConfig {
            base_url: "http://127.0.0.1:9".into(),
            server_key: Some("key".into()),
            timeout: Duration::from_secs(1),
            max_retry_elapsed: Duration::from_millis(300),
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(100),
        })
        .unwrap();

        let started = std::time::Instant::now();
        let err = client.create_transaction(&SnapRequest::from(&charge())).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_) | GatewayError::Timeout(_)), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
