//! # Mock Gateway
//!
//! In-process [`PaymentGateway`] for tests and local runs without a
//! Midtrans account. Records every request and can be told to fail.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{GatewayError, GatewayResult};
use crate::snap::{SnapRequest, SnapToken};
use crate::PaymentGateway;

/// How the mock should fail its next calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Timeout,
    Unreachable,
    /// HTTP 400 with an error body.
    Rejected,
}

impl MockFailure {
    fn to_error(self) -> GatewayError {
        match self {
            MockFailure::Timeout => GatewayError::Timeout(10),
            MockFailure::Unreachable => GatewayError::Transport("connection refused".to_string()),
            MockFailure::Rejected => GatewayError::Rejected {
                status: 400,
                body: r#"{"error_messages":["transaction_details.gross_amount is not equal to the sum of item_details"]}"#
                    .to_string(),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct MockGateway {
    server_key: Option<String>,
    failure: Mutex<Option<MockFailure>>,
    requests: Mutex<Vec<SnapRequest>>,
    issued: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that reports `key` as its server key, enabling signature checks.
    pub fn with_server_key(key: impl Into<String>) -> Self {
        MockGateway {
            server_key: Some(key.into()),
            ..Default::default()
        }
    }

    /// Makes every following call fail until [`MockGateway::succeed`].
    pub async fn fail_with(&self, failure: MockFailure) {
        *self.failure.lock().await = Some(failure);
    }

    pub async fn succeed(&self) {
        *self.failure.lock().await = None;
    }

    /// Every request received so far, failed ones included.
    pub async fn requests(&self) -> Vec<SnapRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_transaction(&self, request: &SnapRequest) -> GatewayResult<SnapToken> {
        self.requests.lock().await.push(request.clone());

        if let Some(failure) = *self.failure.lock().await {
            return Err(failure.to_error());
        }

        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let token = format!("mock-token-{n}");
        Ok(SnapToken {
            redirect_url: format!("https://mock.gateway/snap/v2/vtweb/{token}"),
            token,
        })
    }

    fn server_key(&self) -> Option<&str> {
        self.server_key.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap::{CustomerDetails, TransactionDetails};

    fn request(order_id: &str) -> SnapRequest {
        SnapRequest {
            transaction_details: TransactionDetails {
                order_id: order_id.into(),
                gross_amount: 1_000,
            },
            item_details: vec![],
            customer_details: CustomerDetails {
                first_name: "Budi".into(),
                email: None,
                phone: "0812".into(),
            },
            expiry: None,
        }
    }

    #[tokio::test]
    async fn test_records_and_fails_on_demand() {
        let gateway = MockGateway::new();
        let first = gateway.create_transaction(&request("a")).await.unwrap();
        assert_eq!(first.token, "mock-token-1");

        gateway.fail_with(MockFailure::Rejected).await;
        let err = gateway.create_transaction(&request("b")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { status: 400, .. }));

        gateway.succeed().await;
        assert_eq!(gateway.create_transaction(&request("c")).await.unwrap().token, "mock-token-2");

        let seen: Vec<String> = gateway
            .requests()
            .await
            .into_iter()
            .map(|r| r.transaction_details.order_id)
            .collect();
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert!(gateway.server_key().is_none());
        assert_eq!(MockGateway::with_server_key("k").server_key(), Some("k"));
    }
}
