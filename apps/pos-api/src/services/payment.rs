//! # Payment Notifications
//!
//! Handles the gateway's asynchronous status callbacks.
//!
//! ## Reconciliation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  notification                                                           │
//! │      │                                                                  │
//! │      ├── server key set? ── verify SHA512 signature ── bad ──► 401     │
//! │      │                                                                  │
//! │      ├── unknown order_id ─────────────────────────────────► 404       │
//! │      │                                                                  │
//! │      ├── stored payment terminal? ── yes ──► acknowledged, ignored     │
//! │      │                                                                  │
//! │      └── map transaction_status ──► UPDATE ... WHERE payment='pending' │
//! │                                     (cancelled orders stay cancelled) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use resto_core::gateway::map_gateway_status;
use resto_core::lifecycle::accepts_notification;
use resto_core::{CoreError, OrderStatus, PaymentStatus};
use resto_db::Database;
use resto_payment::{signature, PaymentGateway};

use crate::error::ServiceResult;

/// Body of a gateway notification.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub signature_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationOutcome {
    pub order_id: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    /// False when the stored payment was already terminal.
    pub applied: bool,
}

pub async fn handle_notification(
    db: &Database,
    gateway: &dyn PaymentGateway,
    notification: Notification,
) -> ServiceResult<NotificationOutcome> {
    if let Some(key) = gateway.server_key().filter(|k| !k.is_empty()) {
        signature::verify(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
            key,
            notification.signature_key.as_deref(),
        )
        .inspect_err(|_| warn!(order_id = %notification.order_id, "Notification signature mismatch"))?;
    }

    let tx = db
        .transactions()
        .get_header(&notification.order_id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(notification.order_id.clone()))?;

    if !accepts_notification(tx.payment_status) {
        info!(
            order_id = %tx.id,
            stored = %tx.payment_status.as_str(),
            received = %notification.transaction_status,
            "Ignoring notification for settled payment"
        );
        return Ok(NotificationOutcome {
            order_id: tx.id,
            payment_status: tx.payment_status,
            order_status: tx.order_status,
            applied: false,
        });
    }

    let (payment_status, order_status) = map_gateway_status(&notification.transaction_status);
    let applied = db
        .transactions()
        .apply_gateway_status(&tx.id, payment_status, order_status)
        .await?;

    // Re-read: a concurrent notification may have won, and a cancelled
    // order keeps its status whatever the gateway says.
    let current = db
        .transactions()
        .get_header(&tx.id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(tx.id.clone()))?;

    if applied {
        info!(
            order_id = %tx.id,
            transaction_status = %notification.transaction_status,
            payment_type = ?notification.payment_type,
            gateway_transaction_id = ?notification.transaction_id,
            payment = %current.payment_status.as_str(),
            order = %current.order_status.as_str(),
            "Payment notification applied"
        );
        if current.order_status == OrderStatus::Cancelled && current.payment_status == PaymentStatus::Paid {
            warn!(order_id = %tx.id, "Payment captured for a cancelled order, refund needed");
        }
    }

    Ok(NotificationOutcome {
        order_id: current.id,
        payment_status: current.payment_status,
        order_status: current.order_status,
        applied,
    })
}
