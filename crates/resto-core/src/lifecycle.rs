//! # Transaction Lifecycle
//!
//! The order/payment state machine and who may drive it.
//!
//! ## Order Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──kasir──► cooking ──koki──► ready ──kasir──► completed       │
//! │      │                  │                │   (paid only,                │
//! │      │                  │                │    records closer)           │
//! │      └───────kasir──────┴──────kasir─────┴──────────► cancelled         │
//! │                                                                         │
//! │   admin acts as kasir.  completed / cancelled are terminal.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here decides; none of them persist. The database layer
//! applies the decision with a conditional update on the observed status.

use crate::error::{CoreError, CoreResult};
use crate::types::{OrderStatus, PaymentStatus, Role, Transaction};

// =============================================================================
// Transition Planning
// =============================================================================

/// An approved order-status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Whether the acting user becomes `closed_by_user_id`.
    pub record_closer: bool,
}

/// Admin has no transitions of its own; it is treated as a cashier.
#[inline]
pub const fn effective_role(role: Role) -> Role {
    match role {
        Role::Admin => Role::Kasir,
        other => other,
    }
}

/// Decides whether `role` may move `tx` to `requested`.
///
/// ## Errors
/// - [`CoreError::InvalidStatusTransition`] for any triple outside the table
/// - [`CoreError::PaymentNotSettled`] for `ready → completed` while unpaid
///
/// ## Example
/// ```rust,ignore
/// let plan = plan_transition(Role::Koki, &tx, OrderStatus::Ready)?;
/// assert!(!plan.record_closer);
/// ```
pub fn plan_transition(role: Role, tx: &Transaction, requested: OrderStatus) -> CoreResult<TransitionPlan> {
    decide(role, tx.order_status, tx.payment_status, requested, &tx.id)
}

/// Same as [`plan_transition`] with the relevant state passed explicitly.
pub fn decide(
    role: Role,
    current: OrderStatus,
    payment: PaymentStatus,
    requested: OrderStatus,
    transaction_id: &str,
) -> CoreResult<TransitionPlan> {
    use OrderStatus::*;

    let invalid = || CoreError::InvalidStatusTransition {
        role: role.as_str().to_string(),
        from: current,
        to: requested,
    };

    let record_closer = match (effective_role(role), current, requested) {
        (Role::Kasir, Pending, Cooking) => false,
        (Role::Koki, Cooking, Ready) => false,
        (Role::Kasir, Ready, Completed) => {
            if payment != PaymentStatus::Paid {
                return Err(CoreError::PaymentNotSettled {
                    transaction_id: transaction_id.to_string(),
                    payment_status: payment,
                });
            }
            true
        }
        (Role::Kasir, Pending | Cooking | Ready, Cancelled) => false,
        _ => return Err(invalid()),
    };

    Ok(TransitionPlan {
        from: current,
        to: requested,
        record_closer,
    })
}

/// Plans a cancellation. Only cashiers and admins may cancel.
pub fn plan_cancel(role: Role, tx: &Transaction) -> CoreResult<TransitionPlan> {
    if effective_role(role) != Role::Kasir {
        return Err(CoreError::InvalidStatusTransition {
            role: role.as_str().to_string(),
            from: tx.order_status,
            to: OrderStatus::Cancelled,
        });
    }
    plan_transition(Role::Kasir, tx, OrderStatus::Cancelled)
}

// =============================================================================
// Payment Rules
// =============================================================================

/// Checks that a cashier may mark `tx` as paid in cash.
///
/// ## Preconditions
/// 1. payment method is cash
/// 2. payment status is still pending
/// 3. the order has not been cancelled
pub fn check_cash_confirmation(tx: &Transaction) -> CoreResult<()> {
    if !tx.payment_method.is_cash() {
        return Err(CoreError::NotCashPayment);
    }
    if tx.payment_status != PaymentStatus::Pending {
        return Err(CoreError::PaymentNotPending(tx.payment_status));
    }
    if tx.order_status == OrderStatus::Cancelled {
        return Err(CoreError::OrderCancelled(tx.id.clone()));
    }
    Ok(())
}

/// Whether a gateway notification may still overwrite the stored state.
///
/// Once payment is terminal, later notifications (replays or out-of-order
/// deliveries) are ignored.
#[inline]
pub const fn accepts_notification(current: PaymentStatus) -> bool {
    !current.is_terminal()
}

// =============================================================================
// Unit Tests
// =============================================================================
