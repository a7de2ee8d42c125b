//! # Error Types
//!
//! Domain-specific error types for resto-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  resto-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  resto-db errors       DbError       - Database operation failures     │
//! │  resto-payment errors  GatewayError  - Payment gateway failures        │
//! │  pos-api errors        ApiError      - What clients see (JSON)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          DbError ───┼──► ApiError → HTTP response      │
//! │                     GatewayError ───┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each variant belongs to one caller-visible category, see
//! [`CoreError::kind`].

use thiserror::Error;

use crate::types::{OrderStatus, PaymentStatus, Role};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Menu does not exist or is marked unavailable.
    #[error("Menu not found or unavailable: {0}")]
    MenuUnavailable(String),

    /// Admin lookup of a menu by id (availability not considered).
    #[error("Menu not found: {0}")]
    MenuNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Category {0} already exists")]
    CategoryExists(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Promo code not found: {0}")]
    PromoNotFound(String),

    #[error("Promo code {0} is not active")]
    PromoInactive(String),

    /// Current time is outside the promo's validity window.
    #[error("Promo code {0} is not valid at this time")]
    PromoExpired(String),

    #[error("Promo code {0} has reached its usage limit")]
    PromoUsageLimitReached(String),

    #[error("Minimum purchase of {min_purchase_cents} cents not met (subtotal {subtotal_cents})")]
    MinPurchaseNotMet {
        min_purchase_cents: i64,
        subtotal_cents: i64,
    },

    /// The (role, current, requested) triple is not an allowed transition.
    ///
    /// ## Allowed Transitions
    /// ```text
    /// kasir:  pending → cooking
    /// koki:   cooking → ready
    /// kasir:  ready   → completed   (payment must be paid)
    /// kasir:  pending|cooking|ready → cancelled
    /// admin:  same as kasir
    /// ```
    #[error("Role {role} cannot move order from {from:?} to {to:?}")]
    InvalidStatusTransition {
        role: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// `ready → completed` requested while payment is still outstanding.
    #[error("Transaction {transaction_id} is {payment_status:?}, it must be paid before completion")]
    PaymentNotSettled {
        transaction_id: String,
        payment_status: PaymentStatus,
    },

    #[error("Only cash transactions can be confirmed by a cashier")]
    NotCashPayment,

    #[error("Payment status is already {0:?}")]
    PaymentNotPending(PaymentStatus),

    #[error("Transaction {0} has been cancelled")]
    OrderCancelled(String),

    #[error("Dine-in orders need a positive table number")]
    TableNumberRequired,

    #[error("Settlement for {user_id} on {date} already exists")]
    SettlementAlreadyExists { date: String, user_id: String },

    #[error("Promo code {0} already exists")]
    PromoCodeExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Email {0} is already registered")]
    EmailAlreadyExists(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Old password is incorrect")]
    InvalidOldPassword,

    #[error("Admin account {0} cannot be deleted")]
    AdminNotDeletable(String),

    /// The user closed orders or recorded settlements; the history keeps them.
    #[error("User {0} has transaction or settlement history")]
    UserHasHistory(String),

    #[error("Role {0} is not allowed to perform this action")]
    RoleNotPermitted(Role),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Caller-visible category of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    PreconditionFailed,
    Unauthorized,
    Forbidden,
}

impl CoreError {
    /// Maps the error onto its category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) | CoreError::TableNumberRequired | CoreError::InvalidOldPassword => {
                ErrorKind::Validation
            }
            CoreError::MenuUnavailable(_)
            | CoreError::MenuNotFound(_)
            | CoreError::CategoryNotFound(_)
            | CoreError::TransactionNotFound(_)
            | CoreError::PromoNotFound(_)
            | CoreError::UserNotFound(_) => ErrorKind::NotFound,
            CoreError::SettlementAlreadyExists { .. }
            | CoreError::PromoCodeExists(_)
            | CoreError::CategoryExists(_)
            | CoreError::EmailAlreadyExists(_)
            | CoreError::UserHasHistory(_) => ErrorKind::Conflict,
            CoreError::PromoInactive(_)
            | CoreError::PromoExpired(_)
            | CoreError::PromoUsageLimitReached(_)
            | CoreError::MinPurchaseNotMet { .. }
            | CoreError::InvalidStatusTransition { .. }
            | CoreError::PaymentNotSettled { .. }
            | CoreError::NotCashPayment
            | CoreError::PaymentNotPending(_)
            | CoreError::OrderCancelled(_) => ErrorKind::PreconditionFailed,
            CoreError::InvalidCredentials => ErrorKind::Unauthorized,
            CoreError::RoleNotPermitted(_) | CoreError::AdminNotDeletable(_) => ErrorKind::Forbidden,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the offending field, used for per-field error maps.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidStatusTransition {
            role: "koki".to_string(),
            from: OrderStatus::Pending,
            to: OrderStatus::Ready,
        };
        assert_eq!(err.to_string(), "Role koki cannot move order from Pending to Ready");

        let err = CoreError::SettlementAlreadyExists {
            date: "2026-01-30".to_string(),
            user_id: "u1".to_string(),
        };
        assert_eq!(err.to_string(), "Settlement for u1 on 2026-01-30 already exists");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::PromoNotFound("X".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::PromoCodeExists("X".into()).kind(), ErrorKind::Conflict);
        assert_eq!(CoreError::NotCashPayment.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(CoreError::TableNumberRequired.kind(), ErrorKind::Validation);
        assert_eq!(CoreError::InvalidOldPassword.kind(), ErrorKind::Validation);
        assert_eq!(CoreError::AdminNotDeletable("a".into()).kind(), ErrorKind::Forbidden);
        assert_eq!(CoreError::UserHasHistory("u".into()).kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        assert_eq!(validation_err.field(), "customer_name");
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
