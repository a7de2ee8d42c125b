//! Order lifecycle operations.
//!
//! Every mutation follows the same shape: load the row, let
//! `resto_core::lifecycle` decide, then issue a conditional `UPDATE` keyed
//! on the state that was observed. Zero affected rows means somebody else
//! moved the order first; the decision is repeated against a fresh read so
//! the caller gets the error that matches the current state.

use serde::Deserialize;
use tracing::info;

use resto_core::lifecycle::{self, TransitionPlan};
use resto_core::{CoreError, OrderStatus, Role, Transaction, ValidationError};
use resto_db::Database;

use crate::error::ServiceResult;

/// Page size of the list endpoint when the client does not ask for one.
pub const DEFAULT_LIST_LIMIT: u32 = 200;

/// Largest page the list endpoint serves.
pub const MAX_LIST_LIMIT: u32 = 500;

/// Newest-first paging over all transactions.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn list_transactions(db: &Database, query: ListQuery) -> ServiceResult<Vec<Transaction>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: i64::from(MAX_LIST_LIMIT),
        }
        .into());
    }

    Ok(db.transactions().list(limit, query.offset.unwrap_or(0)).await?)
}

pub async fn get_transaction(db: &Database, id: &str) -> ServiceResult<Transaction> {
    db.transactions()
        .get(id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()).into())
}

async fn load_header(db: &Database, id: &str) -> ServiceResult<Transaction> {
    db.transactions()
        .get_header(id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()).into())
}

/// Moves an order to `requested` on behalf of `role`.
///
/// `actor_id` is recorded as the closer when the transition closes the
/// order (`ready → completed`).
pub async fn update_order_status(
    db: &Database,
    id: &str,
    role: Role,
    actor_id: Option<&str>,
    requested: OrderStatus,
) -> ServiceResult<Transaction> {
    let tx = load_header(db, id).await?;
    let plan = lifecycle::plan_transition(role, &tx, requested)?;
    apply(db, &tx, role, plan, actor_id, |fresh| lifecycle::plan_transition(role, fresh, requested)).await
}

/// Cancels an order. Only cashiers and admins may cancel.
pub async fn cancel_order(db: &Database, id: &str, role: Role) -> ServiceResult<Transaction> {
    let tx = load_header(db, id).await?;
    let plan = lifecycle::plan_cancel(role, &tx)?;
    apply(db, &tx, role, plan, None, |fresh| lifecycle::plan_cancel(role, fresh)).await
}

async fn apply(
    db: &Database,
    tx: &Transaction,
    role: Role,
    plan: TransitionPlan,
    actor_id: Option<&str>,
    replan: impl Fn(&Transaction) -> Result<TransitionPlan, CoreError>,
) -> ServiceResult<Transaction> {
    let closer = if plan.record_closer { actor_id } else { None };

    let moved = db
        .transactions()
        .update_order_status(&tx.id, plan.from, plan.to, closer)
        .await?;

    if !moved {
        let fresh = load_header(db, &tx.id).await?;
        replan(&fresh)?;
        // The fresh state would allow the move but the row changed again.
        return Err(CoreError::InvalidStatusTransition {
            role: role.as_str().to_string(),
            from: fresh.order_status,
            to: plan.to,
        }
        .into());
    }

    info!(
        id = %tx.id,
        from = %plan.from.as_str(),
        to = %plan.to.as_str(),
        closed_by = ?closer,
        "Order status updated"
    );

    get_transaction(db, &tx.id).await
}

/// Marks a pending cash payment as paid by `cashier_id`.
pub async fn confirm_cash_paid(db: &Database, id: &str, cashier_id: &str) -> ServiceResult<Transaction> {
    let tx = load_header(db, id).await?;
    lifecycle::check_cash_confirmation(&tx)?;

    if !db.transactions().confirm_cash_paid(id, cashier_id).await? {
        let fresh = load_header(db, id).await?;
        lifecycle::check_cash_confirmation(&fresh)?;
        return Err(CoreError::PaymentNotPending(fresh.payment_status).into());
    }

    info!(id = %id, cashier_id = %cashier_id, "Cash payment confirmed");
    get_transaction(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::services::checkout::{create_transaction, CheckoutLine, CheckoutRequest};
    use crate::services::test_support::{memory_db, seed_menu, seed_user, test_config};
    use resto_core::{OrderType, PaymentMethod, PaymentStatus};
    use resto_payment::MockGateway;

    async fn placed(db: &Database, method: PaymentMethod) -> Transaction {
        let menu = seed_menu(db, "Mie Ayam", 1_500_000, true).await;
        let req = CheckoutRequest {
            customer_name: "Ani".into(),
            customer_phone: "08123456789".into(),
            customer_email: None,
            order_type: OrderType::TakeAway,
            table_number: None,
            payment_method: method,
            promo_code: None,
            notes: None,
            items: vec![CheckoutLine {
                menu_id: menu.id,
                quantity: 1,
            }],
        };
        create_transaction(db, &MockGateway::new(), &test_config().payment, req)
            .await
            .unwrap()
            .transaction
    }

    fn is_invalid_transition(err: &ServiceError) -> bool {
        matches!(err, ServiceError::Core(CoreError::InvalidStatusTransition { .. }))
    }

    #[tokio::test]
    async fn test_full_cash_lifecycle() {
        let db = memory_db().await;
        let kasir = seed_user(&db, "Siti", Role::Kasir).await;
        let tx = placed(&db, PaymentMethod::Cash).await;

        update_order_status(&db, &tx.id, Role::Kasir, Some(&kasir.id), OrderStatus::Cooking).await.unwrap();
        update_order_status(&db, &tx.id, Role::Koki, None, OrderStatus::Ready).await.unwrap();

        let err = update_order_status(&db, &tx.id, Role::Kasir, Some(&kasir.id), OrderStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::PaymentNotSettled { .. })));

        let paid = confirm_cash_paid(&db, &tx.id, &kasir.id).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.closed_by_user_id.as_deref(), Some(kasir.id.as_str()));

        let done = update_order_status(&db, &tx.id, Role::Kasir, Some(&kasir.id), OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.order_status, OrderStatus::Completed);
        assert_eq!(done.items.len(), 1);
    }

    #[tokio::test]
    async fn test_role_table_is_enforced() {
        let db = memory_db().await;
        let tx = placed(&db, PaymentMethod::Cash).await;

        let err = update_order_status(&db, &tx.id, Role::Koki, None, OrderStatus::Cooking).await.unwrap_err();
        assert!(is_invalid_transition(&err));

        let err = update_order_status(&db, &tx.id, Role::Kasir, None, OrderStatus::Ready).await.unwrap_err();
        assert!(is_invalid_transition(&err));

        // Admin acts as a cashier.
        let moved = update_order_status(&db, &tx.id, Role::Admin, None, OrderStatus::Cooking).await.unwrap();
        assert_eq!(moved.order_status, OrderStatus::Cooking);
    }

    #[tokio::test]
    async fn test_cancel() {
        let db = memory_db().await;
        let tx = placed(&db, PaymentMethod::Cash).await;

        let err = cancel_order(&db, &tx.id, Role::Koki).await.unwrap_err();
        assert!(is_invalid_transition(&err));

        let cancelled = cancel_order(&db, &tx.id, Role::Admin).await.unwrap();
        assert_eq!(cancelled.order_status, OrderStatus::Cancelled);

        let err = cancel_order(&db, &tx.id, Role::Kasir).await.unwrap_err();
        assert!(is_invalid_transition(&err));

        let err = confirm_cash_paid(&db, &tx.id, "someone").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::OrderCancelled(_))));
    }

    #[tokio::test]
    async fn test_cash_confirmation_rules() {
        let db = memory_db().await;
        let kasir = seed_user(&db, "Siti", Role::Kasir).await;

        let card = placed(&db, PaymentMethod::CreditCard).await;
        let err = confirm_cash_paid(&db, &card.id, &kasir.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotCashPayment)));

        let cash = placed(&db, PaymentMethod::Cash).await;
        confirm_cash_paid(&db, &cash.id, &kasir.id).await.unwrap();
        let err = confirm_cash_paid(&db, &cash.id, &kasir.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::PaymentNotPending(PaymentStatus::Paid))));
    }

    #[tokio::test]
    async fn test_list_pages_past_the_default_window() {
        let db = memory_db().await;
        let first = placed(&db, PaymentMethod::Cash).await;
        placed(&db, PaymentMethod::Cash).await;
        placed(&db, PaymentMethod::Cash).await;

        let all = list_transactions(&db, ListQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let tail = list_transactions(
            &db,
            ListQuery {
                limit: Some(2),
                offset: Some(2),
            },
        )
        .await
        .unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].id, first.id);

        for limit in [0, MAX_LIST_LIMIT + 1] {
            let err = list_transactions(
                &db,
                ListQuery {
                    limit: Some(limit),
                    offset: None,
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let db = memory_db().await;
        let err = get_transaction(&db, "missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::TransactionNotFound(_))));

        let err = update_order_status(&db, "missing", Role::Kasir, None, OrderStatus::Cooking).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::TransactionNotFound(_))));
    }
}
