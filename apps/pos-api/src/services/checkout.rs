//! # Checkout
//!
//! Creates a transaction from a guest order.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate input                                                         │
//! │      │                                                                  │
//! │  BEGIN IMMEDIATE ───────────────────────────────────────────────┐       │
//! │      │  price each line (menu read on the write connection)     │       │
//! │      │  evaluate promo against the raw subtotal                 │       │
//! │      │  insert transaction + items (pending / pending)          │       │
//! │      │  try_consume promo ── 0 rows ──► PromoUsageLimitReached ─┤       │
//! │      │  deactivate promo if exhausted                           │       │
//! │      │  non-cash: gateway token ── error/timeout ───────────────┤       │
//! │      ▼                                                          ▼       │
//! │  COMMIT ──► { transaction, payment? }                      ROLLBACK     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is visible to readers until the commit, so a failed gateway call
//! leaves no transaction, no items and no promo use behind.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use resto_core::gateway::{build_charge, ChargeCustomer};
use resto_core::pricing::{self, PricedOrder};
use resto_core::validation;
use resto_core::{
    CoreError, OrderStatus, OrderType, PaymentMethod, PaymentStatus, Transaction, TransactionItem,
    NON_CASH_EXPIRY_HOURS,
};
use resto_db::{Database, MenuRepository, PromoRepository, TransactionRepository, WriteTx};
use resto_payment::{GatewayError, PaymentGateway, SnapRequest, SnapToken};

use crate::config::PaymentConfig;
use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Request / Response
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub order_type: OrderType,
    #[serde(default)]
    pub table_number: Option<i64>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<CheckoutLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutLine {
    pub menu_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub transaction: Transaction,
    /// Gateway token and redirect URL; present for non-cash payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<SnapToken>,
}

/// Input after trimming and field checks.
#[derive(Debug)]
struct ValidOrder {
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    order_type: OrderType,
    table_number: Option<i64>,
    payment_method: PaymentMethod,
    promo_code: Option<String>,
    notes: Option<String>,
    items: Vec<CheckoutLine>,
}

fn validate(req: CheckoutRequest) -> ServiceResult<ValidOrder> {
    let customer_name = validation::validate_required("customer_name", &req.customer_name, 100)?;
    let customer_phone = validation::validate_phone(&req.customer_phone)?;
    let customer_email = match req.customer_email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => Some(validation::validate_email(email)?),
        _ => None,
    };
    let table_number = pricing::resolve_table_number(req.order_type, req.table_number)?;
    let promo_code = match req.promo_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => Some(validation::normalize_promo_code(code)?),
        _ => None,
    };
    let notes = req
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    validation::validate_line_count(req.items.len())?;
    for line in &req.items {
        validation::validate_uuid("menu_id", &line.menu_id)?;
        validation::validate_quantity(line.quantity)?;
    }

    Ok(ValidOrder {
        customer_name,
        customer_phone,
        customer_email,
        order_type: req.order_type,
        table_number,
        payment_method: req.payment_method,
        promo_code,
        notes,
        items: req.items,
    })
}

// =============================================================================
// Checkout
// =============================================================================

/// Prices, persists and (for non-cash) registers an order with the gateway.
pub async fn create_transaction(
    db: &Database,
    gateway: &dyn PaymentGateway,
    payment: &PaymentConfig,
    req: CheckoutRequest,
) -> ServiceResult<CheckoutOutcome> {
    let order = validate(req)?;

    let mut write = db.begin_write().await?;
    match checkout_in(&mut write, gateway, payment, order).await {
        Ok(outcome) => {
            write.commit().await?;
            info!(
                id = %outcome.transaction.id,
                total_cents = outcome.transaction.total_cents,
                payment_method = %outcome.transaction.payment_method.as_str(),
                promo = ?outcome.transaction.promo_code,
                "Transaction created"
            );
            Ok(outcome)
        }
        Err(err) => {
            if let Err(rollback_err) = write.rollback().await {
                warn!(error = %rollback_err, "Checkout rollback failed");
            }
            debug!(error = %err, "Checkout aborted");
            Err(err)
        }
    }
}

async fn checkout_in(
    write: &mut WriteTx,
    gateway: &dyn PaymentGateway,
    payment: &PaymentConfig,
    order: ValidOrder,
) -> ServiceResult<CheckoutOutcome> {
    let now = Utc::now();

    // Prices are read on the write connection so they cannot move under us.
    let mut lines = Vec::with_capacity(order.items.len());
    for line in &order.items {
        let menu = MenuRepository::find_for_checkout(write.conn()?, &line.menu_id).await?;
        lines.push(pricing::price_line(&line.menu_id, menu.as_ref(), line.quantity)?);
    }

    let applied = match &order.promo_code {
        Some(code) => {
            let found = PromoRepository::find_by_code_on(write.conn()?, code).await?;
            Some(pricing::apply_promo(code, found.as_ref(), pricing::raw_subtotal(&lines)?, now)?)
        }
        None => None,
    };

    let priced = pricing::price_order(lines, applied)?;
    let transaction = assemble(Uuid::new_v4().to_string(), &order, &priced, now);

    TransactionRepository::insert(write.conn()?, &transaction).await?;

    if let Some(promo) = &priced.promo {
        if !PromoRepository::try_consume(write.conn()?, &promo.promo_id).await? {
            return Err(CoreError::PromoUsageLimitReached(promo.code.clone()).into());
        }
        PromoRepository::deactivate_if_exhausted(write.conn()?, &promo.promo_id).await?;
    }

    let token = if order.payment_method.is_cash() {
        None
    } else {
        Some(request_token(gateway, payment, &transaction, &priced).await?)
    };

    Ok(CheckoutOutcome {
        transaction,
        payment: token,
    })
}

fn assemble(id: String, order: &ValidOrder, priced: &PricedOrder, now: DateTime<Utc>) -> Transaction {
    let items = priced
        .lines
        .iter()
        .map(|line| TransactionItem {
            id: Uuid::new_v4().to_string(),
            transaction_id: id.clone(),
            menu_id: line.menu_id.clone(),
            menu_name: line.menu_name.clone(),
            menu_price_cents: line.unit_price.cents(),
            quantity: line.quantity,
            subtotal_cents: line.subtotal.cents(),
            created_at: now,
        })
        .collect();

    let expired_at = (!order.payment_method.is_cash()).then(|| now + Duration::hours(NON_CASH_EXPIRY_HOURS));

    Transaction {
        id,
        customer_name: order.customer_name.clone(),
        customer_phone: order.customer_phone.clone(),
        customer_email: order.customer_email.clone(),
        order_type: order.order_type,
        table_number: order.table_number,
        promo_code: priced.promo.as_ref().map(|p| p.code.clone()),
        discount_cents: priced.discount.cents(),
        subtotal_cents: priced.subtotal.cents(),
        tax_cents: priced.tax.cents(),
        total_cents: priced.total.cents(),
        payment_method: order.payment_method,
        payment_status: PaymentStatus::Pending,
        order_status: OrderStatus::Pending,
        expired_at,
        closed_by_user_id: None,
        notes: order.notes.clone(),
        items,
        created_at: now,
        updated_at: now,
    }
}

/// Calls the gateway under an overall deadline covering every retry.
async fn request_token(
    gateway: &dyn PaymentGateway,
    payment: &PaymentConfig,
    transaction: &Transaction,
    priced: &PricedOrder,
) -> ServiceResult<SnapToken> {
    let customer = ChargeCustomer {
        name: transaction.customer_name.clone(),
        phone: transaction.customer_phone.clone(),
        email: transaction.customer_email.clone(),
    };
    let charge = build_charge(&transaction.id, priced, customer, payment.expiry_minutes);
    let request = SnapRequest::from(&charge);

    let deadline = payment.call_deadline();
    match tokio::time::timeout(deadline, gateway.create_transaction(&request)).await {
        Ok(Ok(token)) => {
            debug!(id = %transaction.id, "Gateway token issued");
            Ok(token)
        }
        Ok(Err(err)) => {
            warn!(id = %transaction.id, error = %err, "Gateway call failed, rolling back checkout");
            Err(ServiceError::Gateway(err))
        }
        Err(_) => {
            warn!(id = %transaction.id, deadline_secs = deadline.as_secs(), "Gateway call timed out, rolling back checkout");
            Err(ServiceError::Gateway(GatewayError::Timeout(deadline.as_secs())))
        }
    }
}
