//! # Pricing & Promo Engine
//!
//! Turns a list of (menu, quantity) lines plus an optional promo code into
//! a fully priced order.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► price_line() per line ──► raw subtotal = Σ price × qty      │
//! │                                            │                            │
//! │  promo code? ──► evaluate_promo(raw subtotal, now)                     │
//! │                     │  NotFound → Inactive → Expired →                  │
//! │                     │  UsageLimit → MinPurchase                         │
//! │                     ▼                                                   │
//! │                  discount (clamped to max_discount, then to subtotal)  │
//! │                                            │                            │
//! │  subtotal = raw − discount ──► tax = PPN 10% ──► total = subtotal+tax  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Promo *consumption* (the usage counter) is not done here; the database
//! layer increments it atomically inside the checkout transaction.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Menu, OrderType, Promo, PromoKind};
use crate::validation::validate_quantity;
use crate::PPN_RATE;

// =============================================================================
// Priced Types
// =============================================================================

/// A checkout line with the catalog price frozen in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub menu_id: String,
    pub menu_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub subtotal: Money,
}

/// A promo that passed validation, with the discount it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPromo {
    pub promo_id: String,
    pub code: String,
    pub discount: Money,
}

/// The result of pricing an order, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    /// Σ price × qty before any discount.
    pub raw_subtotal: Money,
    pub discount: Money,
    /// `raw_subtotal - discount`.
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub promo: Option<AppliedPromo>,
}

// =============================================================================
// Lines
// =============================================================================

/// Prices a single line against the current catalog entry.
///
/// `menu` is the catalog lookup result; a missing or unavailable menu fails
/// with [`CoreError::MenuUnavailable`]. A line whose subtotal does not fit
/// in `i64` cents fails validation instead of wrapping.
pub fn price_line(menu_id: &str, menu: Option<&Menu>, quantity: i64) -> CoreResult<PricedLine> {
    validate_quantity(quantity)?;

    let menu = match menu {
        Some(m) if m.is_available => m,
        _ => return Err(CoreError::MenuUnavailable(menu_id.to_string())),
    };

    let subtotal = menu
        .price()
        .checked_mul(quantity)
        .ok_or_else(|| amount_overflow("items"))?;

    Ok(PricedLine {
        menu_id: menu.id.clone(),
        menu_name: menu.name.clone(),
        unit_price: menu.price(),
        quantity,
        subtotal,
    })
}

fn amount_overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

/// Applies the order-type rule to the requested table number.
///
/// ## Rules
/// - `dine_in` needs a positive table number
/// - `take_away` never keeps one, whatever the client sent
///
/// ## Example
/// ```rust
/// use resto_core::pricing::resolve_table_number;
/// use resto_core::OrderType;
///
/// assert_eq!(resolve_table_number(OrderType::DineIn, Some(7)).unwrap(), Some(7));
/// assert_eq!(resolve_table_number(OrderType::TakeAway, Some(7)).unwrap(), None);
/// assert!(resolve_table_number(OrderType::DineIn, Some(0)).is_err());
/// ```
pub fn resolve_table_number(order_type: OrderType, table_number: Option<i64>) -> CoreResult<Option<i64>> {
    match order_type {
        OrderType::DineIn => match table_number {
            Some(n) if n > 0 => Ok(Some(n)),
            _ => Err(CoreError::TableNumberRequired),
        },
        OrderType::TakeAway => Ok(None),
    }
}

// =============================================================================
// Promo Evaluation
// =============================================================================

/// Validates a promo against a subtotal at `now` and returns the discount.
///
/// The checks run in a fixed order so the caller always gets the first
/// failing rule:
///
/// 1. inactive
/// 2. outside `[start_date, end_date]`
/// 3. usage limit reached
/// 4. minimum purchase not met
///
/// ## Discount
/// - percentage: `subtotal × value / 100`, rounded half-up
/// - fixed: `value`
///
/// The discount is clamped by `max_discount` (when > 0) and never exceeds
/// the subtotal.
pub fn evaluate_promo(promo: &Promo, subtotal: Money, now: DateTime<Utc>) -> CoreResult<Money> {
    if !promo.is_active {
        return Err(CoreError::PromoInactive(promo.code.clone()));
    }

    if now < promo.start_date || now > promo.end_date {
        return Err(CoreError::PromoExpired(promo.code.clone()));
    }

    if promo.is_exhausted() {
        return Err(CoreError::PromoUsageLimitReached(promo.code.clone()));
    }

    if subtotal.cents() < promo.min_purchase_cents {
        return Err(CoreError::MinPurchaseNotMet {
            min_purchase_cents: promo.min_purchase_cents,
            subtotal_cents: subtotal.cents(),
        });
    }

    let mut discount = match promo.kind {
        PromoKind::Percentage => subtotal.percent_of(promo.value),
        PromoKind::Fixed => Money::from_cents(promo.value),
    };

    if promo.max_discount_cents > 0 {
        discount = discount.min(Money::from_cents(promo.max_discount_cents));
    }

    Ok(discount.min(subtotal))
}

/// Resolves a looked-up promo for `code` and evaluates it.
///
/// `found` is the result of a case-insensitive lookup; `None` becomes
/// [`CoreError::PromoNotFound`].
pub fn apply_promo(
    code: &str,
    found: Option<&Promo>,
    subtotal: Money,
    now: DateTime<Utc>,
) -> CoreResult<AppliedPromo> {
    let promo = found.ok_or_else(|| CoreError::PromoNotFound(code.to_ascii_uppercase()))?;
    let discount = evaluate_promo(promo, subtotal, now)?;

    Ok(AppliedPromo {
        promo_id: promo.id.clone(),
        code: promo.code.clone(),
        discount,
    })
}

// =============================================================================
// Totals
// =============================================================================

/// Computes PPN and total for a post-discount subtotal.
///
/// ## Example
/// ```rust
/// use resto_core::money::Money;
/// use resto_core::pricing::tax_and_total;
///
/// let (tax, total) = tax_and_total(Money::from_cents(2_200_000));
/// assert_eq!(tax.cents(), 220_000);
/// assert_eq!(total.cents(), 2_420_000);
/// ```
pub fn tax_and_total(subtotal: Money) -> (Money, Money) {
    let tax = subtotal.calculate_tax(PPN_RATE);
    (tax, subtotal + tax)
}

/// Prices a whole order from already-priced lines and an optional promo.
pub fn price_order(lines: Vec<PricedLine>, promo: Option<AppliedPromo>) -> CoreResult<PricedOrder> {
    let raw_subtotal = raw_subtotal(&lines)?;
    let discount = promo
        .as_ref()
        .map(|p| p.discount.min(raw_subtotal))
        .unwrap_or_default();
    let subtotal = raw_subtotal - discount;
    let tax = subtotal.calculate_tax(PPN_RATE);
    let total = subtotal.checked_add(tax).ok_or_else(|| amount_overflow("total"))?;

    Ok(PricedOrder {
        lines,
        raw_subtotal,
        discount,
        subtotal,
        tax,
        total,
        promo,
    })
}

/// Raw subtotal of priced lines, used to validate a promo before the
/// order is assembled.
pub fn raw_subtotal(lines: &[PricedLine]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(line.subtotal).ok_or_else(|| amount_overflow("items"))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
