//! # Payment Gateway Breakdown
//!
//! Pure pieces of non-cash payment handling: building the itemized charge
//! the gateway expects, and mapping gateway statuses back onto ours.
//!
//! ## Reconciliation Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  item lines      Σ price × qty          (whole currency units)          │
//! │  DISC            − discount             (only when discount > 0)        │
//! │  TAX-PPN         gross − everything above (only when non-zero)          │
//! │  ─────────────────────────────────────────────                          │
//! │  Σ lines  ==  gross_amount  ==  round(total)                            │
//! │                                                                         │
//! │  The gateway rejects any request where the sum differs, so the tax     │
//! │  line absorbs every rounding difference.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::pricing::PricedOrder;
use crate::types::{OrderStatus, PaymentStatus};

/// Line id of the synthetic discount line.
pub const DISCOUNT_LINE_ID: &str = "DISC";
/// Line id of the synthetic tax line.
pub const TAX_LINE_ID: &str = "TAX-PPN";

// =============================================================================
// Charge Request
// =============================================================================

/// One line of the charge, in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeLine {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

impl ChargeLine {
    #[inline]
    pub fn amount(&self) -> i64 {
        self.price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Everything the gateway needs to issue a payment token for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Our transaction id; the gateway echoes it back in notifications.
    pub order_id: String,
    pub gross_amount: i64,
    pub lines: Vec<ChargeLine>,
    pub customer: ChargeCustomer,
    /// Minutes until the gateway expires the payment page.
    pub expiry_minutes: i64,
}

impl ChargeRequest {
    /// Sum of all line amounts.
    pub fn line_total(&self) -> i64 {
        self.lines.iter().map(ChargeLine::amount).sum()
    }

    /// Whether the lines add up to the gross amount.
    pub fn is_balanced(&self) -> bool {
        self.line_total() == self.gross_amount
    }
}

/// Builds the balanced charge request for a priced order.
///
/// Item prices are the frozen catalog prices rounded to whole units; the
/// gross amount is the order total rounded to whole units.
pub fn build_charge(
    order_id: &str,
    order: &PricedOrder,
    customer: ChargeCustomer,
    expiry_minutes: i64,
) -> ChargeRequest {
    let mut lines: Vec<ChargeLine> = order
        .lines
        .iter()
        .map(|l| ChargeLine {
            id: l.menu_id.clone(),
            name: l.menu_name.clone(),
            price: l.unit_price.round_to_major(),
            quantity: l.quantity,
        })
        .collect();

    if order.discount.is_positive() {
        lines.push(ChargeLine {
            id: DISCOUNT_LINE_ID.to_string(),
            name: "Diskon".to_string(),
            price: -order.discount.round_to_major(),
            quantity: 1,
        });
    }

    let gross_amount = order.total.round_to_major();
    let before_tax: i64 = lines.iter().map(ChargeLine::amount).sum();
    let tax_line = gross_amount - before_tax;

    if tax_line != 0 {
        lines.push(ChargeLine {
            id: TAX_LINE_ID.to_string(),
            name: "PPN 10%".to_string(),
            price: tax_line,
            quantity: 1,
        });
    }

    ChargeRequest {
        order_id: order_id.to_string(),
        gross_amount,
        lines,
        customer,
        expiry_minutes,
    }
}

// =============================================================================
// Notification Mapping
// =============================================================================

/// Maps a gateway `transaction_status` to (payment, order) status.
///
/// | gateway status          | payment   | order     |
/// |-------------------------|-----------|-----------|
/// | capture, settlement     | paid      | completed |
/// | pending                 | pending   | pending   |
/// | expire                  | expired   | cancelled |
/// | deny, cancel            | cancelled | cancelled |
/// | anything else           | pending   | pending   |
pub fn map_gateway_status(status: &str) -> (PaymentStatus, OrderStatus) {
    match status.trim().to_ascii_lowercase().as_str() {
        "capture" | "settlement" => (PaymentStatus::Paid, OrderStatus::Completed),
        "pending" => (PaymentStatus::Pending, OrderStatus::Pending),
        "expire" => (PaymentStatus::Expired, OrderStatus::Cancelled),
        "deny" | "cancel" => (PaymentStatus::Cancelled, OrderStatus::Cancelled),
        _ => (PaymentStatus::Pending, OrderStatus::Pending),
    }
}

/// Total rounded the same way as [`build_charge`] rounds the gross amount.
#[inline]
pub fn gross_amount(total: Money) -> i64 {
    total.round_to_major()
}

// =============================================================================
// Unit Tests
// =============================================================================
