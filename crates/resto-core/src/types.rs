//! # Domain Types
//!
//! Core domain types used throughout Resto POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │   Transaction   │1─N│ TransactionItem  │N─1│      Menu       │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  payment_status │   │  menu_name  ❄    │   │  price_cents    │      │
//! │  │  order_status   │   │  menu_price ❄    │   │  is_available   │      │
//! │  │  total_cents    │   │  quantity        │   │  category_id    │      │
//! │  └────────┬────────┘   └──────────────────┘   └─────────────────┘      │
//! │           │ promo_code                          ❄ = frozen snapshot    │
//! │  ┌────────▼────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │      Promo      │   │    Settlement    │   │      User       │      │
//! │  │  code (UPPER)   │   │  (date, user_id) │   │  role           │      │
//! │  │  usage_count    │   │  expected/actual │   │  admin|kasir|   │      │
//! │  │  usage_limit    │   │  discrepancy     │   │  koki           │      │
//! │  └─────────────────┘   └──────────────────┘   └─────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All identifiers are UUID v4 strings. All amounts are `_cents` integers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so PPN 10% is 1000 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

// =============================================================================
// Enums
// =============================================================================

/// How the guest receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Eaten at a table; a table number is mandatory.
    DineIn,
    /// Packed to go; never carries a table number.
    TakeAway,
}

impl Default for OrderType {
    fn default() -> Self {
        OrderType::TakeAway
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid at the counter, confirmed by a cashier.
    Cash,
    CreditCard,
    DebitCard,
    EWallet,
}

impl PaymentMethod {
    /// Non-cash methods go through the payment gateway.
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::EWallet => "e_wallet",
        }
    }
}

/// Payment side of a transaction.
///
/// ```text
///            ┌──► paid
/// pending ───┼──► cancelled      (all three are terminal)
///            └──► expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
    Expired,
}

impl PaymentStatus {
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Expired => "expired",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Fulfillment side of a transaction.
///
/// ```text
/// pending ──► cooking ──► ready ──► completed
///    │           │          │
///    └───────────┴──────────┴──────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Cooking,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Cooking => "cooking",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PromoKind {
    /// `value` is a whole percent of the subtotal.
    Percentage,
    /// `value` is an amount in cents.
    Fixed,
}

/// Staff role.
///
/// Role strings coming from tokens or request bodies go through
/// [`Role::parse`] exactly once; nothing else compares raw role text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// Cashier.
    Kasir,
    /// Cook.
    Koki,
}

impl Role {
    /// Canonicalizes a role string: surrounding whitespace is ignored and
    /// matching is case-insensitive.
    ///
    /// ## Example
    /// ```rust
    /// use resto_core::Role;
    ///
    /// assert_eq!(Role::parse("  Kasir "), Some(Role::Kasir));
    /// assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
    /// assert_eq!(Role::parse("waiter"), None);
    /// ```
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "kasir" => Some(Role::Kasir),
            "koki" => Some(Role::Koki),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Kasir => "kasir",
            Role::Koki => "koki",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A dish or drink on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Menu {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Current catalog price; copied into line items at order time.
    pub price_cents: i64,
    /// Unavailable menus are hidden from the public list and rejected at checkout.
    pub is_available: bool,
    pub category_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Menu {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// An order placed by a guest, with its payment and fulfillment state.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub order_type: OrderType,
    /// Present only for dine-in orders.
    pub table_number: Option<i64>,
    /// Uppercased promo code, if one was applied.
    pub promo_code: Option<String>,
    pub discount_cents: i64,
    /// Pre-tax amount after discount.
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    /// Gateway deadline; set only for non-cash orders.
    #[ts(as = "Option<String>")]
    pub expired_at: Option<DateTime<Utc>>,
    /// Cashier who confirmed cash or completed the order.
    pub closed_by_user_id: Option<String>,
    pub notes: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<TransactionItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }
}

/// A line in a transaction.
/// Uses the snapshot pattern to freeze menu data at order time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub menu_id: String,
    /// Menu name at time of order (frozen).
    pub menu_name: String,
    /// Unit price in cents at time of order (frozen).
    pub menu_price_cents: i64,
    pub quantity: i64,
    /// `menu_price_cents × quantity`.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TransactionItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.menu_price_cents)
    }
}

// =============================================================================
// Promo
// =============================================================================

/// A promotion code.
///
/// Zero means "no constraint" for `min_purchase_cents`, `max_discount_cents`
/// and `usage_limit`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Promo {
    pub id: String,
    /// Always stored uppercased.
    pub code: String,
    pub description: Option<String>,
    pub kind: PromoKind,
    pub value: i64,
    pub min_purchase_cents: i64,
    pub max_discount_cents: i64,
    pub usage_limit: i64,
    /// Incremented only when a checkout using the code commits.
    pub usage_count: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Promo {
    /// Whether the promo has used up its quota.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit > 0 && self.usage_count >= self.usage_limit
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// A cashier's end-of-day cash declaration. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Settlement {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub user_id: String,
    /// Recomputed from the ledger at creation; never taken from the request.
    pub expected_cash_cents: i64,
    pub actual_cash_cents: i64,
    /// `actual - expected`; negative means the drawer is short.
    pub discrepancy_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
