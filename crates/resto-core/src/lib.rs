//! # resto-core: Pure Business Logic for Resto POS
//!
//! This crate is the **heart** of Resto POS. It holds the restaurant rules
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Resto POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Clients (customer kiosk, cashier, kitchen)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/pos-api (axum)                          │   │
//! │  │    checkout, order status, cash confirm, settlement, report    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ resto-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │  │ pricing │ │lifecycle│ │ gateway  │ │ report  │ │  money  │  │   │
//! │  │  │ promos  │ │  roles  │ │breakdown │ │ buckets │ │ TaxRate │  │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                   │                               │                     │
//! │  ┌────────────────▼──────────────┐ ┌──────────────▼──────────────────┐ │
//! │  │   resto-db (SQLite, sqlx)     │ │   resto-payment (Midtrans)      │ │
//! │  └───────────────────────────────┘ └─────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Transaction, Promo, Settlement, Menu, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`pricing`] - Subtotal, promo discount, tax and total
//! - [`lifecycle`] - Order/payment state machine and role rules
//! - [`gateway`] - Payment gateway line items and notification mapping
//! - [`report`] - Daily summary and zero-filled chart series
//!
//! ## Example Usage
//!
//! ```rust
//! use resto_core::money::Money;
//! use resto_core::PPN_RATE;
//!
//! let subtotal = Money::from_cents(2_500_000); // 25,000.00
//! let tax = subtotal.calculate_tax(PPN_RATE);
//! assert_eq!(tax.cents(), 250_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Value-added tax (PPN) applied to every order: 10%.
///
/// The rate is fixed for the restaurant and not configurable per jurisdiction.
pub const PPN_RATE: TaxRate = TaxRate::from_bps(1000);

/// How long a non-cash order waits for the gateway before it expires.
pub const NON_CASH_EXPIRY_HOURS: i64 = 24;

/// Maximum line items allowed in a single checkout.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single menu in one checkout line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Upper bound for any stored amount: menu prices, promo values, cash counts.
///
/// Rp 10.000.000.000. With [`MAX_ITEM_QUANTITY`] and [`MAX_ORDER_LINES`]
/// an order total stays far below `i64::MAX` cents.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;
