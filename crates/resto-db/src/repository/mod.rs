//! # Repository Module
//!
//! Database repository implementations for Resto POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways In                                          │
//! │                                                                         │
//! │  Pool-backed methods (&self)            Connection-scoped fns           │
//! │  ───────────────────────────            ─────────────────────           │
//! │  db.transactions().get(id)              TransactionRepository::insert(  │
//! │  db.promos().list()                         tx.conn()?, &record)        │
//! │  db.settlements().insert(..)            PromoRepository::try_consume(   │
//! │                                             tx.conn()?, &promo_id)      │
//! │  autocommit, one statement              joins an open WriteTx           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - Categories
//! - [`menu::MenuRepository`] - Menu CRUD and checkout lookups
//! - [`promo::PromoRepository`] - Promo CRUD and atomic consumption
//! - [`transaction::TransactionRepository`] - Transactions, items, state updates, ledger reads
//! - [`settlement::SettlementRepository`] - Daily cash settlements
//! - [`user::UserRepository`] - Staff accounts

pub mod category;
pub mod menu;
pub mod promo;
pub mod settlement;
pub mod transaction;
pub mod user;
