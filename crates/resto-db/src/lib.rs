//! # resto-db: Database Layer for Resto POS
//!
//! This crate provides database access for the Resto POS system.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Resto POS Data Flow                              │
//! │                                                                         │
//! │  pos-api service (checkout, order status, settlement, report)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     resto-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ TransactionRepo│    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ PromoRepo      │    │              │  │   │
//! │  │   │ WriteTx       │    │ SettlementRepo │    │              │  │   │
//! │  │   │               │    │ Menu/User/...  │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │                     ./data/resto.db                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation, configuration and write transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/resto.db")).await?;
//! let menus = db.menus().list_available().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, WriteTx};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::menu::MenuRepository;
pub use repository::promo::PromoRepository;
pub use repository::settlement::{CloserRow, SettlementRepository};
pub use repository::transaction::{LedgerFilter, TransactionRepository};
pub use repository::user::UserRepository;
