//! Service layer.
//!
//! Each module turns one group of HTTP operations into calls on the pure
//! rules in `resto-core` and the repositories in `resto-db`. Services take
//! their collaborators explicitly and return [`ServiceResult`]; the HTTP
//! mapping happens in `routes`.
//!
//! ```text
//! routes ──► services ──► resto_core (decide)
//!                    └──► resto_db   (persist, conditional updates)
//!                    └──► resto_payment (non-cash checkout)
//! ```
//!
//! [`ServiceResult`]: crate::error::ServiceResult

pub mod account;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod payment;
pub mod promo;
pub mod report;
pub mod settlement;
