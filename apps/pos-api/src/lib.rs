//! # Resto POS API
//!
//! HTTP service for the customer kiosk, the cashier and kitchen screens and
//! the admin back office.
//!
//! ## Module Organization
//! ```text
//! pos_api
//! ├── config     - PosConfig (defaults, pos.toml, POS_* env)
//! ├── state      - AppState shared by handlers
//! ├── auth       - JWT sessions, CurrentUser extractor, password hashing
//! ├── error      - ServiceError / ApiError and HTTP mapping
//! ├── response   - success envelope
//! ├── services   - checkout, order, payment, settlement, report, ...
//! └── routes     - axum handlers and the router
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

pub use config::PosConfig;
pub use error::{ApiError, ApiResult, ServiceError, ServiceResult};
pub use state::AppState;
