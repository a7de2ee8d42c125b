//! Shared application state.
//!
//! Cloned into every handler by axum. Every field is a cheap handle:
//! `Database` wraps a `SqlitePool`, the rest sit behind `Arc`.

use std::sync::Arc;

use resto_db::Database;
use resto_payment::PaymentGateway;

use crate::auth::JwtManager;
use crate::config::PosConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub gateway: Arc<dyn PaymentGateway>,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<PosConfig>,
}

impl AppState {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>, config: PosConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        AppState {
            db,
            gateway,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}
