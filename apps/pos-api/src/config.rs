//! POS API configuration module.
//!
//! ## Sources (later wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. built-in defaults                                                  │
//! │  2. pos.toml              (optional, path from POS_CONFIG)             │
//! │  3. environment           POS_HTTP_PORT, POS_PAYMENT__SERVER_KEY, ...  │
//! │                                                                         │
//! │  .env is loaded into the environment first (dotenvy).                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use resto_payment::snap::{SnapConfig, SANDBOX_BASE_URL};

const DEFAULT_CONFIG_FILE: &str = "pos.toml";
const DEV_JWT_SECRET: &str = "resto-pos-dev-secret-change-in-production";

/// POS API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    pub db_max_connections: u32,

    /// HS256 signing key for session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    pub payment: PaymentConfig,

    /// Allowed browser origins; empty allows any origin.
    pub cors_origins: Vec<String>,
}

/// Payment gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub base_url: String,

    /// Midtrans server key. Without it non-cash checkout is refused and
    /// notification signatures are not checked.
    pub server_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Total retry budget for connection errors, in seconds
    pub max_retry_secs: u64,

    /// Minutes before the gateway expires an unpaid payment page
    pub expiry_minutes: i64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        PaymentConfig {
            base_url: SANDBOX_BASE_URL.to_string(),
            server_key: None,
            timeout_secs: 10,
            max_retry_secs: 15,
            expiry_minutes: resto_core::NON_CASH_EXPIRY_HOURS * 60,
        }
    }
}

impl PaymentConfig {
    pub fn snap_config(&self) -> SnapConfig {
        SnapConfig {
            base_url: self.base_url.clone(),
            server_key: self.server_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retry_elapsed: Duration::from_secs(self.max_retry_secs),
            ..SnapConfig::default()
        }
    }

    /// Upper bound for one gateway call including retries.
    pub fn call_deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_secs + self.max_retry_secs + 1)
    }
}

impl Default for PosConfig {
    fn default() -> Self {
        PosConfig {
            http_port: 8080,
            database_path: "./data/resto.db".to_string(),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 86_400,
            payment: PaymentConfig::default(),
            cors_origins: Vec::new(),
        }
    }
}

impl PosConfig {
    /// Load configuration from defaults, `pos.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal outside development.
        let _ = dotenvy::dotenv();

        let file = std::env::var("POS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Some(&file))
    }

    /// Same as [`PosConfig::load`] with an explicit file and no `.env`.
    pub fn load_from(file: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = PosConfig::default();

        let mut builder = config::Config::builder()
            .set_default("http_port", i64::from(defaults.http_port))?
            .set_default("database_path", defaults.database_path.clone())?
            .set_default("db_max_connections", i64::from(defaults.db_max_connections))?
            .set_default("jwt_secret", defaults.jwt_secret.clone())?
            .set_default("jwt_lifetime_secs", defaults.jwt_lifetime_secs)?
            .set_default("payment.base_url", defaults.payment.base_url.clone())?
            .set_default("payment.timeout_secs", defaults.payment.timeout_secs as i64)?
            .set_default("payment.max_retry_secs", defaults.payment.max_retry_secs as i64)?
            .set_default("payment.expiry_minutes", defaults.payment.expiry_minutes)?
            .set_default("cors_origins", Vec::<String>::new())?;

        if let Some(file) = file {
            builder = builder.add_source(config::File::with_name(file).required(false));
        }

        let config: PosConfig = builder
            .add_source(
                config::Environment::with_prefix("POS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }
        if self.payment.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("payment.timeout_secs".to_string()));
        }

        if self.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set POS_JWT_SECRET in production");
        }
        if self.payment.server_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            warn!("No payment server key configured; non-cash checkout is disabled and notification signatures are not verified");
        }

        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = PosConfig::load_from(Some("does-not-exist.toml")).unwrap();
        assert_eq!(config.payment.expiry_minutes, 1440);
        assert!(config.jwt_lifetime_secs > 0);
        assert!(!config.jwt_secret.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("pos-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "http_port = 9090\n[payment]\nserver_key = \"SB-key\"\ntimeout_secs = 3\n",
        )
        .unwrap();

        let config = PosConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.payment.server_key.as_deref(), Some("SB-key"));
        assert_eq!(config.payment.snap_config().timeout, Duration::from_secs(3));
        assert_eq!(config.payment.call_deadline(), Duration::from_secs(3 + 15 + 1));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_empty_secret_rejected() {
        let config = PosConfig {
            jwt_secret: "  ".into(),
            ..PosConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));
    }
}
