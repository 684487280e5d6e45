//! Configuration management for the contact API
//!
//! Layers, lowest to highest priority: built-in defaults, an optional
//! `Config.toml`, `CONTACT_`-prefixed environment variables (nested with `__`,
//! e.g. `CONTACT_SERVER__PORT`) and the mail transport's `EMAIL_*` variables.

use contact_core::{ContactConfig, MailConfig};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub validation: ValidationConfig,
    pub observability: ObservabilityConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    /// Settings handed to the core pipeline
    pub fn contact_config(&self) -> ContactConfig {
        ContactConfig {
            dns_timeout_ms: self.validation.dns_timeout_ms,
            dns_attempts: self.validation.dns_attempts,
            dns_cache_size: self.validation.dns_cache_size,
            dns_min_ttl_secs: self.validation.dns_min_ttl_secs,
            blocklist_url: self.validation.blocklist_url.clone(),
            blocklist_refresh_secs: self.validation.blocklist_refresh_secs,
            blocklist_timeout_secs: self.validation.blocklist_timeout_secs,
            blocklist_refresh_cooldown_secs: self.validation.blocklist_refresh_cooldown_secs,
            privacy_salt: self.security.privacy_salt.clone(),
            mail: self.mail.clone(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Deliverability check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// DNS resolver timeout in milliseconds
    pub dns_timeout_ms: u64,
    /// Maximum number of DNS lookup attempts
    pub dns_attempts: usize,
    /// DNS cache size (number of entries)
    pub dns_cache_size: usize,
    /// Minimum TTL for positive DNS cache entries in seconds
    pub dns_min_ttl_secs: u64,
    /// Remote disposable domain blocklist
    pub blocklist_url: String,
    /// How long a fetched blocklist stays fresh, in seconds
    pub blocklist_refresh_secs: u64,
    /// Blocklist download timeout in seconds
    pub blocklist_timeout_secs: u64,
    /// Minimum seconds between fetches forced through the refresh endpoint
    pub blocklist_refresh_cooldown_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let core = ContactConfig::default();
        Self {
            dns_timeout_ms: core.dns_timeout_ms,
            dns_attempts: core.dns_attempts,
            dns_cache_size: core.dns_cache_size,
            dns_min_ttl_secs: core.dns_min_ttl_secs,
            blocklist_url: core.blocklist_url,
            blocklist_refresh_secs: core.blocklist_refresh_secs,
            blocklist_timeout_secs: core.blocklist_timeout_secs,
            blocklist_refresh_cooldown_secs: core.blocklist_refresh_cooldown_secs,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable JSON structured logging
    pub json_logs: bool,
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            log_level: "info".to_string(),
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes
    pub max_body_size_bytes: usize,
    /// Allowed CORS origins (empty = allow all)
    pub cors_origins: Vec<String>,
    /// Salt for pseudonymizing addresses in logs
    pub privacy_salt: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size_bytes: 16 * 1024,
            cors_origins: Vec::new(),
            privacy_salt: None,
        }
    }
}

/// Load application configuration from defaults, file and environment
pub fn load_config() -> Result<AppConfig, figment::Error> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if std::path::Path::new("Config.toml").exists() {
        figment = figment.merge(Toml::file("Config.toml"));
    }

    figment
        .merge(Env::prefixed("CONTACT_").split("__"))
        .merge(Env::prefixed("EMAIL_").map(|key| format!("mail.{}", key).into()))
        .extract()
}

/// Environment variable names for configuration
#[allow(dead_code)]
pub mod env_vars {
    pub const SERVER_PORT: &str = "CONTACT_SERVER__PORT";
    pub const JSON_LOGS: &str = "CONTACT_OBSERVABILITY__JSON_LOGS";
    pub const PRIVACY_SALT: &str = "CONTACT_SECURITY__PRIVACY_SALT";
    pub const MAIL_SERVER: &str = "EMAIL_SERVER";
    pub const MAIL_PORT: &str = "EMAIL_PORT";
    pub const MAIL_SECURE: &str = "EMAIL_SECURE";
    pub const MAIL_USER: &str = "EMAIL_USER";
    pub const MAIL_PASSWORD: &str = "EMAIL_PASSWORD";
    pub const MAIL_FROM: &str = "EMAIL_FROM";
    pub const MAIL_TO: &str = "EMAIL_TO";
}
