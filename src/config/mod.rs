//! Configuration management
//!
//! This module handles loading and parsing configuration for Vitrina.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session and cookie configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Admin account seeded on first start
    #[serde(default)]
    pub admin: AdminConfig,
    /// Public site settings
    #[serde(default)]
    pub site: SiteConfig,
    /// Contact notification mail
    #[serde(default)]
    pub mail: MailConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Directory holding the built SPA, served for non-API paths
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            static_dir: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or postgres)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/vitrina.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// Postgres (Supabase deployments)
    Postgres,
}

impl std::str::FromStr for DatabaseDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "supabase" => Ok(Self::Postgres),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown database driver: {}",
                other
            ))),
        }
    }
}

/// Session and cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in hours
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
    /// Mark the session cookie `Secure` (HTTPS deployments)
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_hours: default_session_hours(),
            cookie_secure: false,
        }
    }
}

fn default_session_hours() -> i64 {
    crate::services::DEFAULT_SESSION_HOURS
}

/// Admin account created when the users table is empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Plaintext password, hashed before it is stored
    #[serde(default = "default_admin_password")]
    pub password: String,
    #[serde(default = "default_admin_display_name")]
    pub display_name: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
            display_name: default_admin_display_name(),
        }
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

fn default_admin_display_name() -> String {
    "Administrador".to_string()
}

/// Public site settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public base URL of the SPA
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Path of the contact form, appended to `public_url` for QR codes
    #[serde(default = "default_contact_path")]
    pub contact_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
            contact_path: default_contact_path(),
        }
    }
}

impl SiteConfig {
    /// Full URL of the public contact form
    pub fn contact_url(&self) -> String {
        format!(
            "{}/{}",
            self.public_url.trim_end_matches('/'),
            self.contact_path.trim_start_matches('/')
        )
    }
}

fn default_public_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_contact_path() -> String {
    "/contacto".to_string()
}

/// Mail notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Send a notification for each contact/raffle submission
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address
    #[serde(default)]
    pub from: String,
    /// Recipient of the notifications
    #[serde(default)]
    pub notify_to: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from: String::new(),
            notify_to: String::new(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern `VITRINA_<SECTION>_<KEY>`:
    /// - VITRINA_SERVER_HOST, VITRINA_SERVER_PORT, VITRINA_SERVER_CORS_ORIGIN,
    ///   VITRINA_SERVER_STATIC_DIR
    /// - VITRINA_DATABASE_DRIVER, VITRINA_DATABASE_URL
    /// - VITRINA_AUTH_SESSION_HOURS, VITRINA_AUTH_COOKIE_SECURE
    /// - VITRINA_ADMIN_USERNAME, VITRINA_ADMIN_PASSWORD, VITRINA_ADMIN_DISPLAY_NAME
    /// - VITRINA_SITE_PUBLIC_URL
    /// - VITRINA_MAIL_ENABLED, VITRINA_MAIL_SMTP_HOST, VITRINA_MAIL_SMTP_PORT,
    ///   VITRINA_MAIL_SMTP_USERNAME, VITRINA_MAIL_SMTP_PASSWORD,
    ///   VITRINA_MAIL_FROM, VITRINA_MAIL_NOTIFY_TO
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the server unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.session_hours must be positive".to_string(),
            ));
        }
        if self.admin.username.trim().is_empty() || self.admin.password.is_empty() {
            return Err(ConfigError::ValidationError(
                "admin.username and admin.password are required".to_string(),
            ));
        }
        if self.mail.enabled && (self.mail.smtp_host.is_empty() || self.mail.notify_to.is_empty()) {
            return Err(ConfigError::ValidationError(
                "mail.smtp_host and mail.notify_to are required when mail is enabled".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("VITRINA_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("VITRINA_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("VITRINA_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(dir) = std::env::var("VITRINA_SERVER_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(dir));
        }

        if let Ok(driver) = std::env::var("VITRINA_DATABASE_DRIVER") {
            if let Ok(driver) = driver.parse() {
                self.database.driver = driver;
            }
        }
        if let Ok(url) = std::env::var("VITRINA_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(hours) = std::env::var("VITRINA_AUTH_SESSION_HOURS") {
            if let Ok(hours) = hours.parse::<i64>() {
                self.auth.session_hours = hours;
            }
        }
        if let Ok(secure) = std::env::var("VITRINA_AUTH_COOKIE_SECURE") {
            if let Some(secure) = parse_bool(&secure) {
                self.auth.cookie_secure = secure;
            }
        }

        if let Ok(username) = std::env::var("VITRINA_ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Ok(password) = std::env::var("VITRINA_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        if let Ok(name) = std::env::var("VITRINA_ADMIN_DISPLAY_NAME") {
            self.admin.display_name = name;
        }

        if let Ok(url) = std::env::var("VITRINA_SITE_PUBLIC_URL") {
            self.site.public_url = url;
        }

        if let Ok(enabled) = std::env::var("VITRINA_MAIL_ENABLED") {
            if let Some(enabled) = parse_bool(&enabled) {
                self.mail.enabled = enabled;
            }
        }
        if let Ok(host) = std::env::var("VITRINA_MAIL_SMTP_HOST") {
            self.mail.smtp_host = host;
        }
        if let Ok(port) = std::env::var("VITRINA_MAIL_SMTP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.mail.smtp_port = port;
            }
        }
        if let Ok(username) = std::env::var("VITRINA_MAIL_SMTP_USERNAME") {
            self.mail.smtp_username = username;
        }
        if let Ok(password) = std::env::var("VITRINA_MAIL_SMTP_PASSWORD") {
            self.mail.smtp_password = password;
        }
        if let Ok(from) = std::env::var("VITRINA_MAIL_FROM") {
            self.mail.from = from;
        }
        if let Ok(to) = std::env::var("VITRINA_MAIL_NOTIFY_TO") {
            self.mail.notify_to = to;
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENV_KEYS: &[&str] = &[
        "VITRINA_SERVER_HOST",
        "VITRINA_SERVER_PORT",
        "VITRINA_SERVER_CORS_ORIGIN",
        "VITRINA_SERVER_STATIC_DIR",
        "VITRINA_DATABASE_DRIVER",
        "VITRINA_DATABASE_URL",
        "VITRINA_AUTH_SESSION_HOURS",
        "VITRINA_AUTH_COOKIE_SECURE",
        "VITRINA_ADMIN_USERNAME",
        "VITRINA_ADMIN_PASSWORD",
        "VITRINA_ADMIN_DISPLAY_NAME",
        "VITRINA_SITE_PUBLIC_URL",
        "VITRINA_MAIL_ENABLED",
        "VITRINA_MAIL_SMTP_HOST",
        "VITRINA_MAIL_SMTP_PORT",
        "VITRINA_MAIL_SMTP_USERNAME",
        "VITRINA_MAIL_SMTP_PASSWORD",
        "VITRINA_MAIL_FROM",
        "VITRINA_MAIL_NOTIFY_TO",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
        guard
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
        assert_eq!(config.database.url, "data/vitrina.db");
        assert_eq!(config.auth.session_hours, 24);
        assert_eq!(config.admin.username, "admin");
        assert!(!config.mail.enabled);
        assert!(config.server.static_dir.is_none());
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "   \n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "database:\n  driver: postgres\n  url: postgres://u:p@db/vitrina\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.database.driver, DatabaseDriver::Postgres);
        assert_eq!(config.database.url, "postgres://u:p@db/vitrina");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.session_hours, 24);
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_contact_url_joins_paths() {
        let site = SiteConfig {
            public_url: "https://agency.example/".to_string(),
            contact_path: "/contacto".to_string(),
        };
        assert_eq!(site.contact_url(), "https://agency.example/contacto");
    }

    #[test]
    fn test_driver_aliases() {
        assert_eq!("supabase".parse::<DatabaseDriver>().unwrap(), DatabaseDriver::Postgres);
        assert_eq!("SQLite".parse::<DatabaseDriver>().unwrap(), DatabaseDriver::Sqlite);
        assert!("mysql".parse::<DatabaseDriver>().is_err());
    }

    #[test]
    fn test_validate_rejects_mail_without_host() {
        let mut config = Config::default();
        config.mail.enabled = true;
        assert!(config.validate().is_err());

        config.mail.smtp_host = "smtp.example.com".to_string();
        config.mail.notify_to = "office@example.com".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_server_and_database() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("VITRINA_SERVER_PORT", "4000");
        std::env::set_var("VITRINA_DATABASE_DRIVER", "supabase");
        std::env::set_var("VITRINA_DATABASE_URL", "postgres://test@localhost/db");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.driver, DatabaseDriver::Postgres);
        assert_eq!(config.database.url, "postgres://test@localhost/db");

        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_override_invalid_values_ignored() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("VITRINA_SERVER_PORT", "not_a_number");
        std::env::set_var("VITRINA_DATABASE_DRIVER", "oracle");
        std::env::set_var("VITRINA_AUTH_COOKIE_SECURE", "maybe");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
        assert!(!config.auth.cookie_secure);

        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_override_admin_and_mail() {
        let _guard = lock_env();

        let file = NamedTempFile::new().unwrap();

        std::env::set_var("VITRINA_ADMIN_USERNAME", "agencia");
        std::env::set_var("VITRINA_ADMIN_PASSWORD", "s3cret!");
        std::env::set_var("VITRINA_MAIL_ENABLED", "true");
        std::env::set_var("VITRINA_MAIL_SMTP_HOST", "smtp.example.com");
        std::env::set_var("VITRINA_MAIL_NOTIFY_TO", "office@example.com");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.admin.username, "agencia");
        assert_eq!(config.admin.password, "s3cret!");
        assert!(config.mail.enabled);
        assert_eq!(config.mail.smtp_host, "smtp.example.com");

        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_config_strategy() -> impl Strategy<Value = Config> {
        (
            "[a-z0-9.]{1,20}",
            1u16..=65535,
            prop_oneof![Just(DatabaseDriver::Sqlite), Just(DatabaseDriver::Postgres)],
            "[a-z/]{1,30}",
            1i64..=720,
            any::<bool>(),
        )
            .prop_map(|(host, port, driver, url, session_hours, cookie_secure)| {
                let mut config = Config::default();
                config.server.host = host;
                config.server.port = port;
                config.database.driver = driver;
                config.database.url = url;
                config.auth.session_hours = session_hours;
                config.auth.cookie_secure = cookie_secure;
                config
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn config_yaml_roundtrip(config in valid_config_strategy()) {
            let yaml = serde_yaml::to_string(&config).unwrap();
            let parsed: Config = serde_yaml::from_str(&yaml).unwrap();

            prop_assert_eq!(parsed.server.host, config.server.host);
            prop_assert_eq!(parsed.server.port, config.server.port);
            prop_assert_eq!(parsed.database.driver, config.database.driver);
            prop_assert_eq!(parsed.database.url, config.database.url);
            prop_assert_eq!(parsed.auth.session_hours, config.auth.session_hours);
            prop_assert_eq!(parsed.auth.cookie_secure, config.auth.cookie_secure);
        }
    }
}
