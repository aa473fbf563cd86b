//! Configuration management for finflow
//!
//! This module handles loading, validation, and management of
//! finflow configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Auth provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Base URL of the auth provider (e.g. `https://xyz.supabase.co`)
    #[serde(default)]
    pub url: String,
    /// Public (anon) key sent as the `apikey` header
    #[serde(default)]
    pub anon_key: String,
}

/// Bookkeeping API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the bookkeeping API
    #[serde(default)]
    pub base_url: String,
    /// Timeout applied to every outgoing request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where the dashboard reads transactions from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSourceKind {
    /// `GET {api.base_url}/transactions`
    Api,
    /// The auth provider's REST table endpoint
    Table,
}

impl Default for TransactionSourceKind {
    fn default() -> Self {
        TransactionSourceKind::Api
    }
}

impl std::str::FromStr for TransactionSourceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(TransactionSourceKind::Api),
            "table" => Ok(TransactionSourceKind::Table),
            _ => Err(format!("Invalid transaction source: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionSourceKind::Api => write!(f, "api"),
            TransactionSourceKind::Table => write!(f, "table"),
        }
    }
}

/// Transaction source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsConfig {
    #[serde(default)]
    pub source: TransactionSourceKind,
    /// Table name, used when `source` is `table`
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for TransactionsConfig {
    fn default() -> Self {
        Self {
            source: TransactionSourceKind::Api,
            table: default_table(),
        }
    }
}

fn default_table() -> String {
    "transactions".to_string()
}

/// Statement upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Path appended to `api.base_url`
    #[serde(default = "default_upload_path")]
    pub path: String,
    /// File name patterns accepted for upload
    #[serde(default = "default_accept")]
    pub accept: Vec<String>,
    /// Largest accepted file, in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            accept: default_accept(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_upload_path() -> String {
    "/upload-statement".to_string()
}

fn default_accept() -> Vec<String> {
    vec!["*.csv".to_string(), "*.xlsx".to_string()]
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

/// Session cookie and route protection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie carrying the access token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Where unauthenticated visitors are sent
    #[serde(default = "default_signin_path")]
    pub signin_path: String,
    /// Path prefixes that require a session cookie
    #[serde(default = "default_protected_paths")]
    pub protected_paths: Vec<String>,
    /// Mark the session cookie `Secure`
    #[serde(default = "default_false")]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            signin_path: default_signin_path(),
            protected_paths: default_protected_paths(),
            secure_cookie: false,
        }
    }
}

fn default_cookie_name() -> String {
    "sb-access-token".to_string()
}

fn default_signin_path() -> String {
    "/login".to_string()
}

fn default_protected_paths() -> Vec<String> {
    vec!["/dashboard".to_string()]
}

fn default_false() -> bool {
    false
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Symbol printed before amounts
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimal_places: default_decimal_places(),
        }
    }
}

fn default_symbol() -> String {
    "R".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Auth provider settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Bookkeeping API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Transaction source settings
    #[serde(default)]
    pub transactions: TransactionsConfig,
    /// Statement upload settings
    #[serde(default)]
    pub upload: UploadConfig,
    /// Session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file without blocking the runtime
    pub async fn load_async(path: PathBuf) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Self::read_error(&path, e))?;
        Self::from_yaml(&content)
    }

    fn read_error(path: &Path, e: std::io::Error) -> ConfigError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            ConfigError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        }
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.auth.url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "auth.url".to_string(),
            });
        }

        if self.api.base_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "api.base_url".to_string(),
            });
        }

        for (field, url) in [("auth.url", &self.auth.url), ("api.base_url", &self.api.base_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "URL must start with http:// or https://".to_string(),
                });
            }
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if !self.upload.path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "upload.path".to_string(),
                reason: "Upload path must start with '/'".to_string(),
            });
        }

        if self.upload.accept.is_empty() {
            return Err(ConfigError::Unusable {
                message: "upload.accept lists no file patterns, every upload would be rejected".to_string(),
            });
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "session.cookie_name".to_string(),
            });
        }

        if !self.session.signin_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "session.signin_path".to_string(),
                reason: "Sign-in path must start with '/'".to_string(),
            });
        }

        // A protected sign-in page would redirect to itself forever
        if self.is_protected(&self.session.signin_path) {
            return Err(ConfigError::InvalidValue {
                field: "session.protected_paths".to_string(),
                reason: "The sign-in path must not be protected".to_string(),
            });
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Check whether a request path requires a session
    pub fn is_protected(&self, path: &str) -> bool {
        self.session
            .protected_paths
            .iter()
            .any(|prefix| path == prefix || path.starts_with(&format!("{}/", prefix.trim_end_matches('/'))))
    }

    /// Full URL of the statement upload endpoint
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.api.base_url.trim_end_matches('/'), self.upload.path)
    }
}

// ==================== Tests ====================
