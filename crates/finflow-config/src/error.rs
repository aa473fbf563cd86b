//! Error types for finflow-config
//!
//! Config errors only ever surface once, at startup, so the interesting part
//! is [`ConfigError::to_details`]: a code, the failing field and a hint on how
//! to fix the file.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Could not read {path}: {message}")]
    Io { path: String, message: String },

    /// Carries the parser's own message, which includes line and column
    #[error("Invalid YAML: {message}")]
    InvalidYaml { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field value: {field} - {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unusable configuration: {message}")]
    Unusable { message: String },
}

impl ConfigError {
    /// Stable code printed in front of the message
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::FileNotFound { .. } => "FILE_NOT_FOUND",
            ConfigError::Io { .. } => "IO_ERROR",
            ConfigError::InvalidYaml { .. } => "INVALID_YAML",
            ConfigError::MissingField { .. } => "MISSING_FIELD",
            ConfigError::InvalidValue { .. } => "INVALID_VALUE",
            ConfigError::Unusable { .. } => "UNUSABLE_CONFIG",
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::MissingField { field } | ConfigError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            ConfigError::FileNotFound { .. } => Some(
                "Point --config at the file, or run with --print-default-config for a template.".to_string(),
            ),
            ConfigError::MissingField { field } => Some(format!("Add '{}' to the config file.", field)),
            ConfigError::InvalidYaml { .. } => {
                Some("Compare the file with the output of --print-default-config.".to_string())
            }
            ConfigError::Io { .. } | ConfigError::InvalidValue { .. } | ConfigError::Unusable { .. } => None,
        }
    }

    pub fn to_details(&self) -> ConfigErrorDetails {
        ConfigErrorDetails {
            code: self.code(),
            message: self.to_string(),
            field: self.field().map(str::to_string),
            hint: self.hint(),
        }
    }
}

/// What the binary prints when loading fails
#[derive(Debug, Clone)]
pub struct ConfigErrorDetails {
    pub code: &'static str,
    pub message: String,
    pub field: Option<String>,
    pub hint: Option<String>,
}

impl std::fmt::Display for ConfigErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(field) = &self.field {
            write!(f, "\nField: {}", field)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\nHint: {}", hint)?;
        }
        Ok(())
    }
}
