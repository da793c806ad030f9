//! Error hierarchy for LiveVLM.

use thiserror::Error;

/// Top-level error type for all LiveVLM operations.
#[derive(Debug, Error)]
pub enum VlmError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {session_id}")]
    NotFound { session_id: String },

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VlmError {
    /// Stable taxonomy tag for reporting to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            VlmError::InvalidInput(_) => "invalid-input",
            VlmError::NotFound { .. } => "not-found",
            VlmError::Gateway(e) => e.kind(),
            VlmError::Config(_) => "config",
            VlmError::Io(_) => "io",
        }
    }
}

/// Errors from a model query.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Model {model} not supported")]
    UnsupportedModel { model: String },

    #[error("API key not configured for {provider}")]
    MissingCredential { provider: String },

    /// The vendor call failed. `status` is `None` for transport failures and
    /// malformed response bodies.
    #[error("{provider} API error{}: {message}", fmt_status(.status))]
    Upstream {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} request timed out")]
    Timeout { provider: String },
}

impl GatewayError {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::UnsupportedModel { .. } => "unsupported-model",
            GatewayError::MissingCredential { .. } => "missing-credential",
            GatewayError::Upstream { .. } => "upstream-error",
            GatewayError::Timeout { .. } => "timeout",
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
