//! Multi-tier TOML configuration for LiveVLM.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > `~/.livevlm/config.toml` > defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use livevlm_api::{Credentials, DEFAULT_TIMEOUT_SECS, GatewayConfig, RetryConfig};
use livevlm_history::EngineConfig;
use livevlm_history::engine::{
    DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_AGE_MINUTES, DEFAULT_MAX_FRAMES, DEFAULT_SUMMARY_WINDOW,
};
use livevlm_types::{ConfigError, DEFAULT_MODEL, ProviderKind, is_usable_api_key};
use serde::{Deserialize, Serialize};

/// Largest accepted context or summary window.
pub const MAX_WINDOW: usize = 50;

/// Resolved configuration for a LiveVLM process.
#[derive(Debug, Clone)]
pub struct VlmConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub google_base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub context_window: usize,
    pub summary_window: usize,
    pub max_frames: usize,
    pub max_age_minutes: i64,
    pub retain_images: bool,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub history: HistorySettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub google_base_url: Option<String>,
    pub default_model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySettings {
    pub context_window: Option<usize>,
    pub summary_window: Option<usize>,
    pub max_frames: Option<usize>,
    pub max_age_minutes: Option<i64>,
    pub retain_images: Option<bool>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub context_window: Option<usize>,
    pub summary_window: Option<usize>,
    pub retain_images: Option<bool>,
}

impl VlmConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (~/.livevlm/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));
        resolve(overrides, |name| std::env::var(name).ok(), settings, config_dir)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            credentials: Credentials {
                openai: self.openai_api_key.clone(),
                anthropic: self.anthropic_api_key.clone(),
                google: self.google_api_key.clone(),
            },
            openai_base_url: self.openai_base_url.clone(),
            anthropic_base_url: self.anthropic_base_url.clone(),
            google_base_url: self.google_base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            ..RetryConfig::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_frames: self.max_frames,
            max_age: TimeDelta::minutes(self.max_age_minutes),
            context_window: self.context_window,
            summary_window: self.summary_window,
            retain_images: self.retain_images,
        }
    }

    /// Providers with a usable API key.
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        [
            (ProviderKind::OpenAi, &self.openai_api_key),
            (ProviderKind::Anthropic, &self.anthropic_api_key),
            (ProviderKind::Google, &self.google_api_key),
        ]
        .into_iter()
        .filter(|(_, key)| key.is_some())
        .map(|(provider, _)| provider)
        .collect()
    }
}

fn resolve(
    overrides: CliOverrides,
    env: impl Fn(&str) -> Option<String>,
    settings: SettingsFile,
    config_dir: PathBuf,
) -> Result<VlmConfig, ConfigError> {
    let api = settings.api;
    let history = settings.history;

    // API keys: env > config file; placeholders count as unset
    let key = |var: &str, file: Option<String>| {
        env(var).or(file).filter(|k| {
            let usable = is_usable_api_key(k);
            if !usable {
                tracing::warn!("Ignoring placeholder value for {var}");
            }
            usable
        })
    };
    let openai_api_key = key("OPENAI_API_KEY", api.openai_api_key);
    let anthropic_api_key = key("ANTHROPIC_API_KEY", api.anthropic_api_key);
    let google_api_key = key("GOOGLE_API_KEY", api.google_api_key);

    let base_url = |var: &str, file: Option<String>, provider: ProviderKind| {
        env(var)
            .or(file)
            .unwrap_or_else(|| provider.default_base_url().to_string())
    };
    let openai_base_url = base_url(
        "OPENAI_API_BASE_URL",
        api.openai_base_url,
        ProviderKind::OpenAi,
    );
    let anthropic_base_url = base_url(
        "ANTHROPIC_API_BASE_URL",
        api.anthropic_base_url,
        ProviderKind::Anthropic,
    );
    let google_base_url = base_url(
        "GOOGLE_API_BASE_URL",
        api.google_base_url,
        ProviderKind::Google,
    );

    // Model: CLI > env > config file
    let model = overrides
        .model
        .or_else(|| env("LIVEVLM_MODEL"))
        .or(api.default_model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let timeout_secs = api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(invalid("api.timeout_secs", "must be at least 1"));
    }

    let context_window = overrides
        .context_window
        .or(history.context_window)
        .unwrap_or(DEFAULT_CONTEXT_WINDOW);
    check_window("context_window", context_window)?;

    let summary_window = overrides
        .summary_window
        .or(history.summary_window)
        .unwrap_or(DEFAULT_SUMMARY_WINDOW);
    check_window("summary_window", summary_window)?;

    let max_frames = history.max_frames.unwrap_or(DEFAULT_MAX_FRAMES);
    if max_frames == 0 {
        return Err(invalid("history.max_frames", "must be at least 1"));
    }

    let max_age_minutes = history.max_age_minutes.unwrap_or(DEFAULT_MAX_AGE_MINUTES);
    if max_age_minutes < 1 {
        return Err(invalid("history.max_age_minutes", "must be at least 1"));
    }

    Ok(VlmConfig {
        openai_api_key,
        anthropic_api_key,
        google_api_key,
        openai_base_url,
        anthropic_base_url,
        google_base_url,
        model,
        timeout_secs,
        max_retries: api
            .max_retries
            .unwrap_or_else(|| RetryConfig::default().max_retries),
        context_window,
        summary_window,
        max_frames,
        max_age_minutes,
        retain_images: overrides
            .retain_images
            .or(history.retain_images)
            .unwrap_or(false),
        config_dir,
    })
}

fn check_window(key: &str, value: usize) -> Result<(), ConfigError> {
    if (1..=MAX_WINDOW).contains(&value) {
        Ok(())
    } else {
        Err(invalid(
            key,
            &format!("must be between 1 and {MAX_WINDOW}, got {value}"),
        ))
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Get the LiveVLM config directory path (~/.livevlm/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LIVEVLM_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".livevlm")
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}
