//! Registry of the vision-language models LiveVLM can route to.

use serde::{Deserialize, Serialize};

/// The model used when a caller does not pick one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Vendor behind a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Google,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
        }
    }

    /// Public API root, without a trailing slash.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Google => "https://generativelanguage.googleapis.com",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Static description of a registered model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: ProviderKind,
    pub description: String,
    pub max_tokens: u32,
    pub supports_images: bool,
    /// Whether the model accepts text-only prompts (used for summaries).
    pub supports_text: bool,
}

impl ModelInfo {
    fn multimodal(
        id: &str,
        name: &str,
        provider: ProviderKind,
        description: &str,
        max_tokens: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            provider,
            description: description.to_string(),
            max_tokens,
            supports_images: true,
            supports_text: true,
        }
    }
}

/// Known models, in registration order.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelInfo>,
    default_model: String,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelInfo>, default_model: impl Into<String>) -> Self {
        Self {
            models,
            default_model: default_model.into(),
        }
    }

    /// The six built-in OpenAI, Anthropic and Google models.
    pub fn builtin() -> Self {
        use ProviderKind::*;
        Self::new(
            vec![
                ModelInfo::multimodal(
                    "gpt-4o",
                    "GPT-4o",
                    OpenAi,
                    "OpenAI's latest multimodal model",
                    4096,
                ),
                ModelInfo::multimodal(
                    "gpt-4o-mini",
                    "GPT-4o Mini",
                    OpenAi,
                    "Faster, more efficient GPT-4o variant",
                    4096,
                ),
                ModelInfo::multimodal(
                    "claude-3-5-sonnet",
                    "Claude 3.5 Sonnet",
                    Anthropic,
                    "Anthropic's latest Claude model",
                    4096,
                ),
                ModelInfo::multimodal(
                    "claude-3-haiku",
                    "Claude 3 Haiku",
                    Anthropic,
                    "Fast and efficient Claude model",
                    4096,
                ),
                ModelInfo::multimodal(
                    "gemini-1.5-flash",
                    "Gemini 1.5 Flash",
                    Google,
                    "Google's fast multimodal model",
                    2048,
                ),
                ModelInfo::multimodal(
                    "gemini-2.0-flash",
                    "Gemini 2.0 Flash",
                    Google,
                    "Google's latest multimodal model",
                    2048,
                ),
            ],
            DEFAULT_MODEL,
        )
    }

    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All models in registration order.
    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Text-capable models in registration order.
    pub fn text_capable(&self) -> impl Iterator<Item = &ModelInfo> {
        self.models.iter().filter(|m| m.supports_text)
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
