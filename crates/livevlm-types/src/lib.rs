//! Shared types, model registry, and error hierarchy for LiveVLM.

pub mod error;
pub mod frame;
pub mod gateway;
pub mod models;
pub mod settings;
pub mod util;

pub use error::{ConfigError, GatewayError, VlmError};
pub use frame::FrameRecord;
pub use gateway::{ModelGateway, QueryFuture, QueryRequest};
pub use models::{DEFAULT_MODEL, ModelInfo, ModelRegistry, ProviderKind};
pub use settings::QuerySettings;
pub use util::{is_usable_api_key, log_preview};
