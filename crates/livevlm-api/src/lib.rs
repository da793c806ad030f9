//! HTTP model gateway for OpenAI, Anthropic and Google vision models.

mod client;
mod provider;
mod retry;

pub use client::{Credentials, DEFAULT_TIMEOUT_SECS, GatewayConfig, HttpGateway};
pub use retry::RetryConfig;
