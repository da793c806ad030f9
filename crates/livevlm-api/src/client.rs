//! reqwest-backed model gateway.

use std::time::Duration;

use livevlm_types::{
    GatewayError, ModelGateway, ModelRegistry, ProviderKind, QueryFuture, QueryRequest,
    is_usable_api_key, log_preview,
};
use reqwest::header::HeaderMap;

use crate::provider::{self, VendorCall};
use crate::retry::{RetryConfig, calculate_delay, is_retryable};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Per-vendor API keys. Empty and placeholder keys count as absent.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub google: Option<String>,
}

impl Credentials {
    pub fn get(&self, provider: ProviderKind) -> Option<&str> {
        let key = match provider {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Google => &self.google,
        };
        key.as_deref().filter(|k| is_usable_api_key(k))
    }
}

/// Connection settings for [`HttpGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub credentials: Credentials,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub google_base_url: String,
    /// Bound on each HTTP attempt.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            openai_base_url: ProviderKind::OpenAi.default_base_url().to_string(),
            anthropic_base_url: ProviderKind::Anthropic.default_base_url().to_string(),
            google_base_url: ProviderKind::Google.default_base_url().to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    pub fn base_url(&self, provider: ProviderKind) -> &str {
        match provider {
            ProviderKind::OpenAi => &self.openai_base_url,
            ProviderKind::Anthropic => &self.anthropic_base_url,
            ProviderKind::Google => &self.google_base_url,
        }
    }
}

/// Model gateway that talks to the OpenAI, Anthropic and Google REST APIs.
#[derive(Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    config: GatewayConfig,
    registry: ModelRegistry,
    retry_config: RetryConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Upstream {
                provider: "http".into(),
                status: None,
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            config,
            registry: ModelRegistry::builtin(),
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the retry configuration for transient errors (429, 5xx, network, timeout).
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Route `request` to its vendor and return the answer text.
    pub async fn send_query(&self, request: &QueryRequest) -> Result<String, GatewayError> {
        let unsupported = || GatewayError::UnsupportedModel {
            model: request.model.clone(),
        };
        let info = self.registry.get(&request.model).ok_or_else(unsupported)?;
        let capable = if request.is_text_only() {
            info.supports_text
        } else {
            info.supports_images
        };
        if !capable {
            return Err(unsupported());
        }

        let provider = info.provider;
        let api_key =
            self.config
                .credentials
                .get(provider)
                .ok_or_else(|| GatewayError::MissingCredential {
                    provider: provider.to_string(),
                })?;

        let call = provider::build_call(provider, self.config.base_url(provider), api_key, request)
            .map_err(|message| upstream(provider, None, message))?;
        let body = self.send_with_retry(provider, &call).await?;

        let text = provider::extract_text(provider, &body).map_err(|message| {
            tracing::warn!(
                "Unexpected {provider} response body: {}",
                log_preview(&body, 200)
            );
            upstream(provider, None, message)
        })?;
        tracing::debug!(
            "{} answered in {} chars: {}",
            request.model,
            text.chars().count(),
            log_preview(&text, 80)
        );
        Ok(text)
    }

    /// POST `call`, retrying transient failures. Returns the raw 2xx body.
    async fn send_with_retry(
        &self,
        provider: ProviderKind,
        call: &VendorCall,
    ) -> Result<String, GatewayError> {
        let max_retries = self.retry_config.max_retries;
        let mut attempt = 0;

        loop {
            tracing::debug!("POST {} (attempt {}/{})", call.url, attempt + 1, max_retries + 1);

            let result = self
                .http
                .post(&call.url)
                .headers(call.headers.clone())
                .query(&call.query)
                .json(&call.body)
                .send()
                .await;

            let (err, retry_after) = match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .text()
                            .await
                            .map_err(|e| transport_error(provider, e));
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body_text = response.text().await.unwrap_or_default();
                    (
                        classify_error(provider, status.as_u16(), &body_text),
                        retry_after,
                    )
                }
                Err(e) => (transport_error(provider, e), None),
            };

            if !is_retryable(&err) || attempt >= max_retries {
                tracing::warn!("{provider} request failed: {err}");
                return Err(err);
            }

            let delay = calculate_delay(&self.retry_config, attempt, retry_after);
            tracing::warn!(
                "Retryable {provider} error (attempt {}/{}): {err}. Retrying in {delay}ms...",
                attempt + 1,
                max_retries + 1,
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;
            attempt += 1;
        }
    }
}

impl ModelGateway for HttpGateway {
    fn query<'a>(&'a self, request: &'a QueryRequest) -> QueryFuture<'a> {
        Box::pin(self.send_query(request))
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn upstream(provider: ProviderKind, status: Option<u16>, message: String) -> GatewayError {
    GatewayError::Upstream {
        provider: provider.to_string(),
        status,
        message,
    }
}

fn transport_error(provider: ProviderKind, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout {
            provider: provider.to_string(),
        }
    } else {
        upstream(provider, None, e.to_string())
    }
}

/// Parse the `retry-after` header value as seconds and convert to milliseconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| (secs * 1000.0) as u64)
}

/// Turn a non-2xx response into an `Upstream` error carrying the vendor's
/// own message when the body has one.
///
/// All three vendors nest it as `{"error": {"message": ...}}`.
fn classify_error(provider: ProviderKind, status: u16, body: &str) -> GatewayError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| log_preview(body, 200));

    upstream(provider, Some(status), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use livevlm_types::QuerySettings;
    use reqwest::header::HeaderValue;

    #[test]
    fn parse_retry_after_values() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert("retry-after", HeaderValue::from_static("5"));
        assert_eq!(parse_retry_after(&headers), Some(5000));

        headers.insert("retry-after", HeaderValue::from_static("1.5"));
        assert_eq!(parse_retry_after(&headers), Some(1500));

        headers.insert("retry-after", HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn classify_uses_vendor_message() {
        let err = classify_error(
            ProviderKind::OpenAi,
            401,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        match err {
            GatewayError::Upstream {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(status, Some(401));
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn classify_falls_back_to_raw_body() {
        let err = classify_error(ProviderKind::Google, 502, "Bad Gateway");
        assert_eq!(err.to_string(), "google API error (502): Bad Gateway");
    }

    #[test]
    fn placeholder_credentials_are_absent() {
        let creds = Credentials {
            openai: Some("your-openai-api-key".into()),
            anthropic: Some(String::new()),
            google: Some("g-key".into()),
        };
        assert_eq!(creds.get(ProviderKind::OpenAi), None);
        assert_eq!(creds.get(ProviderKind::Anthropic), None);
        assert_eq!(creds.get(ProviderKind::Google), Some("g-key"));
    }

    #[test]
    fn default_config_points_at_public_apis() {
        let config = GatewayConfig::default();
        assert_eq!(
            config.base_url(ProviderKind::Anthropic),
            "https://api.anthropic.com"
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn unknown_model_is_unsupported() {
        let gateway = HttpGateway::new(GatewayConfig::default()).unwrap();
        let request = QueryRequest::with_image("gpt-9", "aGk=", "hi", QuerySettings::default());
        let err = gateway.query(&request).await.unwrap_err();
        assert_eq!(err.kind(), "unsupported-model");
        assert_eq!(err.to_string(), "Model gpt-9 not supported");
    }

    #[tokio::test]
    async fn missing_key_is_reported_before_any_request() {
        let gateway = HttpGateway::new(GatewayConfig::default()).unwrap();
        let request =
            QueryRequest::with_image("claude-3-haiku", "aGk=", "hi", QuerySettings::default());
        let err = gateway.query(&request).await.unwrap_err();
        assert_eq!(err.kind(), "missing-credential");
        assert_eq!(err.to_string(), "API key not configured for anthropic");
    }
}
