//! Vendor-specific request payloads and response extraction.

use livevlm_types::{ProviderKind, QueryRequest};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};

/// The Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Frames are always sent as JPEG.
const IMAGE_MEDIA_TYPE: &str = "image/jpeg";

/// A ready-to-send vendor request.
#[derive(Debug)]
pub(crate) struct VendorCall {
    pub url: String,
    pub headers: HeaderMap,
    /// Query-string parameters. Kept apart from `url` so secrets never reach logs.
    pub query: Vec<(&'static str, String)>,
    pub body: Value,
}

/// Build the HTTP call for `request` against `base_url`.
///
/// Fails only when the API key cannot be carried in a header.
pub(crate) fn build_call(
    provider: ProviderKind,
    base_url: &str,
    api_key: &str,
    request: &QueryRequest,
) -> Result<VendorCall, String> {
    let base_url = base_url.trim_end_matches('/');
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let call = match provider {
        ProviderKind::OpenAi => {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {api_key}"))?);
            VendorCall {
                url: format!("{base_url}/v1/chat/completions"),
                headers,
                query: Vec::new(),
                body: openai_body(request),
            }
        }
        ProviderKind::Anthropic => {
            headers.insert("x-api-key", header_value(api_key)?);
            headers.insert(
                "anthropic-version",
                HeaderValue::from_static(ANTHROPIC_VERSION),
            );
            VendorCall {
                url: format!("{base_url}/v1/messages"),
                headers,
                query: Vec::new(),
                body: anthropic_body(request),
            }
        }
        ProviderKind::Google => VendorCall {
            url: format!(
                "{base_url}/v1beta/models/{}:generateContent",
                request.model
            ),
            headers,
            query: vec![("key", api_key.to_string())],
            body: google_body(request),
        },
    };
    Ok(call)
}

fn header_value(value: &str) -> Result<HeaderValue, String> {
    HeaderValue::from_str(value).map_err(|_| "Invalid API key format".to_string())
}

fn openai_body(request: &QueryRequest) -> Value {
    let content = match &request.image {
        Some(image) => json!([
            {"type": "text", "text": request.prompt},
            {
                "type": "image_url",
                "image_url": {"url": format!("data:{IMAGE_MEDIA_TYPE};base64,{image}")}
            }
        ]),
        None => json!(request.prompt),
    };
    json!({
        "model": request.model,
        "messages": [{"role": "user", "content": content}],
        "max_tokens": request.settings.max_tokens,
        "temperature": request.settings.temperature,
    })
}

fn anthropic_body(request: &QueryRequest) -> Value {
    let content = match &request.image {
        Some(image) => json!([
            {"type": "text", "text": request.prompt},
            {
                "type": "image",
                "source": {"type": "base64", "media_type": IMAGE_MEDIA_TYPE, "data": image}
            }
        ]),
        None => json!(request.prompt),
    };
    json!({
        "model": request.model,
        "max_tokens": request.settings.max_tokens,
        "temperature": request.settings.temperature,
        "messages": [{"role": "user", "content": content}],
    })
}

fn google_body(request: &QueryRequest) -> Value {
    let mut parts = vec![json!({"text": request.prompt})];
    if let Some(image) = &request.image {
        parts.push(json!({"inline_data": {"mime_type": IMAGE_MEDIA_TYPE, "data": image}}));
    }
    json!({
        "contents": [{"parts": parts}],
        "generationConfig": {
            "maxOutputTokens": request.settings.max_tokens,
            "temperature": request.settings.temperature,
        },
    })
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: GoogleContent,
}

#[derive(Deserialize)]
struct GoogleContent {
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
}

/// Pull the answer text out of a successful response body.
pub(crate) fn extract_text(provider: ProviderKind, body: &str) -> Result<String, String> {
    let text = match provider {
        ProviderKind::OpenAi => parse::<OpenAiResponse>(body)?
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content),
        ProviderKind::Anthropic => parse::<AnthropicResponse>(body)?
            .content
            .into_iter()
            .next()
            .and_then(|b| b.text),
        ProviderKind::Google => parse::<GoogleResponse>(body)?
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text),
    };
    text.ok_or_else(|| "Response contained no text".to_string())
}

fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, String> {
    serde_json::from_str(body).map_err(|e| format!("Malformed response body: {e}"))
}
