//! The model query seam between the core and vendor APIs.

use crate::{GatewayError, QuerySettings};
use std::future::Future;
use std::pin::Pin;

/// A boxed future resolving to the model's text answer.
pub type QueryFuture<'a> = Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>>;

/// A provider-neutral, single-turn model query.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub model: String,
    /// Base64-encoded image. `None` for text-only queries.
    pub image: Option<String>,
    pub prompt: String,
    pub settings: QuerySettings,
}

impl QueryRequest {
    pub fn with_image(
        model: impl Into<String>,
        image_b64: impl Into<String>,
        prompt: impl Into<String>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            model: model.into(),
            image: Some(image_b64.into()),
            prompt: prompt.into(),
            settings,
        }
    }

    pub fn text_only(
        model: impl Into<String>,
        prompt: impl Into<String>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            model: model.into(),
            image: None,
            prompt: prompt.into(),
            settings,
        }
    }

    pub fn is_text_only(&self) -> bool {
        self.image.is_none()
    }
}

/// Dispatches a query to a vendor and returns normalized text.
///
/// Dyn-compatible so the orchestrator can hold an `Arc<dyn ModelGateway>`.
pub trait ModelGateway: Send + Sync {
    fn query<'a>(&'a self, request: &'a QueryRequest) -> QueryFuture<'a>;

    /// Gateway name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn gateway_is_dyn_compatible() {
        fn _accept(_g: &dyn ModelGateway) {}
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Arc<dyn ModelGateway>>();
    }

    #[test]
    fn text_only_request_has_no_image() {
        let req = QueryRequest::text_only("gpt-4o", "summarize", QuerySettings::default());
        assert!(req.is_text_only());
        let req = QueryRequest::with_image("gpt-4o", "aGk=", "what?", QuerySettings::default());
        assert!(!req.is_text_only());
    }
}
