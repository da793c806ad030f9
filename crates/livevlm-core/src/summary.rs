//! Summary generation on top of the model gateway.

use std::sync::Arc;

use livevlm_history::{SummaryRequest, Summarizer};
use livevlm_types::{
    GatewayError, ModelGateway, ModelRegistry, QueryFuture, QueryRequest, QuerySettings,
};

const SUMMARY_PROMPT_HEADER: &str = "Based on the following video frame analyses, provide a concise summary of what happened in the video:";

const SUMMARY_PROMPT_TASK: &str = "TASK: Provide a 3-5 sentence summary that describes what happened in the video. Focus on the actions, movements, and events that occurred. Be specific about what you can see happening.

What story does this video tell? What actually happened?";

/// Summarizes frame responses with text-only model queries.
///
/// Candidates are tried in order and the first answer wins: the requested
/// model (when registered and text-capable), then every other text-capable
/// model in registration order. A blank answer counts as a failure.
pub struct SummaryGenerator {
    gateway: Arc<dyn ModelGateway>,
    registry: ModelRegistry,
}

impl SummaryGenerator {
    pub fn new(gateway: Arc<dyn ModelGateway>, registry: ModelRegistry) -> Self {
        Self { gateway, registry }
    }

    /// Models to try, in order.
    pub fn candidates(&self, requested: Option<&str>) -> Vec<String> {
        let first = requested.filter(|id| {
            self.registry
                .get(id)
                .is_some_and(|info| info.supports_text)
        });
        if let Some(id) = requested {
            if first.is_none() {
                tracing::warn!("Model {id} cannot be used for text summaries; using fallbacks");
            }
        }

        first
            .map(str::to_string)
            .into_iter()
            .chain(
                self.registry
                    .text_capable()
                    .filter(|info| Some(info.id.as_str()) != first)
                    .map(|info| info.id.clone()),
            )
            .collect()
    }

    async fn generate(
        &self,
        responses: &[String],
        request: &SummaryRequest,
    ) -> Result<String, GatewayError> {
        let prompt = build_summary_prompt(responses, request.prompt.as_deref());
        let settings = QuerySettings::for_summary();
        let mut last_error = None;

        for model in self.candidates(request.model.as_deref()) {
            let query = QueryRequest::text_only(&model, prompt.as_str(), settings);
            match self.gateway.query(&query).await {
                Ok(text) if text.trim().is_empty() => {
                    tracing::warn!("Summary with {model} came back empty");
                    last_error = Some(GatewayError::Upstream {
                        provider: model.clone(),
                        status: None,
                        message: "empty summary".to_string(),
                    });
                }
                Ok(text) => {
                    tracing::info!("Generated summary with {model}");
                    return Ok(text.trim().to_string());
                }
                Err(e) => {
                    tracing::warn!("Summary with {model} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| GatewayError::UnsupportedModel {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| "text-capable model".to_string()),
        }))
    }
}

impl Summarizer for SummaryGenerator {
    fn summarize<'a>(
        &'a self,
        responses: &'a [String],
        request: &'a SummaryRequest,
    ) -> QueryFuture<'a> {
        Box::pin(self.generate(responses, request))
    }
}

/// The text-only prompt sent to the summarizing model.
pub fn build_summary_prompt(responses: &[String], custom_prompt: Option<&str>) -> String {
    let analyses = responses.join("\n");
    match custom_prompt {
        Some(custom) => format!("{custom}\n\n{analyses}"),
        None => format!(
            "{SUMMARY_PROMPT_HEADER}\n\nFRAME ANALYSES:\n{analyses}\n\n{SUMMARY_PROMPT_TASK}"
        ),
    }
}
