//! Activity summaries and the deterministic fallback used when the
//! summarizing model is unavailable.

use livevlm_types::QueryFuture;

/// Returned when a session has no frames at all.
pub const NO_FRAMES_MESSAGE: &str = "No video frames have been processed yet. Start the camera and begin analysis to generate a summary.";

const NO_RECENT_FRAMES_MESSAGE: &str =
    "No recent frames available for summary. Try processing more video frames first.";

/// Caller-selected options for a summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRequest {
    /// Model to try first. Other text-capable models are tried after it.
    pub model: Option<String>,
    /// Replaces the built-in summary instructions.
    pub prompt: Option<String>,
    /// Skip the summary cache.
    pub force_update: bool,
}

impl SummaryRequest {
    pub fn forced(model: Option<String>, prompt: Option<String>) -> Self {
        Self {
            model,
            prompt,
            force_update: true,
        }
    }

    /// Whether two requests would produce the same summary.
    pub(crate) fn same_target(&self, other: &SummaryRequest) -> bool {
        self.model == other.model && self.prompt == other.prompt
    }
}

/// Produces a natural-language summary from raw frame responses.
pub trait Summarizer: Send + Sync {
    fn summarize<'a>(
        &'a self,
        responses: &'a [String],
        request: &'a SummaryRequest,
    ) -> QueryFuture<'a>;
}

/// Join the responses into a single paragraph: `"a. b."` for `["a", "b"]`.
pub fn template_summary(responses: &[String]) -> String {
    if responses.is_empty() {
        return NO_RECENT_FRAMES_MESSAGE.to_string();
    }
    format!("{}.", responses.join(". "))
}

/// Ask the summarizer, degrading to [`template_summary`] on any failure.
pub async fn summarize_or_fallback(
    summarizer: &dyn Summarizer,
    responses: &[String],
    request: &SummaryRequest,
) -> String {
    if responses.is_empty() {
        return NO_RECENT_FRAMES_MESSAGE.to_string();
    }
    match summarizer.summarize(responses, request).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!("Summary generation failed, using template summary: {e}");
            template_summary(responses)
        }
    }
}
