//! Session orchestration: resolve the session, enrich the prompt, query the
//! model, record the result.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;

use livevlm_history::{
    EngineConfig, HistoryEngine, SessionStats, SessionStore, SummaryPlan, SummaryRequest,
    Summarizer, TemporalContext, summarize_or_fallback,
};
use livevlm_types::{
    DEFAULT_MODEL, FrameRecord, ModelGateway, ModelRegistry, QueryRequest, QuerySettings,
    VlmError, log_preview,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::summary::SummaryGenerator;

pub const DEFAULT_PROMPT: &str = "What is in this image?";

/// Accepted context and summary window sizes.
pub const WINDOW_RANGE: RangeInclusive<usize> = 1..=50;

/// Returned by [`SessionOrchestrator::general_summary`] for unknown sessions.
pub const NO_SESSION_DATA_MESSAGE: &str =
    "No session data available for summary. Please start a session and process some frames first.";

/// One inbound frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRequest {
    #[serde(default = "default_model")]
    pub model: String,
    /// Base64-encoded JPEG.
    pub image: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default)]
    pub settings: QuerySettings,
    /// Unknown ids start a session under that id; `None` starts a fresh one.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_true")]
    pub use_temporal_context: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_true() -> bool {
    true
}

impl FrameRequest {
    pub fn new(
        model: impl Into<String>,
        image_b64: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            image: image_b64.into(),
            prompt: prompt.into(),
            settings: QuerySettings::default(),
            session_id: None,
            use_temporal_context: true,
        }
    }

    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn without_temporal_context(mut self) -> Self {
        self.use_temporal_context = false;
        self
    }
}

/// The envelope returned for a processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub response: String,
    pub model: String,
    /// Seconds spent in the model call.
    pub processing_time: f64,
    pub session_id: String,
    pub frame_id: Uuid,
    /// The caller's prompt, without temporal context.
    pub prompt: String,
    /// Context the prompt was enriched with, when temporal context was on.
    pub temporal_context: Option<TemporalContext>,
    pub detected_objects: Vec<String>,
}

/// Ties the session store, the model gateway and summaries together.
///
/// Every method takes `&self`. Locks are never held across a model call:
/// sessions are looked up again by id once the call returns.
pub struct SessionOrchestrator {
    store: Mutex<SessionStore>,
    /// Receives every frame from every session; used for session-less summaries.
    default_history: Mutex<HistoryEngine>,
    gateway: Arc<dyn ModelGateway>,
    summarizer: Arc<dyn Summarizer>,
}

impl SessionOrchestrator {
    /// Build an orchestrator whose summaries go through `gateway`, trying the
    /// text-capable models of `registry`.
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        registry: ModelRegistry,
        defaults: EngineConfig,
    ) -> Self {
        let summarizer = Arc::new(SummaryGenerator::new(Arc::clone(&gateway), registry));
        Self {
            store: Mutex::new(SessionStore::new(defaults.clone())),
            default_history: Mutex::new(HistoryEngine::new(defaults)),
            gateway,
            summarizer,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    /// Start (or restart) a session and return its id.
    pub fn start_session(&self, session_id: Option<String>) -> String {
        self.store.lock().start_session(session_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.store.lock().session_ids()
    }

    /// Process one frame end to end.
    ///
    /// Gateway failures are returned unchanged and leave no trace in any
    /// history or in the session store.
    pub async fn process_frame(&self, request: FrameRequest) -> Result<FrameResult, VlmError> {
        request.settings.validate()?;
        if request.image.trim().is_empty() {
            return Err(VlmError::InvalidInput("image payload is empty".into()));
        }

        // The session is only created once the model call succeeds; until then
        // an unknown id is served from an empty engine.
        let (session_id, enhanced_prompt, temporal_context) = {
            let mut store = self.store.lock();
            let session_id = request
                .session_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let defaults = store.defaults().clone();
            let mut scratch;
            let engine = match store.get_mut(&session_id) {
                Some(engine) => engine,
                None => {
                    scratch = HistoryEngine::new(defaults);
                    &mut scratch
                }
            };

            if request.use_temporal_context {
                let prompt = engine.enhance_prompt(&request.prompt, true);
                let context = engine.temporal_context(false);
                (session_id, prompt, Some(context))
            } else {
                (session_id, request.prompt.clone(), None)
            }
        };

        tracing::debug!(
            "Querying {} for session {session_id} ({} context responses)",
            request.model,
            temporal_context
                .as_ref()
                .map_or(0, |c| c.recent_responses.len())
        );

        let query = QueryRequest::with_image(
            &request.model,
            request.image.as_str(),
            enhanced_prompt,
            request.settings,
        );
        let started = Instant::now();
        let response = self.gateway.query(&query).await?;
        let processing_time = started.elapsed().as_secs_f64();

        let record = FrameRecord::new(request.prompt.as_str(), &request.model, response.as_str())
            .with_image(request.image)
            .with_processing_time(processing_time);
        let frame_id = record.frame_id;

        {
            let mut store = self.store.lock();
            if !store.contains(&session_id) {
                store.start_session(Some(session_id.clone()));
            }
            if let Some(engine) = store.get_mut(&session_id) {
                engine.add_frame(record.clone());
                tracing::info!(
                    "Added frame to session {session_id}. Total frames: {}",
                    engine.len()
                );
            }
        }
        self.default_history.lock().add_frame(record);

        tracing::debug!(
            "Frame {frame_id} processed in {processing_time:.2}s: {}",
            log_preview(&response, 80)
        );

        Ok(FrameResult {
            response,
            model: request.model,
            processing_time,
            session_id,
            frame_id,
            prompt: request.prompt,
            temporal_context,
            detected_objects: Vec::new(),
        })
    }

    pub fn session_stats(&self, session_id: &str) -> Result<SessionStats, VlmError> {
        self.store
            .lock()
            .stats(session_id)
            .ok_or_else(|| not_found(session_id))
    }

    /// Reset a session's history. The session id stays valid.
    pub fn clear_session(&self, session_id: &str) -> Result<(), VlmError> {
        if self.store.lock().clear(session_id) {
            Ok(())
        } else {
            Err(not_found(session_id))
        }
    }

    /// Every retained frame of a session, oldest first.
    pub fn export_session(&self, session_id: &str) -> Result<Vec<FrameRecord>, VlmError> {
        self.store
            .lock()
            .get(session_id)
            .map(HistoryEngine::export)
            .ok_or_else(|| not_found(session_id))
    }

    /// Summarize a session, or every frame seen when `session_id` is `None`.
    ///
    /// Always regenerated. Never fails: summarizer errors degrade to a
    /// template summary and unknown sessions get an explanatory message.
    pub async fn general_summary(
        &self,
        session_id: Option<&str>,
        model: Option<String>,
        summary_prompt: Option<String>,
    ) -> String {
        let request = SummaryRequest::forced(model, summary_prompt);

        let plan = match session_id {
            Some(id) => match self.store.lock().get(id) {
                Some(engine) => engine.plan_summary(&request),
                None => {
                    tracing::warn!("No frame history for session {id}");
                    return NO_SESSION_DATA_MESSAGE.to_string();
                }
            },
            None => self.default_history.lock().plan_summary(&request),
        };

        let input = match plan {
            SummaryPlan::Generate(input) => input,
            SummaryPlan::NoFrames => return livevlm_history::NO_FRAMES_MESSAGE.to_string(),
            SummaryPlan::Cached(summary) => return summary,
        };

        tracing::info!(
            "Summarizing {} frames for {}",
            input.responses.len(),
            session_id.unwrap_or("default history")
        );
        let summary =
            summarize_or_fallback(self.summarizer.as_ref(), &input.responses, &request).await;

        match session_id {
            Some(id) => {
                if let Some(engine) = self.store.lock().get_mut(id) {
                    engine.record_summary(&request, &input, summary.clone());
                }
            }
            None => self
                .default_history
                .lock()
                .record_summary(&request, &input, summary.clone()),
        }
        summary
    }

    pub fn context_window(&self) -> usize {
        self.store.lock().defaults().context_window
    }

    pub fn summary_window(&self) -> usize {
        self.store.lock().defaults().summary_window
    }

    /// Apply a new context window to all current and future sessions.
    pub fn update_context_window(&self, window: usize) -> Result<(), VlmError> {
        check_window("context_window", window)?;
        self.store.lock().update_context_window(window);
        self.default_history.lock().update_context_window(window);
        Ok(())
    }

    /// Apply a new summary window to all current and future sessions.
    pub fn update_summary_window(&self, window: usize) -> Result<(), VlmError> {
        check_window("summary_window", window)?;
        self.store.lock().update_summary_window(window);
        self.default_history.lock().update_summary_window(window);
        Ok(())
    }

    /// Both windows are validated before either is applied.
    pub fn update_windows(
        &self,
        context_window: usize,
        summary_window: usize,
    ) -> Result<(), VlmError> {
        check_window("context_window", context_window)?;
        check_window("summary_window", summary_window)?;
        self.update_context_window(context_window)?;
        self.update_summary_window(summary_window)
    }
}

fn not_found(session_id: &str) -> VlmError {
    VlmError::NotFound {
        session_id: session_id.to_string(),
    }
}

fn check_window(name: &str, window: usize) -> Result<(), VlmError> {
    if WINDOW_RANGE.contains(&window) {
        Ok(())
    } else {
        Err(VlmError::InvalidInput(format!(
            "{name} must be between {} and {}, got {window}",
            WINDOW_RANGE.start(),
            WINDOW_RANGE.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_request_defaults_from_json() {
        let request: FrameRequest = serde_json::from_str(r#"{"image": "aGk="}"#).unwrap();
        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.prompt, DEFAULT_PROMPT);
        assert!(request.use_temporal_context);
        assert!(request.session_id.is_none());
        assert_eq!(request.settings, QuerySettings::default());
    }

    #[test]
    fn frame_request_partial_settings() {
        let request: FrameRequest =
            serde_json::from_str(r#"{"image": "aGk=", "settings": {"max_tokens": 50}}"#).unwrap();
        assert_eq!(request.settings.max_tokens, 50);
        assert!((request.settings.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn window_bounds() {
        assert!(check_window("context_window", 1).is_ok());
        assert!(check_window("context_window", 50).is_ok());
        let err = check_window("summary_window", 0).unwrap_err();
        assert_eq!(err.kind(), "invalid-input");
        assert!(check_window("summary_window", 51).is_err());
    }
}
