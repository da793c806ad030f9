//! The per-session history engine: a bounded, time-limited frame buffer with
//! cached temporal context and summaries.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, TimeDelta, Utc};
use livevlm_types::{FrameRecord, log_preview};

use crate::context::{CONTEXT_TTL_SECS, TemporalContext};
use crate::summary::{NO_FRAMES_MESSAGE, SummaryRequest, Summarizer, summarize_or_fallback};
use crate::types::SessionStats;

pub const DEFAULT_MAX_FRAMES: usize = 50;
pub const DEFAULT_MAX_AGE_MINUTES: i64 = 10;
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;
pub const DEFAULT_SUMMARY_WINDOW: usize = 10;

/// Sizing and retention parameters for a [`HistoryEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub max_frames: usize,
    pub max_age: TimeDelta,
    /// Most-recent frames used for temporal context.
    pub context_window: usize,
    /// Most-recent frames used for activity summaries.
    pub summary_window: usize,
    /// Keep each frame's image payload (audit mode).
    pub retain_images: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            max_age: TimeDelta::minutes(DEFAULT_MAX_AGE_MINUTES),
            context_window: DEFAULT_CONTEXT_WINDOW,
            summary_window: DEFAULT_SUMMARY_WINDOW,
            retain_images: false,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSummary {
    request: SummaryRequest,
    summary: String,
    produced_at: DateTime<Utc>,
    revision: u64,
}

/// What answering a summary request requires.
#[derive(Debug)]
pub enum SummaryPlan {
    /// The buffer is empty.
    NoFrames,
    /// A still-valid summary for the same request.
    Cached(String),
    /// The summarizer must be called with these inputs.
    Generate(SummaryInput),
}

/// Responses snapshotted for a summary, tagged with the engine revision they
/// were taken at.
#[derive(Debug, Clone)]
pub struct SummaryInput {
    pub responses: Vec<String>,
    revision: u64,
}

/// Frame history for one session.
pub struct HistoryEngine {
    config: EngineConfig,
    frames: VecDeque<FrameRecord>,
    cached_context: Option<TemporalContext>,
    cached_summary: Option<CachedSummary>,
    /// Bumped whenever summary inputs change (append, clear, window change).
    revision: u64,
}

impl HistoryEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            frames: VecDeque::with_capacity(config.max_frames.min(DEFAULT_MAX_FRAMES)),
            config,
            cached_context: None,
            cached_summary: None,
            revision: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context_window(&self) -> usize {
        self.config.context_window
    }

    pub fn summary_window(&self) -> usize {
        self.config.summary_window
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Append a frame, first dropping expired frames from the front and then
    /// trimming to `max_frames`.
    pub fn add_frame(&mut self, record: FrameRecord) {
        self.add_frame_at(record, Utc::now());
    }

    fn add_frame_at(&mut self, mut record: FrameRecord, now: DateTime<Utc>) {
        self.evict_expired(now);

        if !self.config.retain_images {
            record.image = None;
        }
        tracing::debug!(
            "Adding frame {} ({}): {}",
            record.frame_id,
            record.model,
            log_preview(&record.response, 80)
        );
        self.frames.push_back(record);

        while self.frames.len() > self.config.max_frames {
            self.frames.pop_front();
        }

        self.cached_context = None;
        self.revision += 1;
        tracing::debug!("Frame history now holds {} frames", self.frames.len());
    }

    /// Frames are time-ordered, so expiry is always a prefix.
    fn evict_expired(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.config.max_age;
        while self
            .frames
            .front()
            .is_some_and(|frame| frame.timestamp < cutoff)
        {
            self.frames.pop_front();
        }
    }

    /// The last `min(count, len)` frames, oldest first.
    pub fn recent_frames(&self, count: usize) -> Vec<&FrameRecord> {
        let skip = self.frames.len().saturating_sub(count);
        self.frames.iter().skip(skip).collect()
    }

    /// Recent raw responses, served from cache for up to five seconds.
    pub fn temporal_context(&mut self, force_update: bool) -> TemporalContext {
        self.temporal_context_at(Utc::now(), force_update)
    }

    fn temporal_context_at(&mut self, now: DateTime<Utc>, force_update: bool) -> TemporalContext {
        if !force_update {
            if let Some(cached) = &self.cached_context {
                if cached.is_fresh(now) {
                    return cached.clone();
                }
            }
        }

        if self.frames.is_empty() {
            return TemporalContext::empty(now);
        }

        let context = TemporalContext {
            recent_responses: self.recent_responses(self.config.context_window),
            last_update: now,
        };
        self.cached_context = Some(context.clone());
        context
    }

    /// Append recent history to `base_prompt`.
    ///
    /// Returns the prompt untouched when history is disabled or there is none.
    pub fn enhance_prompt(&mut self, base_prompt: &str, include_history: bool) -> String {
        if !include_history || self.frames.is_empty() {
            return base_prompt.to_string();
        }
        self.temporal_context(false).render_into_prompt(base_prompt)
    }

    pub fn stats(&self) -> SessionStats {
        let (Some(first), Some(last)) = (self.frames.front(), self.frames.back()) else {
            return SessionStats::empty();
        };

        let total_frames = self.frames.len();
        let session_duration = (last.timestamp - first.timestamp)
            .num_microseconds()
            .map_or(0.0, |us| us as f64 / 1_000_000.0);
        let frames_per_minute = if session_duration > 0.0 {
            total_frames as f64 / (session_duration / 60.0)
        } else {
            0.0
        };
        let models_used: BTreeSet<&str> = self.frames.iter().map(|f| f.model.as_str()).collect();
        let total_time: f64 = self
            .frames
            .iter()
            .map(|f| f.processing_time.unwrap_or(0.0))
            .sum();

        SessionStats {
            total_frames,
            session_duration,
            frames_per_minute: Some(frames_per_minute),
            models_used: Some(models_used.into_iter().map(String::from).collect()),
            avg_processing_time: Some(total_time / total_frames as f64),
        }
    }

    /// Summarize recent activity, falling back to a template summary when the
    /// summarizer fails. Never errors.
    pub async fn general_summary(
        &mut self,
        summarizer: &dyn Summarizer,
        request: &SummaryRequest,
    ) -> String {
        match self.plan_summary(request) {
            SummaryPlan::NoFrames => NO_FRAMES_MESSAGE.to_string(),
            SummaryPlan::Cached(summary) => summary,
            SummaryPlan::Generate(input) => {
                let summary = summarize_or_fallback(summarizer, &input.responses, request).await;
                self.record_summary(request, &input, summary.clone());
                summary
            }
        }
    }

    /// Decide how to answer a summary request without calling any model.
    ///
    /// Split from [`general_summary`](Self::general_summary) so callers that
    /// share the engine behind a lock can release it while the summarizer runs.
    pub fn plan_summary(&self, request: &SummaryRequest) -> SummaryPlan {
        self.plan_summary_at(request, Utc::now())
    }

    fn plan_summary_at(&self, request: &SummaryRequest, now: DateTime<Utc>) -> SummaryPlan {
        if self.frames.is_empty() {
            return SummaryPlan::NoFrames;
        }

        if !request.force_update {
            if let Some(cached) = &self.cached_summary {
                let fresh = now - cached.produced_at < TimeDelta::seconds(CONTEXT_TTL_SECS);
                if fresh
                    && cached.revision == self.revision
                    && cached.request.same_target(request)
                {
                    return SummaryPlan::Cached(cached.summary.clone());
                }
            }
        }

        SummaryPlan::Generate(SummaryInput {
            responses: self.recent_responses(self.config.summary_window),
            revision: self.revision,
        })
    }

    /// Cache a generated summary. Dropped if the history changed while it was
    /// being produced.
    pub fn record_summary(
        &mut self,
        request: &SummaryRequest,
        input: &SummaryInput,
        summary: String,
    ) {
        if input.revision != self.revision {
            tracing::debug!("Discarding summary built from an outdated frame history");
            return;
        }
        self.cached_summary = Some(CachedSummary {
            request: request.clone(),
            summary,
            produced_at: Utc::now(),
            revision: self.revision,
        });
    }

    /// Change the context window. Same value is a no-op.
    pub fn update_context_window(&mut self, window: usize) {
        if window == self.config.context_window {
            return;
        }
        self.config.context_window = window;
        self.cached_context = None;
        self.cached_summary = None;
        self.revision += 1;
        tracing::info!("Context window updated to {window} frames");
    }

    /// Change the summary window. Same value is a no-op.
    pub fn update_summary_window(&mut self, window: usize) {
        if window == self.config.summary_window {
            return;
        }
        self.config.summary_window = window;
        self.cached_summary = None;
        self.revision += 1;
        tracing::info!("Summary window updated to {window} frames");
    }

    pub fn update_windows(&mut self, context_window: usize, summary_window: usize) {
        self.update_context_window(context_window);
        self.update_summary_window(summary_window);
    }

    /// Drop every frame and cache.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.cached_context = None;
        self.cached_summary = None;
        self.revision += 1;
        tracing::info!("Frame history cleared");
    }

    /// Copy of every retained frame, oldest first.
    pub fn export(&self) -> Vec<FrameRecord> {
        self.frames.iter().cloned().collect()
    }

    fn recent_responses(&self, count: usize) -> Vec<String> {
        self.recent_frames(count)
            .into_iter()
            .map(|f| f.response.clone())
            .collect()
    }
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
