//! Per-session frame history, temporal context, and activity summaries for LiveVLM.

pub mod context;
pub mod engine;
pub mod store;
pub mod summary;
pub mod types;

pub use context::{CONTEXT_TTL_SECS, TemporalContext};
pub use engine::{EngineConfig, HistoryEngine, SummaryInput, SummaryPlan};
pub use store::SessionStore;
pub use summary::{
    NO_FRAMES_MESSAGE, SummaryRequest, Summarizer, summarize_or_fallback, template_summary,
};
pub use types::SessionStats;
