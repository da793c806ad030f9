//! Session orchestration and summary generation for LiveVLM.

mod orchestrator;
mod summary;

pub use orchestrator::{
    DEFAULT_PROMPT, FrameRequest, FrameResult, NO_SESSION_DATA_MESSAGE, SessionOrchestrator,
    WINDOW_RANGE,
};
pub use summary::{SummaryGenerator, build_summary_prompt};
