//! Temporal context: recent raw model outputs fed back into the next prompt.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// How long a computed context stays valid without an explicit refresh.
pub const CONTEXT_TTL_SECS: i64 = 5;

/// Only this many of the most recent responses are written into a prompt,
/// regardless of the context window.
const PROMPT_HISTORY_FRAMES: usize = 5;

const CONTEXT_HEADER: &str = "Temporal Context (Recent Frame Analyses):";
const CONTEXT_INSTRUCTION: &str =
    "Please consider these recent previous frame analyses when analyzing the current frame.";

/// Recent raw model responses, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalContext {
    pub recent_responses: Vec<String>,
    pub last_update: DateTime<Utc>,
}

impl TemporalContext {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            recent_responses: Vec::new(),
            last_update: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recent_responses.is_empty()
    }

    /// Whether a cached context computed at `last_update` may still be served at `now`.
    pub(crate) fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.last_update < TimeDelta::seconds(CONTEXT_TTL_SECS)
    }

    /// Append this context to `base_prompt` in the fixed prompt layout.
    ///
    /// Downstream prompts are tuned against this exact shape: a header line,
    /// `Frame {i}: {response}` lines for the last five responses, then the
    /// instruction sentence.
    pub fn render_into_prompt(&self, base_prompt: &str) -> String {
        let mut prompt = format!("{base_prompt}\n\n{CONTEXT_HEADER}\n");

        let start = self
            .recent_responses
            .len()
            .saturating_sub(PROMPT_HISTORY_FRAMES);
        for (i, response) in self.recent_responses[start..].iter().enumerate() {
            prompt.push_str(&format!("Frame {}: {response}\n", i + 1));
        }

        prompt.push('\n');
        prompt.push_str(CONTEXT_INSTRUCTION);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(responses: &[&str]) -> TemporalContext {
        TemporalContext {
            recent_responses: responses.iter().map(|s| s.to_string()).collect(),
            last_update: Utc::now(),
        }
    }

    #[test]
    fn render_three_responses() {
        let prompt = context(&["r1", "r2", "r3"]).render_into_prompt("Q");
        assert_eq!(
            prompt,
            "Q\n\nTemporal Context (Recent Frame Analyses):\nFrame 1: r1\nFrame 2: r2\nFrame 3: r3\n\nPlease consider these recent previous frame analyses when analyzing the current frame."
        );
    }

    #[test]
    fn render_keeps_only_last_five() {
        let prompt = context(&["a", "b", "c", "d", "e", "f", "g"]).render_into_prompt("Q");
        assert!(!prompt.contains("Frame 6"));
        assert!(prompt.contains("Frame 1: c\n"));
        assert!(prompt.contains("Frame 5: g\n"));
        assert!(!prompt.contains(": a\n"));
        assert!(!prompt.contains(": b\n"));
    }

    #[test]
    fn render_empty_context_keeps_frame() {
        let prompt = context(&[]).render_into_prompt("Q");
        assert_eq!(
            prompt,
            "Q\n\nTemporal Context (Recent Frame Analyses):\n\nPlease consider these recent previous frame analyses when analyzing the current frame."
        );
    }

    #[test]
    fn freshness_window() {
        let ctx = context(&["x"]);
        assert!(ctx.is_fresh(ctx.last_update + TimeDelta::seconds(4)));
        assert!(!ctx.is_fresh(ctx.last_update + TimeDelta::seconds(5)));
    }

    #[test]
    fn serializes_with_iso_timestamp() {
        let ctx = context(&["x"]);
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["recent_responses"][0], "x");
        assert!(json["last_update"].as_str().unwrap().contains('T'));
    }
}
