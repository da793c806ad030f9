//! Session statistics.

use serde::{Deserialize, Serialize};

/// Statistics over the frames currently held by a session.
///
/// An empty session reports only `total_frames` and `session_duration`; the
/// remaining fields are omitted from serialized output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_frames: usize,
    /// Seconds between the oldest and newest retained frame.
    pub session_duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_per_minute: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_used: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_processing_time: Option<f64>,
}

impl SessionStats {
    pub fn empty() -> Self {
        Self {
            total_frames: 0,
            session_duration: 0.0,
            frames_per_minute: None,
            models_used: None,
            avg_processing_time: None,
        }
    }

    /// Human-readable multi-line rendering for terminals.
    pub fn format_detailed(&self) -> String {
        let mut lines = vec![
            format!("Frames:        {}", self.total_frames),
            format!("Duration:      {:.1}s", self.session_duration),
        ];
        if let Some(fpm) = self.frames_per_minute {
            lines.push(format!("Frames/min:    {fpm:.1}"));
        }
        if let Some(models) = &self.models_used {
            lines.push(format!("Models:        {}", models.join(", ")));
        }
        if let Some(avg) = self.avg_processing_time {
            lines.push(format!("Avg latency:   {avg:.2}s"));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_serialize_to_two_keys() {
        let json = serde_json::to_value(SessionStats::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"total_frames": 0, "session_duration": 0.0})
        );
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn format_detailed_lists_models() {
        let stats = SessionStats {
            total_frames: 3,
            session_duration: 12.0,
            frames_per_minute: Some(15.0),
            models_used: Some(vec!["gpt-4o".into(), "claude-3-haiku".into()]),
            avg_processing_time: Some(0.25),
        };
        let text = stats.format_detailed();
        assert!(text.contains("Frames:        3"));
        assert!(text.contains("gpt-4o, claude-3-haiku"));
        assert!(text.contains("0.25s"));
    }

    #[test]
    fn format_detailed_empty() {
        let text = SessionStats::empty().format_detailed();
        assert_eq!(text.lines().count(), 2);
    }
}
