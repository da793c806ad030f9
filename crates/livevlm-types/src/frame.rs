//! The record kept for every successfully processed frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One processed frame: inputs, chosen model, raw output, timing.
///
/// Records are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub timestamp: DateTime<Utc>,
    pub frame_id: Uuid,
    /// Base64 image payload, kept only when image retention is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// The user's prompt before temporal context was added.
    pub prompt: String,
    pub model: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_objects: Option<Vec<String>>,
    /// Seconds spent in the model call.
    #[serde(default)]
    pub processing_time: Option<f64>,
}

impl FrameRecord {
    /// Create a record stamped with the current time and a fresh id.
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            frame_id: Uuid::new_v4(),
            image: None,
            prompt: prompt.into(),
            model: model.into(),
            response: response.into(),
            detected_objects: None,
            processing_time: None,
        }
    }

    pub fn with_image(mut self, image_b64: impl Into<String>) -> Self {
        self.image = Some(image_b64.into());
        self
    }

    pub fn with_processing_time(mut self, seconds: f64) -> Self {
        self.processing_time = Some(seconds);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
