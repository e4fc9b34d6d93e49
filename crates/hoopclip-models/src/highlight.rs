//! Highlight records supplied by the orchestration layer.
//!
//! The reframing engine never decides which moments are highlights; it only
//! turns a record into the clip window it should plan crops for.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default length of a vertical short, in seconds.
pub const DEFAULT_CLIP_DURATION: f64 = 30.0;

/// A highlight moment produced by transcription + language-model scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HighlightRecord {
    /// Timestamp of the moment in seconds from the start of the source video
    pub timestamp: f64,

    /// Short description of the play
    #[serde(default = "default_description")]
    pub description: String,

    /// Excitement score assigned upstream
    #[serde(default)]
    pub score: f64,
}

fn default_description() -> String {
    "Exciting play".to_string()
}

impl HighlightRecord {
    /// Create a new highlight record.
    pub fn new(timestamp: f64, description: impl Into<String>, score: f64) -> Self {
        Self {
            timestamp,
            description: description.into(),
            score,
        }
    }
}

/// Time range of a clip within its source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipWindow {
    /// Start offset in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl ClipWindow {
    /// Create a new clip window. Negative starts are clamped to zero.
    pub fn new(start: f64, duration: f64) -> Self {
        Self {
            start: start.max(0.0),
            duration: duration.max(0.0),
        }
    }

    /// Clip that starts at the highlight's timestamp.
    pub fn for_highlight(record: &HighlightRecord, clip_duration: f64) -> Self {
        Self::new(record.timestamp, clip_duration)
    }

    /// End offset in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}
