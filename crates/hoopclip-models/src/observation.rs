//! Per-frame subject observations and their smoothed counterparts.

use crate::geometry::Point2D;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a subject position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Fresh locator + selector result.
    Detected,
    /// Visual tracker extrapolation between detections.
    Tracked,
    /// Last known position or frame center.
    Fallback,
}

impl Confidence {
    /// Stable lowercase label, used for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Detected => "detected",
            Confidence::Tracked => "tracked",
            Confidence::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw subject position for one sampled timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubjectObservation {
    /// Timestamp in seconds
    pub time: f64,
    /// Subject position in source pixels
    pub position: Point2D,
    /// Provenance of the position
    pub confidence: Confidence,
}

impl SubjectObservation {
    /// Create a new observation.
    pub fn new(time: f64, position: Point2D, confidence: Confidence) -> Self {
        Self {
            time,
            position,
            confidence,
        }
    }
}

/// Output of the position smoother.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SmoothedPosition {
    /// Timestamp in seconds
    pub time: f64,
    /// Smoothed position in source pixels
    pub position: Point2D,
}

impl SmoothedPosition {
    /// Create a new smoothed position.
    pub fn new(time: f64, position: Point2D) -> Self {
        Self { time, position }
    }
}
