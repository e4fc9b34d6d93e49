//! Error types for reframing operations.
//!
//! Only caller contract violations and backend failures surface here.
//! Missing detections, tracker loss and undersized crops are modelled
//! outcomes, not errors.

use hoopclip_models::GeometryError;
use thiserror::Error;

/// Result type for reframing operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during reframing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Empty frame at {time:.3}s")]
    EmptyFrame { time: f64 },

    #[error("Detection failed: {0}")]
    DetectionFailed(String),

    #[error("Tracker failed: {0}")]
    TrackerFailed(String),

    #[error("Frame source failed: {0}")]
    FrameSource(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create a tracker failure error.
    pub fn tracker_failed(message: impl Into<String>) -> Self {
        Self::TrackerFailed(message.into())
    }

    /// Create a frame source error.
    pub fn frame_source(message: impl Into<String>) -> Self {
        Self::FrameSource(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
