//! Shared data models for the HoopClip reframing engine.
//!
//! This crate provides Serde-serializable types for:
//! - Image-plane geometry (points, boxes, frame sizes)
//! - Subject observations and smoothed positions
//! - Crop rectangles and padding instructions handed to the renderer
//! - Highlight records and clip windows supplied by the orchestration layer

pub mod crop;
pub mod geometry;
pub mod highlight;
pub mod observation;

// Re-export common types
pub use crop::{CropInstruction, CropRectangle, Padding};
pub use geometry::{BoundingBox, FrameSize, GeometryError, Point2D};
pub use highlight::{ClipWindow, HighlightRecord, DEFAULT_CLIP_DURATION};
pub use observation::{Confidence, SmoothedPosition, SubjectObservation};
