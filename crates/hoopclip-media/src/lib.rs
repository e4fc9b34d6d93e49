//! Dynamic reframing engine for basketball highlight clips.
//!
//! This crate provides:
//! - Ball localization by color segmentation and a pluggable person detector
//! - Subject selection (the player with the ball, or the most central player)
//! - A detect/track lifecycle around a lightweight visual tracker
//! - Weighted temporal smoothing of the subject position
//! - Crop geometry for vertical output, with padding for narrow sources
//! - Frame suppliers for in-memory, channel-fed and (with the `opencv`
//!   feature) decoded-video sources
//!
//! The `opencv` feature is on by default and supplies the ball locator, the
//! HOG person detector and the CSRT tracker. Without it the ball locator is a
//! pure-Rust mask pipeline and no person detector is installed.

pub mod error;
pub mod frame;
pub mod metrics;
pub mod reframe;
pub mod supplier;

#[cfg(feature = "opencv")]
pub mod opencv;

pub use error::{MediaError, MediaResult};
pub use frame::Frame;
pub use reframe::{
    BallDetector, BallLocator, CropMapper, CropPlan, ObjectLocator, PersonDetector, PlanSummary,
    PositionSmoother, ReframeConfig, ReframePipeline, SubjectSelector, TemplateTracker,
    TrackerLifecycle, VisualTracker,
};
pub use supplier::{ChannelFrameSupplier, FrameSupplier, VecFrameSupplier};
