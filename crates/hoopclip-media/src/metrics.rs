//! Metrics emitted by the reframing pipeline.
//!
//! Recording is a no-op until the host process installs a recorder.

use hoopclip_models::Confidence;
use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Lifecycle metrics
    pub const OBSERVATIONS_TOTAL: &str = "hoopclip_observations_total";
    pub const REDETECTIONS_TOTAL: &str = "hoopclip_redetections_total";
    pub const TRACKER_LOSSES_TOTAL: &str = "hoopclip_tracker_losses_total";
    pub const DETECTOR_ERRORS_TOTAL: &str = "hoopclip_detector_errors_total";

    // Crop metrics
    pub const PADDED_CROPS_TOTAL: &str = "hoopclip_padded_crops_total";

    // Plan metrics
    pub const PLANS_TOTAL: &str = "hoopclip_plans_total";
    pub const PLAN_DURATION_SECONDS: &str = "hoopclip_plan_duration_seconds";
    pub const PLAN_SAMPLES: &str = "hoopclip_plan_samples";
}

/// Record one subject observation.
pub fn record_observation(confidence: Confidence) {
    let labels = [("confidence", confidence.as_str().to_string())];
    counter!(names::OBSERVATIONS_TOTAL, &labels).increment(1);
}

/// Record a redetection pass and whether it produced a subject.
pub fn record_redetection(found: bool) {
    let labels = [("found", found.to_string())];
    counter!(names::REDETECTIONS_TOTAL, &labels).increment(1);
}

/// Record a visual tracker losing its target.
pub fn record_tracker_loss() {
    counter!(names::TRACKER_LOSSES_TOTAL).increment(1);
}

/// Record a person detector backend failure.
pub fn record_detector_error() {
    counter!(names::DETECTOR_ERRORS_TOTAL).increment(1);
}

/// Record a crop that needed padding.
pub fn record_padded_crop() {
    counter!(names::PADDED_CROPS_TOTAL).increment(1);
}

/// Record a finished plan.
pub fn record_plan(mode: &str, samples: usize, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    counter!(names::PLANS_TOTAL, &labels).increment(1);
    histogram!(names::PLAN_DURATION_SECONDS, &labels).record(duration_secs);
    histogram!(names::PLAN_SAMPLES, &labels).record(samples as f64);
}
