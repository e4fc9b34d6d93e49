//! Dynamic reframing: follow the ball carrier with a vertical crop window.
//!
//! # Architecture
//!
//! ```text
//! Frame Supplier
//!     │
//!     ▼
//! ┌───────────────────┐
//! │ Tracker Lifecycle │ ← Redetect on cadence, otherwise advance tracker
//! │  ├ Object Locator │ ← Ball color blob + person boxes
//! │  └ Subject Select │ ← Player nearest the ball, else nearest center
//! └────────┬──────────┘
//!          │  SubjectObservation
//!          ▼
//! ┌───────────────────┐
//! │ Position Smoother │ ← Weighted sliding window
//! └────────┬──────────┘
//!          │  SmoothedPosition
//!          ▼
//! ┌───────────────────┐
//! │   Crop Mapper     │ ← Scale, bias, clamp, pad
//! └────────┬──────────┘
//!          │
//!          ▼
//!      CropPlan  → renderer
//! ```
//!
//! One pipeline run owns its tracker and smoother; independent clips can be
//! planned in parallel with [`ReframePipeline::plan_clips`].

#[cfg(not(feature = "opencv"))]
pub mod color;
pub mod config;
pub mod crop_mapper;
pub mod lifecycle;
pub mod locator;
#[cfg(not(feature = "opencv"))]
pub mod morphology;
pub mod plan;
pub mod selector;
pub mod smoother;
pub mod visual_tracker;

#[cfg(test)]
mod tests;

pub use config::{AreaRange, HogParams, HsvBand, ReframeConfig};
pub use crop_mapper::CropMapper;
pub use lifecycle::{TrackerLifecycle, TrackingState};
pub use locator::{
    BallDetector, BallLocator, LocatorOutput, NoPersonDetector, ObjectLocator, PersonDetector,
    PersonLocator,
};
pub use plan::{CropPlan, PlanSummary};
pub use selector::SubjectSelector;
pub use smoother::PositionSmoother;
pub use visual_tracker::{TemplateTracker, TemplateTrackerConfig, TrackerFactory, VisualTracker};

use std::sync::Arc;
use std::time::Instant;

use hoopclip_models::{ClipWindow, Confidence, SubjectObservation};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::metrics;
use crate::supplier::FrameSupplier;

/// Slack so the final sample lands on the window end despite float steps.
const END_EPSILON: f64 = 1e-6;

type SharedBallFactory = Arc<dyn Fn() -> Box<dyn BallDetector> + Send + Sync>;
type SharedDetectorFactory = Arc<dyn Fn() -> Box<dyn PersonDetector> + Send + Sync>;
type SharedTrackerFactory = Arc<dyn Fn() -> Box<dyn VisualTracker> + Send + Sync>;

/// Plans crop streams for clips.
///
/// Holds configuration and backend factories only; every run builds its own
/// detector, tracker and smoother, so one pipeline can serve many clips
/// concurrently.
#[derive(Clone)]
pub struct ReframePipeline {
    config: ReframeConfig,
    balls: SharedBallFactory,
    detectors: SharedDetectorFactory,
    trackers: SharedTrackerFactory,
    person_backend: &'static str,
}

impl std::fmt::Debug for ReframePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReframePipeline")
            .field("config", &self.config)
            .field("person_backend", &self.person_backend)
            .finish_non_exhaustive()
    }
}

impl ReframePipeline {
    /// Create a pipeline with the default backends: [`BallLocator`], the
    /// built-in template tracker and, with the `opencv` feature, the HOG
    /// person detector configured by `config.hog`.
    ///
    /// Without OpenCV there is no person detector, so every frame falls back
    /// until one is supplied with [`ReframePipeline::with_person_detector`].
    pub fn new(config: ReframeConfig) -> MediaResult<Self> {
        config.validate()?;
        let tracker_config = config.template_tracker;
        let ball = BallLocator::from_config(&config);
        let pipeline = Self {
            config,
            balls: Arc::new(move || Box::new(ball.clone()) as Box<dyn BallDetector>),
            detectors: Arc::new(|| Box::new(NoPersonDetector) as Box<dyn PersonDetector>),
            trackers: Arc::new(move || {
                Box::new(TemplateTracker::new(tracker_config)) as Box<dyn VisualTracker>
            }),
            person_backend: "none",
        };

        #[cfg(feature = "opencv")]
        let pipeline = pipeline.with_hog_detector()?;

        #[cfg(not(feature = "opencv"))]
        warn!("Built without OpenCV: no person detector, crops stay centered");

        Ok(pipeline)
    }

    /// Use `factory` to build a person detector for each run.
    pub fn with_person_detector<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn PersonDetector> + Send + Sync + 'static,
    {
        self.detectors = Arc::new(factory);
        self.person_backend = "custom";
        self
    }

    /// Use `factory` to build a ball detector for each run.
    pub fn with_ball_detector<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn BallDetector> + Send + Sync + 'static,
    {
        self.balls = Arc::new(factory);
        self
    }

    /// Use `factory` to build visual trackers.
    pub fn with_tracker<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn VisualTracker> + Send + Sync + 'static,
    {
        self.trackers = Arc::new(factory);
        self
    }

    /// Detect people with OpenCV's HOG detector using the configured parameters.
    #[cfg(feature = "opencv")]
    pub fn with_hog_detector(self) -> MediaResult<Self> {
        use crate::opencv::HogPersonDetector;

        let params = self.config.hog;
        // Fail fast if the descriptor cannot be built at all.
        HogPersonDetector::new(params)?;
        let mut pipeline = self.with_person_detector(move || match HogPersonDetector::new(params) {
            Ok(detector) => Box::new(detector) as Box<dyn PersonDetector>,
            Err(e) => {
                warn!(error = %e, "HOG detector unavailable, running without person detection");
                Box::new(NoPersonDetector)
            }
        });
        pipeline.person_backend = "hog";
        Ok(pipeline)
    }

    /// Track with OpenCV's CSRT tracker instead of the template tracker.
    #[cfg(feature = "opencv")]
    pub fn with_csrt_tracker(self) -> Self {
        self.with_tracker(|| Box::new(crate::opencv::CsrtTracker::new()) as Box<dyn VisualTracker>)
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &ReframeConfig {
        &self.config
    }

    /// Name of the person detector backend: `"hog"`, `"custom"` or `"none"`.
    pub fn person_backend(&self) -> &'static str {
        self.person_backend
    }

    fn lifecycle(&self, step_secs: f64) -> TrackerLifecycle {
        let trackers = Arc::clone(&self.trackers);
        let people = PersonLocator::new(
            (self.detectors)(),
            self.config.person_max_width,
            self.config.person_aspect_min_ratio,
        );
        TrackerLifecycle::new(
            ObjectLocator::with_ball_detector((self.balls)(), people),
            SubjectSelector::new(self.config.ball_match_radius),
            Box::new(move || trackers()),
            TrackerLifecycle::cadence_frames(self.config.redetection_interval_secs, step_secs),
            self.config.tracker_box_size,
        )
    }

    /// Plan the crop stream for `window`, pulling frames from `supplier`.
    ///
    /// Samples run from the window start to its end (inclusive) at the
    /// configured sampling interval, or the supplier's native rate, and stop
    /// early at end of stream. Every sample yields one instruction.
    pub fn plan<S>(&self, supplier: &mut S, window: ClipWindow) -> MediaResult<CropPlan>
    where
        S: FrameSupplier + ?Sized,
    {
        let started = Instant::now();
        let step = self.sample_step(supplier.fps())?;
        let target = self.config.target_size()?;

        let first = supplier.frame_at(window.start)?.ok_or_else(|| {
            MediaError::frame_source(format!("no frame available at {:.3}s", window.start))
        })?;
        let source = first.size();
        let mapper = CropMapper::new(
            source,
            target,
            self.config.vertical_bias_fraction,
            self.config.pad_fill,
        )?;

        let tracking = self.config.enable_tracking;
        info!(
            start = window.start,
            duration = window.duration,
            step,
            source = %source,
            target = %target,
            tracking,
            "Planning reframe"
        );

        let mut lifecycle = tracking.then(|| self.lifecycle(step));
        let mut smoother = PositionSmoother::new(self.config.smoothing_window_size);
        let mut plan = CropPlan::new(source, target);
        let mut pending = Some(first);

        let mut index = 0u64;
        loop {
            let time = window.start + index as f64 * step;
            if time > window.end() + END_EPSILON {
                break;
            }
            let frame = match pending.take() {
                Some(frame) => frame,
                None => match supplier.frame_at(time)? {
                    Some(frame) => frame,
                    None => {
                        debug!(time, "Frame supplier reached end of stream");
                        break;
                    }
                },
            };
            if frame.size() != source {
                return Err(MediaError::invalid_input(format!(
                    "frame at {:.3}s is {}, clip started at {}",
                    time,
                    frame.size(),
                    source
                )));
            }

            let (instruction, confidence) = match lifecycle.as_mut() {
                Some(lifecycle) => {
                    let observed = lifecycle.observe(&frame);
                    let observation = SubjectObservation { time, ..observed };
                    let smoothed = smoother.push(&observation);
                    (mapper.map(time, smoothed.position)?, observation.confidence)
                }
                None => (mapper.centered(time)?, Confidence::Fallback),
            };

            if instruction.padding_required() {
                metrics::record_padded_crop();
            }
            plan.push(instruction, confidence);
            index += 1;
        }

        let summary = plan.summary();
        let elapsed = started.elapsed().as_secs_f64();
        info!(
            samples = plan.len(),
            detected = summary.detected,
            tracked = summary.tracked,
            fallback = summary.fallback,
            padded = summary.padded,
            elapsed_ms = (elapsed * 1000.0) as u64,
            "Reframe plan complete"
        );
        if tracking && summary.all_fallback() {
            warn!(
                start = window.start,
                samples = plan.len(),
                "No subject found in clip, crop stays centered"
            );
        }
        metrics::record_plan(
            if tracking { "tracking" } else { "center" },
            plan.len(),
            elapsed,
        );

        Ok(plan)
    }

    /// Plan several independent clips in parallel, one run per clip.
    ///
    /// Results are returned in input order.
    pub fn plan_clips<S>(&self, clips: Vec<(S, ClipWindow)>) -> Vec<MediaResult<CropPlan>>
    where
        S: FrameSupplier,
    {
        clips
            .into_par_iter()
            .map(|(mut supplier, window)| self.plan(&mut supplier, window))
            .collect()
    }

    /// Run [`ReframePipeline::plan`] on the blocking thread pool.
    pub async fn plan_async<S>(&self, mut supplier: S, window: ClipWindow) -> MediaResult<CropPlan>
    where
        S: FrameSupplier + 'static,
    {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.plan(&mut supplier, window))
            .await
            .map_err(|e| MediaError::internal(format!("Blocking task join error: {}", e)))?
    }

    fn sample_step(&self, fps: f64) -> MediaResult<f64> {
        match self.config.sample_interval_secs {
            Some(step) => Ok(step),
            None if fps.is_finite() && fps > 0.0 => Ok(1.0 / fps),
            None => Err(MediaError::invalid_input(format!(
                "frame supplier reports invalid fps {}",
                fps
            ))),
        }
    }
}
