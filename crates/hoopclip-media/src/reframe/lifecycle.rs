//! Tracker lifecycle: when to detect, when to track, what to emit.
//!
//! Full detection (locator plus selector) runs on a fixed cadence or
//! whenever no tracker exists. In between, the visual tracker is advanced.
//! Every call to [`TrackerLifecycle::observe`] yields exactly one
//! observation, falling back to the last known position (or the frame
//! center) when neither detection nor tracking produces one.

use hoopclip_models::{BoundingBox, Confidence, Point2D, SubjectObservation};
use tracing::{debug, warn};

use super::locator::ObjectLocator;
use super::selector::{Selection, SubjectSelector};
use super::visual_tracker::{TrackerFactory, VisualTracker};
use crate::frame::Frame;
use crate::metrics;

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// No subject established yet; every frame is a detection frame
    Seeking,
    /// A tracker was initialized on a detected subject
    Tracking,
}

/// Per-clip detect/track state machine.
///
/// Owns its tracker exclusively; one instance per clip.
pub struct TrackerLifecycle {
    locator: ObjectLocator,
    selector: SubjectSelector,
    new_tracker: TrackerFactory,
    tracker: Option<Box<dyn VisualTracker>>,
    state: TrackingState,
    /// Sampled frames between scheduled redetections
    redetect_every: u64,
    frames_since_redetect: u64,
    last_known: Option<Point2D>,
    box_size: i32,
}

impl TrackerLifecycle {
    /// Create a lifecycle manager.
    ///
    /// `redetect_every` is the detection cadence in sampled frames; values
    /// below one are treated as one.
    pub fn new(
        locator: ObjectLocator,
        selector: SubjectSelector,
        new_tracker: TrackerFactory,
        redetect_every: u64,
        box_size: u32,
    ) -> Self {
        Self {
            locator,
            selector,
            new_tracker,
            tracker: None,
            state: TrackingState::Seeking,
            redetect_every: redetect_every.max(1),
            frames_since_redetect: 0,
            last_known: None,
            box_size: box_size.min(i32::MAX as u32).max(1) as i32,
        }
    }

    /// Convert a redetection interval into a frame cadence for a sampling step.
    pub fn cadence_frames(interval_secs: f64, step_secs: f64) -> u64 {
        if step_secs.is_nan() || step_secs <= 0.0 || !interval_secs.is_finite() {
            return 1;
        }
        ((interval_secs / step_secs).round() as u64).max(1)
    }

    /// Current state.
    pub fn state(&self) -> TrackingState {
        self.state
    }

    /// Last position established by detection or tracking.
    pub fn last_known(&self) -> Option<Point2D> {
        self.last_known
    }

    fn redetection_due(&self) -> bool {
        self.tracker.is_none() || self.frames_since_redetect >= self.redetect_every
    }

    /// Produce the observation for one sampled frame.
    pub fn observe(&mut self, frame: &Frame) -> SubjectObservation {
        let observation = if self.redetection_due() {
            self.frames_since_redetect = 1;
            self.redetect(frame)
        } else {
            self.frames_since_redetect += 1;
            self.track(frame)
        };
        metrics::record_observation(observation.confidence);
        observation
    }

    fn redetect(&mut self, frame: &Frame) -> SubjectObservation {
        let selection = match self.locator.locate(frame) {
            Ok(found) => {
                self.selector
                    .select_with_basis(found.ball, &found.people, frame.size())
            }
            Err(e) => {
                warn!(time = frame.time(), error = %e, "Person detector failed, treating as no detection");
                metrics::record_detector_error();
                None
            }
        };
        metrics::record_redetection(selection.is_some());

        match selection {
            Some(Selection { position, basis }) => {
                debug!(time = frame.time(), %position, ?basis, "Subject detected");
                self.start_tracker(frame, position);
                self.last_known = Some(position);
                SubjectObservation::new(frame.time(), position, Confidence::Detected)
            }
            None => {
                debug!(time = frame.time(), "Redetection found no subject");
                self.fallback(frame)
            }
        }
    }

    fn start_tracker(&mut self, frame: &Frame, position: Point2D) {
        let seed = BoundingBox::centered_on(position, self.box_size)
            .ok()
            .and_then(|b| b.clip_to(frame.size()));
        let Some(seed) = seed else {
            debug!(time = frame.time(), %position, "Subject box outside frame, tracker not started");
            return;
        };

        let mut tracker = (self.new_tracker)();
        match tracker.initialize(frame, seed) {
            Ok(()) => {
                self.tracker = Some(tracker);
                self.state = TrackingState::Tracking;
            }
            Err(e) => {
                // Keep whatever tracker was running before.
                debug!(time = frame.time(), error = %e, "Tracker initialization failed");
            }
        }
    }

    fn track(&mut self, frame: &Frame) -> SubjectObservation {
        let advanced = self.tracker.as_mut().and_then(|t| t.advance(frame));
        match advanced {
            Some(bbox) => {
                let position = bbox.center();
                self.last_known = Some(position);
                SubjectObservation::new(frame.time(), position, Confidence::Tracked)
            }
            None => {
                debug!(time = frame.time(), "Tracker lost target");
                metrics::record_tracker_loss();
                self.fallback(frame)
            }
        }
    }

    fn fallback(&self, frame: &Frame) -> SubjectObservation {
        let position = self.last_known.unwrap_or_else(|| frame.size().center());
        SubjectObservation::new(frame.time(), position, Confidence::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaResult;
    use crate::reframe::config::ReframeConfig;
    use crate::reframe::locator::{NoPersonDetector, PersonDetector};
    use image::RgbImage;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Detector replaying a script of per-call results.
    struct ScriptedDetector {
        script: Arc<Mutex<VecDeque<MediaResult<Vec<BoundingBox>>>>>,
    }

    impl PersonDetector for ScriptedDetector {
        fn detect(&self, _image: &RgbImage) -> MediaResult<Vec<BoundingBox>> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Tracker replaying a script of advance results.
    struct ScriptedTracker {
        script: Arc<Mutex<VecDeque<Option<BoundingBox>>>>,
        inits: Arc<Mutex<Vec<BoundingBox>>>,
    }

    impl VisualTracker for ScriptedTracker {
        fn initialize(&mut self, _frame: &Frame, bbox: BoundingBox) -> MediaResult<()> {
            self.inits.lock().unwrap().push(bbox);
            Ok(())
        }

        fn advance(&mut self, _frame: &Frame) -> Option<BoundingBox> {
            self.script.lock().unwrap().pop_front().flatten()
        }
    }

    struct Harness {
        lifecycle: TrackerLifecycle,
        detections: Arc<Mutex<VecDeque<MediaResult<Vec<BoundingBox>>>>>,
        advances: Arc<Mutex<VecDeque<Option<BoundingBox>>>>,
        inits: Arc<Mutex<Vec<BoundingBox>>>,
    }

    fn harness(redetect_every: u64) -> Harness {
        let detections = Arc::new(Mutex::new(VecDeque::new()));
        let advances = Arc::new(Mutex::new(VecDeque::new()));
        let inits = Arc::new(Mutex::new(Vec::new()));

        let config = ReframeConfig::default();
        let locator = ObjectLocator::new(
            &config,
            Box::new(ScriptedDetector {
                script: detections.clone(),
            }),
        );
        let (script, init_log) = (advances.clone(), inits.clone());
        let factory: TrackerFactory = Box::new(move || {
            Box::new(ScriptedTracker {
                script: script.clone(),
                inits: init_log.clone(),
            }) as Box<dyn VisualTracker>
        });

        Harness {
            lifecycle: TrackerLifecycle::new(
                locator,
                SubjectSelector::new(config.ball_match_radius),
                factory,
                redetect_every,
                config.tracker_box_size,
            ),
            detections,
            advances,
            inits,
        }
    }

    fn frame(time: f64) -> Frame {
        Frame::new(time, RgbImage::new(1280, 720)).unwrap()
    }

    fn person_at(cx: i32, cy: i32) -> BoundingBox {
        BoundingBox::new(cx - 50, cy - 110, 100, 220).unwrap()
    }

    #[test]
    fn test_seeking_falls_back_to_frame_center() {
        let mut h = harness(3);
        let obs = h.lifecycle.observe(&frame(0.0));
        assert_eq!(obs.confidence, Confidence::Fallback);
        assert_eq!(obs.position, Point2D::new(640, 360));
        assert_eq!(h.lifecycle.state(), TrackingState::Seeking);
    }

    #[test]
    fn test_detect_then_track() {
        let mut h = harness(3);
        h.detections.lock().unwrap().push_back(Ok(vec![person_at(650, 360)]));
        h.advances
            .lock()
            .unwrap()
            .push_back(Some(BoundingBox::centered_on(Point2D::new(660, 362), 150).unwrap()));

        let first = h.lifecycle.observe(&frame(0.0));
        assert_eq!(first.confidence, Confidence::Detected);
        assert_eq!(first.position, Point2D::new(650, 360));
        assert_eq!(h.lifecycle.state(), TrackingState::Tracking);
        assert_eq!(
            h.inits.lock().unwrap()[0],
            BoundingBox::new(575, 285, 150, 150).unwrap()
        );

        let second = h.lifecycle.observe(&frame(0.1));
        assert_eq!(second.confidence, Confidence::Tracked);
        assert_eq!(second.position, Point2D::new(660, 362));
    }

    #[test]
    fn test_tracker_failure_keeps_last_known_position() {
        let mut h = harness(5);
        h.detections.lock().unwrap().push_back(Ok(vec![person_at(300, 400)]));
        h.advances.lock().unwrap().push_back(None);

        h.lifecycle.observe(&frame(0.0));
        let lost = h.lifecycle.observe(&frame(0.1));
        assert_eq!(lost.confidence, Confidence::Fallback);
        assert_eq!(lost.position, Point2D::new(300, 400));
        // Stays in Tracking with the stale tracker.
        assert_eq!(h.lifecycle.state(), TrackingState::Tracking);
    }

    #[test]
    fn test_redetection_cadence() {
        let mut h = harness(3);
        for _ in 0..3 {
            h.detections.lock().unwrap().push_back(Ok(vec![person_at(650, 360)]));
        }
        for _ in 0..10 {
            h.advances
                .lock()
                .unwrap()
                .push_back(Some(BoundingBox::centered_on(Point2D::new(650, 360), 150).unwrap()));
        }

        let kinds: Vec<Confidence> = (0..7)
            .map(|i| h.lifecycle.observe(&frame(i as f64 * 0.1)).confidence)
            .collect();
        assert_eq!(
            kinds,
            vec![
                Confidence::Detected,
                Confidence::Tracked,
                Confidence::Tracked,
                Confidence::Detected,
                Confidence::Tracked,
                Confidence::Tracked,
                Confidence::Detected,
            ]
        );
        assert_eq!(h.inits.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_redetection_keeps_prior_tracker() {
        let mut h = harness(2);
        h.detections.lock().unwrap().push_back(Ok(vec![person_at(400, 300)]));
        // Second redetection finds nobody.
        h.detections.lock().unwrap().push_back(Ok(Vec::new()));
        let tracked = Some(BoundingBox::centered_on(Point2D::new(410, 300), 150).unwrap());
        h.advances.lock().unwrap().extend([tracked, tracked]);

        let observations: Vec<SubjectObservation> = (0..4)
            .map(|i| h.lifecycle.observe(&frame(i as f64 * 0.1)))
            .collect();

        assert_eq!(observations[0].confidence, Confidence::Detected);
        assert_eq!(observations[1].confidence, Confidence::Tracked);
        assert_eq!(observations[2].confidence, Confidence::Fallback);
        assert_eq!(observations[2].position, Point2D::new(410, 300));
        // The prior tracker is still advanced afterwards.
        assert_eq!(observations[3].confidence, Confidence::Tracked);
        assert_eq!(h.inits.lock().unwrap().len(), 1);
        assert_eq!(h.lifecycle.state(), TrackingState::Tracking);
    }

    #[test]
    fn test_detector_error_degrades_to_fallback() {
        let mut h = harness(3);
        h.detections
            .lock()
            .unwrap()
            .push_back(Err(crate::error::MediaError::detection_failed("backend down")));

        let obs = h.lifecycle.observe(&frame(0.0));
        assert_eq!(obs.confidence, Confidence::Fallback);
        assert_eq!(obs.position, Point2D::new(640, 360));
    }

    #[test]
    fn test_one_observation_per_frame_without_detector() {
        let config = ReframeConfig::default();
        let mut lifecycle = TrackerLifecycle::new(
            ObjectLocator::new(&config, Box::new(NoPersonDetector)),
            SubjectSelector::new(config.ball_match_radius),
            Box::new(|| {
                Box::new(crate::reframe::visual_tracker::TemplateTracker::default())
                    as Box<dyn VisualTracker>
            }),
            2,
            150,
        );

        for i in 0..5 {
            let obs = lifecycle.observe(&frame(i as f64));
            assert_eq!(obs.time, i as f64);
            assert_eq!(obs.confidence, Confidence::Fallback);
        }
    }

    #[test]
    fn test_cadence_frames() {
        assert_eq!(TrackerLifecycle::cadence_frames(0.5, 1.0 / 30.0), 15);
        assert_eq!(TrackerLifecycle::cadence_frames(0.5, 1.0), 1);
        assert_eq!(TrackerLifecycle::cadence_frames(0.5, 0.0), 1);
    }
}
