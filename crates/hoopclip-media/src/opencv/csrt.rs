//! CSRT tracker adapter.

use hoopclip_models::BoundingBox;
use opencv::core::{Ptr, Rect};
use opencv::prelude::*;
use opencv::tracking::{TrackerCSRT, TrackerCSRT_Params};
use tracing::debug;

use super::{from_rect, rgb_to_bgr_mat, to_rect};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::reframe::visual_tracker::VisualTracker;

/// Discriminative correlation filter tracker with channel and spatial
/// reliability. Slower than the template tracker but more robust to
/// deformation.
#[derive(Default)]
pub struct CsrtTracker {
    tracker: Option<Ptr<TrackerCSRT>>,
}

impl CsrtTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisualTracker for CsrtTracker {
    fn initialize(&mut self, frame: &Frame, bbox: BoundingBox) -> MediaResult<()> {
        let mat = rgb_to_bgr_mat(frame.image())?;
        let params = TrackerCSRT_Params::default()
            .map_err(|e| MediaError::tracker_failed(format!("CSRT params: {e}")))?;
        let mut tracker = TrackerCSRT::create(&params)
            .map_err(|e| MediaError::tracker_failed(format!("Create CSRT tracker: {e}")))?;
        tracker
            .init(&mat, to_rect(&bbox))
            .map_err(|e| MediaError::tracker_failed(format!("Init CSRT tracker: {e}")))?;
        self.tracker = Some(tracker);
        Ok(())
    }

    fn advance(&mut self, frame: &Frame) -> Option<BoundingBox> {
        let tracker = self.tracker.as_mut()?;
        let mat = match rgb_to_bgr_mat(frame.image()) {
            Ok(mat) => mat,
            Err(e) => {
                debug!(error = %e, "CSRT frame conversion failed");
                return None;
            }
        };

        let mut rect = Rect::default();
        match tracker.update(&mat, &mut rect) {
            Ok(true) => from_rect(&rect),
            Ok(false) => None,
            Err(e) => {
                debug!(error = %e, "CSRT update failed");
                None
            }
        }
    }
}
