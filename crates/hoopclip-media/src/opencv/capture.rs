//! Frames decoded from a video file with `VideoCapture`.

use std::path::Path;

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_POS_MSEC};
use tracing::debug;

use super::bgr_mat_to_frame;
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::supplier::FrameSupplier;

/// Seeks to each requested time and decodes the frame there.
pub struct CaptureFrameSupplier {
    cap: VideoCapture,
    fps: f64,
}

impl CaptureFrameSupplier {
    /// Open a video file.
    pub fn open<P: AsRef<Path>>(path: P) -> MediaResult<Self> {
        let path = path.as_ref();
        let name = path
            .to_str()
            .ok_or_else(|| MediaError::invalid_input(format!("Non UTF-8 path: {}", path.display())))?;

        let cap = VideoCapture::from_file(name, CAP_ANY)
            .map_err(|e| MediaError::frame_source(format!("Open video: {e}")))?;
        if !cap.is_opened().unwrap_or(false) {
            return Err(MediaError::frame_source(format!(
                "Failed to open video {}",
                path.display()
            )));
        }

        let fps = cap
            .get(CAP_PROP_FPS)
            .map_err(|e| MediaError::frame_source(format!("Read fps: {e}")))?;
        debug!(path = %path.display(), fps, "Opened video");
        Ok(Self { cap, fps })
    }
}

impl FrameSupplier for CaptureFrameSupplier {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_at(&mut self, time: f64) -> MediaResult<Option<Frame>> {
        self.cap
            .set(CAP_PROP_POS_MSEC, time * 1000.0)
            .map_err(|e| MediaError::frame_source(format!("Seek: {e}")))?;

        let mut mat = Mat::default();
        let read = self
            .cap
            .read(&mut mat)
            .map_err(|e| MediaError::frame_source(format!("Read: {e}")))?;
        if !read || mat.empty() {
            return Ok(None);
        }
        bgr_mat_to_frame(time, &mat).map(Some)
    }
}
