//! HOG people detector.

use hoopclip_models::BoundingBox;
use image::RgbImage;
use opencv::core::{Rect, Size, Vector};
use opencv::objdetect::HOGDescriptor;
use opencv::prelude::*;
use tracing::debug;

use super::{from_rect, rgb_to_bgr_mat};
use crate::error::{MediaError, MediaResult};
use crate::reframe::config::HogParams;
use crate::reframe::locator::PersonDetector;

/// OpenCV's default 64x128 people detector over an image pyramid.
pub struct HogPersonDetector {
    hog: HOGDescriptor,
    params: HogParams,
}

impl HogPersonDetector {
    /// Create a detector loaded with the built-in people SVM.
    pub fn new(params: HogParams) -> MediaResult<Self> {
        let mut hog = HOGDescriptor::default()
            .map_err(|e| MediaError::detection_failed(format!("Create HOG descriptor: {e}")))?;
        let svm = HOGDescriptor::get_default_people_detector()
            .map_err(|e| MediaError::detection_failed(format!("Load people SVM: {e}")))?;
        hog.set_svm_detector(&svm)
            .map_err(|e| MediaError::detection_failed(format!("Set SVM detector: {e}")))?;
        Ok(Self { hog, params })
    }
}

impl PersonDetector for HogPersonDetector {
    fn detect(&self, image: &RgbImage) -> MediaResult<Vec<BoundingBox>> {
        let mat = rgb_to_bgr_mat(image)?;
        let mut found: Vector<Rect> = Vector::new();
        let stride = self.params.win_stride;
        let padding = self.params.padding;

        self.hog
            .detect_multi_scale(
                &mat,
                &mut found,
                self.params.hit_threshold,
                Size::new(stride, stride),
                Size::new(padding, padding),
                self.params.scale,
                self.params.group_threshold,
                false,
            )
            .map_err(|e| MediaError::detection_failed(format!("HOG detect: {e}")))?;

        let boxes: Vec<BoundingBox> = found.iter().filter_map(|r| from_rect(&r)).collect();
        debug!(count = boxes.len(), "HOG people detections");
        Ok(boxes)
    }
}
