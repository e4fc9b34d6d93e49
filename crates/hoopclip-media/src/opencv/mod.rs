//! OpenCV backends (`opencv` feature, on by default).
//!
//! - [`BallLocator`]: HSV threshold, morphology and contour moments
//! - [`HogPersonDetector`]: multi-scale HOG + linear SVM people detector
//! - [`CsrtTracker`]: CSRT single-object tracker
//! - [`CaptureFrameSupplier`]: frames decoded with `VideoCapture`
//!
//! OpenCV works in BGR; conversions to and from the crate's RGB buffers live
//! here.

mod ball;
mod capture;
mod csrt;
mod hog;

pub use ball::BallLocator;
pub use capture::CaptureFrameSupplier;
pub use csrt::CsrtTracker;
pub use hog::HogPersonDetector;

use hoopclip_models::BoundingBox;
use image::RgbImage;
use opencv::core::{Mat, Rect};
use opencv::imgproc;
use opencv::prelude::*;

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Copy an RGB image into a BGR `Mat`.
pub(crate) fn rgb_to_bgr_mat(image: &RgbImage) -> MediaResult<Mat> {
    let rows = image.height() as i32;
    let flat = Mat::from_slice(image.as_raw().as_slice())
        .map_err(|e| MediaError::internal(format!("Wrap RGB buffer: {e}")))?;
    let rgb = flat
        .reshape(3, rows)
        .map_err(|e| MediaError::internal(format!("Reshape RGB buffer: {e}")))?;

    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR)
        .map_err(|e| MediaError::internal(format!("RGB to BGR: {e}")))?;
    Ok(bgr)
}

/// Convert a decoded BGR `Mat` into a frame.
pub(crate) fn bgr_mat_to_frame(time: f64, mat: &Mat) -> MediaResult<Frame> {
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(mat, &mut rgb, imgproc::COLOR_BGR2RGB)
        .map_err(|e| MediaError::frame_source(format!("BGR to RGB: {e}")))?;

    let width = rgb.cols() as u32;
    let height = rgb.rows() as u32;
    let data = rgb
        .data_bytes()
        .map_err(|e| MediaError::frame_source(format!("Read frame bytes: {e}")))?
        .to_vec();
    Frame::from_rgb(time, width, height, data)
}

pub(crate) fn to_rect(bbox: &BoundingBox) -> Rect {
    Rect::new(bbox.x(), bbox.y(), bbox.width(), bbox.height())
}

pub(crate) fn from_rect(rect: &Rect) -> Option<BoundingBox> {
    BoundingBox::new(rect.x, rect.y, rect.width, rect.height).ok()
}
