//! Color-segmentation ball locator on OpenCV.

use hoopclip_models::Point2D;
use image::RgbImage;
use opencv::core::{self, Mat, Point, Scalar, Size, Vector};
use opencv::imgproc;
use opencv::prelude::*;
use tracing::trace;

use super::rgb_to_bgr_mat;
use crate::error::{MediaError, MediaResult};
use crate::reframe::config::{AreaRange, HsvBand, ReframeConfig};
use crate::reframe::locator::BallDetector;

/// HSV threshold, open then close, external contours, largest plausible
/// contour's centroid.
///
/// Area is the contour polygon area, so a solid `n x n` square measures
/// `(n - 1)^2`.
#[derive(Debug, Clone)]
pub struct BallLocator {
    band: HsvBand,
    area_range: AreaRange,
    kernel_size: u32,
}

impl BallLocator {
    /// Create a locator with an explicit band, area range and kernel size.
    pub fn new(band: HsvBand, area_range: AreaRange, kernel_size: u32) -> Self {
        Self {
            band,
            area_range,
            kernel_size: kernel_size.max(1),
        }
    }

    /// Create a locator from pipeline configuration.
    pub fn from_config(config: &ReframeConfig) -> Self {
        Self::new(
            config.ball_color_band,
            config.ball_area_range,
            config.morph_kernel_size,
        )
    }

    fn mask(&self, image: &RgbImage) -> MediaResult<Mat> {
        let cv = |e: opencv::Error| MediaError::detection_failed(format!("Ball mask: {e}"));

        let bgr = rgb_to_bgr_mat(image)?;
        let mut hsv = Mat::default();
        imgproc::cvt_color_def(&bgr, &mut hsv, imgproc::COLOR_BGR2HSV).map_err(cv)?;

        let [lh, ls, lv] = self.band.lower;
        let [uh, us, uv] = self.band.upper;
        let mut mask = Mat::default();
        core::in_range(
            &hsv,
            &Scalar::new(lh as f64, ls as f64, lv as f64, 0.0),
            &Scalar::new(uh as f64, us as f64, uv as f64, 0.0),
            &mut mask,
        )
        .map_err(cv)?;
        if core::count_non_zero(&mask).map_err(cv)? == 0 {
            return Ok(mask);
        }

        let k = self.kernel_size as i32;
        let kernel =
            imgproc::get_structuring_element(imgproc::MORPH_RECT, Size::new(k, k), Point::new(-1, -1))
                .map_err(cv)?;
        let mut opened = Mat::default();
        imgproc::morphology_ex_def(&mask, &mut opened, imgproc::MORPH_OPEN, &kernel).map_err(cv)?;
        let mut closed = Mat::default();
        imgproc::morphology_ex_def(&opened, &mut closed, imgproc::MORPH_CLOSE, &kernel)
            .map_err(cv)?;
        Ok(closed)
    }

    fn largest_centroid(&self, mask: &Mat) -> opencv::Result<Option<Point2D>> {
        let mut contours: Vector<Vector<Point>> = Vector::new();
        imgproc::find_contours(
            mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;

        let (min, max) = (self.area_range.min as f64, self.area_range.max as f64);
        let mut best: Option<(f64, Vector<Point>)> = None;
        for contour in contours.iter() {
            let area = imgproc::contour_area(&contour, false)?;
            if area < min || area > max {
                continue;
            }
            if best.as_ref().map_or(true, |(b, _)| area > *b) {
                best = Some((area, contour));
            }
        }

        let Some((area, contour)) = best else {
            return Ok(None);
        };
        let m = imgproc::moments(&contour, false)?;
        if m.m00 <= 0.0 {
            return Ok(None);
        }
        trace!(area, "Ball contour selected");
        Ok(Some(Point2D::new(
            (m.m10 / m.m00).round() as i32,
            (m.m01 / m.m00).round() as i32,
        )))
    }
}

impl BallDetector for BallLocator {
    fn locate(&self, image: &RgbImage) -> MediaResult<Option<Point2D>> {
        let mask = self.mask(image)?;
        self.largest_centroid(&mask)
            .map_err(|e| MediaError::detection_failed(format!("Ball contours: {e}")))
    }
}
