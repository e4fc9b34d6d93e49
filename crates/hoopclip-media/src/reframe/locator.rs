//! Ball and player localization within a single frame.
//!
//! The ball locator is a color filter: threshold in HSV, clean up the mask
//! with opening then closing, and take the centroid of the largest blob whose
//! area is plausible for a ball. Both halves sit behind traits
//! ([`BallDetector`], [`PersonDetector`]) so the OpenCV backends or any other
//! detector can be plugged in.
//!
//! With the `opencv` feature, [`BallLocator`] is the OpenCV implementation;
//! without it, a pure-Rust mask pipeline with the same semantics.

use hoopclip_models::{BoundingBox, Point2D};
use image::RgbImage;
use tracing::debug;

use super::config::ReframeConfig;
#[cfg(not(feature = "opencv"))]
use super::config::{AreaRange, HsvBand};
use crate::error::MediaResult;
use crate::frame::Frame;

#[cfg(feature = "opencv")]
pub use crate::opencv::BallLocator;

/// Anything that can find the ball centroid in an RGB image.
pub trait BallDetector: Send {
    /// Centroid of the ball, or `None` when no plausible blob is present.
    fn locate(&self, image: &RgbImage) -> MediaResult<Option<Point2D>>;
}

/// Anything that can find people in an RGB image.
///
/// Boxes are returned in the coordinates of the image passed in.
pub trait PersonDetector: Send {
    /// Detect people in `image`.
    fn detect(&self, image: &RgbImage) -> MediaResult<Vec<BoundingBox>>;
}

/// Detector that never finds anyone.
///
/// Used when no person backend is configured; selection then falls back to
/// frame-center logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersonDetector;

impl PersonDetector for NoPersonDetector {
    fn detect(&self, _image: &RgbImage) -> MediaResult<Vec<BoundingBox>> {
        Ok(Vec::new())
    }
}

/// Result of running both locators on one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocatorOutput {
    /// Ball centroid, if a plausible ball blob was found
    pub ball: Option<Point2D>,
    /// Upright person boxes in source-frame coordinates
    pub people: Vec<BoundingBox>,
}

impl LocatorOutput {
    /// True when neither a ball nor a person was found.
    pub fn is_empty(&self) -> bool {
        self.ball.is_none() && self.people.is_empty()
    }
}

/// Color-segmentation ball locator.
#[cfg(not(feature = "opencv"))]
#[derive(Debug, Clone)]
pub struct BallLocator {
    band: HsvBand,
    area_range: AreaRange,
    kernel_size: u32,
}

#[cfg(not(feature = "opencv"))]
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
}

#[cfg(not(feature = "opencv"))]
impl BallDetector for BallLocator {
    /// Blobs outside the accepted area range are discarded first; of those
    /// remaining the largest wins. Equal areas keep the first blob in scan
    /// order.
    fn locate(&self, image: &RgbImage) -> MediaResult<Option<Point2D>> {
        use super::{color, morphology};

        let mask = color::in_range(image, &self.band);
        if mask.pixels().all(|p| p.0[0] == 0) {
            return Ok(None);
        }
        let mask = morphology::open(&mask, self.kernel_size);
        let mask = morphology::close(&mask, self.kernel_size);

        let mut best: Option<morphology::Region> = None;
        for region in morphology::external_regions(&mask) {
            if !self.area_range.contains(region.area) {
                continue;
            }
            if best.as_ref().map_or(true, |b| region.area > b.area) {
                best = Some(region);
            }
        }

        Ok(best.map(|region| {
            Point2D::new(
                region.centroid.0.round() as i32,
                region.centroid.1.round() as i32,
            )
        }))
    }
}

/// Person locator: optional downscale, detect, rescale, aspect filter.
pub struct PersonLocator {
    detector: Box<dyn PersonDetector>,
    max_width: u32,
    min_aspect_ratio: f64,
}

impl PersonLocator {
    /// Wrap a detector with the configured downscale ceiling and aspect filter.
    pub fn new(detector: Box<dyn PersonDetector>, max_width: u32, min_aspect_ratio: f64) -> Self {
        Self {
            detector,
            max_width,
            min_aspect_ratio,
        }
    }

    /// Locate upright people in `frame`, in source-frame coordinates.
    pub fn locate(&self, frame: &Frame) -> MediaResult<Vec<BoundingBox>> {
        let (boxes, factor) = match frame.downscaled(self.max_width) {
            Some((resized, factor)) => (self.detector.detect(&resized)?, factor),
            None => (self.detector.detect(frame.image())?, 1.0),
        };

        let mut people = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            let bbox = if factor > 1.0 { bbox.scaled(factor)? } else { bbox };
            if bbox.is_upright(self.min_aspect_ratio) {
                people.push(bbox);
            }
        }
        Ok(people)
    }
}

/// Combined ball and person locator.
pub struct ObjectLocator {
    ball: Box<dyn BallDetector>,
    people: PersonLocator,
}

impl ObjectLocator {
    /// Build from configuration and a person detector backend, using the
    /// default [`BallLocator`].
    pub fn new(config: &ReframeConfig, detector: Box<dyn PersonDetector>) -> Self {
        Self::with_ball_detector(
            Box::new(BallLocator::from_config(config)),
            PersonLocator::new(
                detector,
                config.person_max_width,
                config.person_aspect_min_ratio,
            ),
        )
    }

    /// Build from explicit ball and person backends.
    pub fn with_ball_detector(ball: Box<dyn BallDetector>, people: PersonLocator) -> Self {
        Self { ball, people }
    }

    /// Run both locators on one frame.
    ///
    /// Finding nothing is a normal outcome; errors only come from the
    /// detector backends.
    pub fn locate(&self, frame: &Frame) -> MediaResult<LocatorOutput> {
        let ball = self.ball.locate(frame.image())?;
        let people = self.people.locate(frame)?;

        debug!(
            time = frame.time(),
            ball = ?ball,
            people = people.len(),
            "Located objects"
        );

        Ok(LocatorOutput { ball, people })
    }
}
