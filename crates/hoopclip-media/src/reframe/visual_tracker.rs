//! Lightweight single-object visual trackers.
//!
//! A tracker is initialized on a box around the subject and then advanced
//! frame by frame. It is much cheaper than a full detection pass, which is
//! why the lifecycle manager only redetects on a fixed cadence.

use hoopclip_models::BoundingBox;
use image::imageops::{self, FilterType};
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Capability interface for a single-object tracker.
pub trait VisualTracker: Send {
    /// Start tracking `bbox` in `frame`, discarding any previous target.
    fn initialize(&mut self, frame: &Frame, bbox: BoundingBox) -> MediaResult<()>;

    /// Follow the target into `frame`.
    ///
    /// Returns `None` when the target is lost. A lost tracker keeps its last
    /// good state and may recover on a later frame.
    fn advance(&mut self, frame: &Frame) -> Option<BoundingBox>;
}

/// Builds fresh tracker instances; one per pipeline.
pub type TrackerFactory = Box<dyn Fn() -> Box<dyn VisualTracker> + Send + Sync>;

/// Configuration for [`TemplateTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateTrackerConfig {
    /// Integer downscale applied before matching (default: 2)
    pub downscale: u32,
    /// Maximum per-frame displacement searched, in source pixels (default: 24)
    pub search_radius: u32,
    /// Normalized cross-correlation below which the target is lost (default: 0.5)
    pub min_correlation: f64,
}

impl Default for TemplateTrackerConfig {
    fn default() -> Self {
        Self {
            downscale: 2,
            search_radius: 24,
            min_correlation: 0.5,
        }
    }
}

impl TemplateTrackerConfig {
    /// Reject unusable tracker settings.
    pub fn validate(&self) -> MediaResult<()> {
        if self.downscale == 0 {
            return Err(MediaError::invalid_config("template_tracker.downscale must be at least 1"));
        }
        if self.search_radius == 0 {
            return Err(MediaError::invalid_config(
                "template_tracker.search_radius must be positive",
            ));
        }
        if !(-1.0..=1.0).contains(&self.min_correlation) {
            return Err(MediaError::invalid_config(format!(
                "template_tracker.min_correlation must be in [-1, 1], got {}",
                self.min_correlation
            )));
        }
        Ok(())
    }
}

/// Zero-mean template patch in downscaled coordinates.
#[derive(Debug, Clone)]
struct Template {
    pixels: Vec<f32>,
    width: u32,
    height: u32,
    norm: f32,
    mean: f32,
}

/// Grayscale template tracker using normalized cross-correlation.
///
/// The template is captured once at initialization. Each advance searches a
/// square window around the previous position in a downscaled luma image
/// and keeps the best-correlated offset; ties favour the smallest move.
#[derive(Debug, Clone)]
pub struct TemplateTracker {
    config: TemplateTrackerConfig,
    template: Option<Template>,
    /// Last good box in source pixels
    bbox: Option<BoundingBox>,
    /// Top-left of the template in downscaled pixels
    position: (i64, i64),
}

impl TemplateTracker {
    /// Create an uninitialized tracker.
    pub fn new(config: TemplateTrackerConfig) -> Self {
        Self {
            config,
            template: None,
            bbox: None,
            position: (0, 0),
        }
    }

    fn reduce(&self, frame: &Frame) -> GrayImage {
        let gray = frame.to_gray();
        let d = self.config.downscale.max(1);
        if d == 1 {
            return gray;
        }
        let width = (gray.width() / d).max(1);
        let height = (gray.height() / d).max(1);
        imageops::resize(&gray, width, height, FilterType::Triangle)
    }

    fn correlation(template: &Template, image: &GrayImage, left: u32, top: u32) -> f32 {
        let count = (template.width * template.height) as f32;
        let mut sum = 0f32;
        for y in 0..template.height {
            for x in 0..template.width {
                sum += image.get_pixel(left + x, top + y).0[0] as f32;
            }
        }
        let mean = sum / count;

        let mut cross = 0f32;
        let mut energy = 0f32;
        for y in 0..template.height {
            for x in 0..template.width {
                let v = image.get_pixel(left + x, top + y).0[0] as f32 - mean;
                cross += v * template.pixels[(y * template.width + x) as usize];
                energy += v * v;
            }
        }

        let denom = energy.sqrt() * template.norm;
        if denom < 1e-3 {
            // Flat patch or flat template: only identical flat regions match.
            return if template.norm < 1e-3 && energy < 1e-3 && (mean - template.mean).abs() < 2.0 {
                1.0
            } else {
                0.0
            };
        }
        cross / denom
    }
}

impl Default for TemplateTracker {
    fn default() -> Self {
        Self::new(TemplateTrackerConfig::default())
    }
}

impl VisualTracker for TemplateTracker {
    fn initialize(&mut self, frame: &Frame, bbox: BoundingBox) -> MediaResult<()> {
        let clipped = bbox.clip_to(frame.size()).ok_or_else(|| {
            MediaError::tracker_failed(format!(
                "initial box {}x{}+{}+{} lies outside {} frame",
                bbox.width(),
                bbox.height(),
                bbox.x(),
                bbox.y(),
                frame.size()
            ))
        })?;

        let reduced = self.reduce(frame);
        let d = self.config.downscale.max(1) as i64;
        let left = (clipped.x() as i64 / d).min(reduced.width() as i64 - 1);
        let top = (clipped.y() as i64 / d).min(reduced.height() as i64 - 1);
        let width = (clipped.width() as i64 / d).min(reduced.width() as i64 - left);
        let height = (clipped.height() as i64 / d).min(reduced.height() as i64 - top);
        if width < 2 || height < 2 {
            return Err(MediaError::tracker_failed(format!(
                "box {}x{} too small to track",
                clipped.width(),
                clipped.height()
            )));
        }

        let (width, height) = (width as u32, height as u32);
        let patch = imageops::crop_imm(&reduced, left as u32, top as u32, width, height).to_image();
        let count = (width * height) as f32;
        let mean = patch.pixels().map(|p| p.0[0] as f32).sum::<f32>() / count;
        let pixels: Vec<f32> = patch.pixels().map(|p| p.0[0] as f32 - mean).collect();
        let norm = pixels.iter().map(|v| v * v).sum::<f32>().sqrt();

        self.template = Some(Template {
            pixels,
            width,
            height,
            norm,
            mean,
        });
        self.bbox = Some(bbox);
        self.position = (left, top);
        Ok(())
    }

    fn advance(&mut self, frame: &Frame) -> Option<BoundingBox> {
        let template = self.template.as_ref()?;
        let bbox = self.bbox?;
        let reduced = self.reduce(frame);

        let max_left = reduced.width() as i64 - template.width as i64;
        let max_top = reduced.height() as i64 - template.height as i64;
        if max_left < 0 || max_top < 0 {
            return None;
        }

        let d = self.config.downscale.max(1) as i64;
        let radius = (self.config.search_radius as i64 / d).max(1);
        let (px, py) = self.position;

        let mut best: Option<(f32, i64, i64)> = None;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (left, top) = (px + dx, py + dy);
                if left < 0 || top < 0 || left > max_left || top > max_top {
                    continue;
                }
                let score = Self::correlation(template, &reduced, left as u32, top as u32);
                let better = match best {
                    None => true,
                    Some((s, bx, by)) => {
                        score > s
                            || (score == s && dx * dx + dy * dy < (bx - px).pow(2) + (by - py).pow(2))
                    }
                };
                if better {
                    best = Some((score, left, top));
                }
            }
        }

        let (score, left, top) = best?;
        if (score as f64) < self.config.min_correlation {
            return None;
        }

        let moved = bbox.moved_to(
            bbox.x() + ((left - px) * d) as i32,
            bbox.y() + ((top - py) * d) as i32,
        );
        if !frame.size().contains(&moved.center()) {
            return None;
        }

        self.position = (left, top);
        self.bbox = Some(moved);
        Some(moved)
    }
}
