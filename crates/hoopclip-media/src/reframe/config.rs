//! Configuration for the reframing pipeline.
//!
//! Every threshold and cadence the pipeline uses lives here so runs are
//! reproducible and tunable without code changes.

use crate::error::{MediaError, MediaResult};
use hoopclip_models::FrameSize;
use serde::{Deserialize, Serialize};

use super::visual_tracker::TemplateTrackerConfig;

/// Inclusive HSV threshold band in OpenCV units (H: 0-179, S/V: 0-255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvBand {
    /// Basketball orange.
    pub const ORANGE: HsvBand = HsvBand {
        lower: [5, 50, 50],
        upper: [25, 255, 255],
    };

    /// Returns true if the HSV triple falls inside the band on every channel.
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

impl Default for HsvBand {
    fn default() -> Self {
        Self::ORANGE
    }
}

/// Accepted blob area in pixels, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaRange {
    pub min: u32,
    pub max: u32,
}

impl AreaRange {
    /// Returns true if `area` lies inside the range.
    #[inline]
    pub fn contains(&self, area: u32) -> bool {
        area >= self.min && area <= self.max
    }
}

impl Default for AreaRange {
    fn default() -> Self {
        Self { min: 50, max: 50_000 }
    }
}

/// Parameters for the multi-scale HOG people detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HogParams {
    /// SVM decision threshold (lower finds more people)
    pub hit_threshold: f64,
    /// Sliding window stride in pixels
    pub win_stride: i32,
    /// Padding added around the image in pixels
    pub padding: i32,
    /// Pyramid scale step
    pub scale: f64,
    /// Minimum overlapping hits for a grouped detection
    pub group_threshold: f64,
}

impl Default for HogParams {
    fn default() -> Self {
        Self {
            hit_threshold: 0.6,
            win_stride: 8,
            padding: 32,
            scale: 1.05,
            group_threshold: 2.0,
        }
    }
}

/// Configuration for the reframing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReframeConfig {
    // === Cadence ===
    /// Source-time interval between full detections (default: 0.5s)
    pub redetection_interval_secs: f64,

    /// Sampling step for position computation; `None` uses the supplier's native fps
    pub sample_interval_secs: Option<f64>,

    /// Follow the subject; when false every crop is centered (default: true)
    pub enable_tracking: bool,

    // === Ball Localization ===
    /// HSV band for the ball color
    pub ball_color_band: HsvBand,

    /// Accepted ball blob area in pixels (default: 50..=50000)
    pub ball_area_range: AreaRange,

    /// Side of the square opening/closing kernel (default: 5)
    pub morph_kernel_size: u32,

    // === Person Localization ===
    /// Frames wider than this are downscaled before person detection (default: 1280)
    pub person_max_width: u32,

    /// Boxes with height < ratio * width are discarded (default: 0.8)
    pub person_aspect_min_ratio: f64,

    /// HOG detector parameters (OpenCV backend)
    pub hog: HogParams,

    // === Subject Selection ===
    /// Maximum ball-to-player distance for a match, in pixels (default: 200)
    pub ball_match_radius: f64,

    // === Tracking ===
    /// Side of the box handed to the visual tracker after a detection (default: 150)
    pub tracker_box_size: u32,

    /// Parameters for the built-in template tracker
    pub template_tracker: TemplateTrackerConfig,

    // === Smoothing ===
    /// Ring buffer capacity of the position smoother (default: 7)
    pub smoothing_window_size: usize,

    // === Crop Geometry ===
    /// Output width (default: 1080)
    pub target_width: u32,

    /// Output height (default: 1920)
    pub target_height: u32,

    /// Upward shift of the crop center as a fraction of target height (default: 0.1)
    pub vertical_bias_fraction: f64,

    /// RGB fill used when the crop must be padded (default: black)
    pub pad_fill: [u8; 3],
}

impl Default for ReframeConfig {
    fn default() -> Self {
        Self {
            redetection_interval_secs: 0.5,
            sample_interval_secs: None,
            enable_tracking: true,

            ball_color_band: HsvBand::ORANGE,
            ball_area_range: AreaRange::default(),
            morph_kernel_size: 5,

            person_max_width: 1280,
            person_aspect_min_ratio: 0.8,
            hog: HogParams::default(),

            ball_match_radius: 200.0,

            tracker_box_size: 150,
            template_tracker: TemplateTrackerConfig::default(),

            smoothing_window_size: 7,

            // YouTube Shorts / TikTok portrait
            target_width: 1080,
            target_height: 1920,
            vertical_bias_fraction: 0.1,
            pad_fill: [0, 0, 0],
        }
    }
}

impl ReframeConfig {
    /// Fast configuration for previews: sparse sampling and detection.
    pub fn fast() -> Self {
        Self {
            redetection_interval_secs: 1.0,
            sample_interval_secs: Some(1.0 / 15.0),
            person_max_width: 960,
            smoothing_window_size: 5,
            ..Default::default()
        }
    }

    /// Quality configuration: denser detection and a longer smoothing window.
    pub fn quality() -> Self {
        Self {
            redetection_interval_secs: 0.25,
            smoothing_window_size: 9,
            ..Default::default()
        }
    }

    /// Defaults overlaid with `HOOPCLIP_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary key lookup.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|s| s.trim().parse().ok())
        }

        let defaults = Self::default();
        Self {
            redetection_interval_secs: parse(lookup("HOOPCLIP_REDETECT_INTERVAL"))
                .unwrap_or(defaults.redetection_interval_secs),
            sample_interval_secs: parse(lookup("HOOPCLIP_SAMPLE_INTERVAL"))
                .or(defaults.sample_interval_secs),
            enable_tracking: parse(lookup("HOOPCLIP_ENABLE_TRACKING"))
                .unwrap_or(defaults.enable_tracking),
            ball_area_range: AreaRange {
                min: parse(lookup("HOOPCLIP_BALL_MIN_AREA")).unwrap_or(defaults.ball_area_range.min),
                max: parse(lookup("HOOPCLIP_BALL_MAX_AREA")).unwrap_or(defaults.ball_area_range.max),
            },
            person_max_width: parse(lookup("HOOPCLIP_PERSON_MAX_WIDTH"))
                .unwrap_or(defaults.person_max_width),
            ball_match_radius: parse(lookup("HOOPCLIP_MATCH_RADIUS"))
                .unwrap_or(defaults.ball_match_radius),
            smoothing_window_size: parse(lookup("HOOPCLIP_SMOOTHING_WINDOW"))
                .unwrap_or(defaults.smoothing_window_size),
            target_width: parse(lookup("HOOPCLIP_TARGET_WIDTH")).unwrap_or(defaults.target_width),
            target_height: parse(lookup("HOOPCLIP_TARGET_HEIGHT"))
                .unwrap_or(defaults.target_height),
            vertical_bias_fraction: parse(lookup("HOOPCLIP_VERTICAL_BIAS"))
                .unwrap_or(defaults.vertical_bias_fraction),
            ..defaults
        }
    }

    /// Parse a JSON configuration document; missing fields take defaults.
    pub fn from_json(json: &str) -> MediaResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Output canvas dimensions.
    pub fn target_size(&self) -> MediaResult<FrameSize> {
        Ok(FrameSize::new(self.target_width, self.target_height)?)
    }

    /// Reject configurations no pipeline can run with.
    pub fn validate(&self) -> MediaResult<()> {
        if !(self.redetection_interval_secs.is_finite() && self.redetection_interval_secs > 0.0) {
            return Err(MediaError::invalid_config(format!(
                "redetection_interval_secs must be positive, got {}",
                self.redetection_interval_secs
            )));
        }
        if let Some(step) = self.sample_interval_secs {
            if !(step.is_finite() && step > 0.0) {
                return Err(MediaError::invalid_config(format!(
                    "sample_interval_secs must be positive, got {}",
                    step
                )));
            }
        }
        if self.ball_area_range.min > self.ball_area_range.max {
            return Err(MediaError::invalid_config(format!(
                "ball_area_range is inverted: {}..{}",
                self.ball_area_range.min, self.ball_area_range.max
            )));
        }
        if self.morph_kernel_size == 0 {
            return Err(MediaError::invalid_config("morph_kernel_size must be at least 1"));
        }
        if self.person_aspect_min_ratio < 0.0 || !self.person_aspect_min_ratio.is_finite() {
            return Err(MediaError::invalid_config(
                "person_aspect_min_ratio must be a non-negative number",
            ));
        }
        if !(self.ball_match_radius.is_finite() && self.ball_match_radius > 0.0) {
            return Err(MediaError::invalid_config("ball_match_radius must be positive"));
        }
        if self.tracker_box_size == 0 {
            return Err(MediaError::invalid_config("tracker_box_size must be positive"));
        }
        if self.smoothing_window_size == 0 {
            return Err(MediaError::invalid_config("smoothing_window_size must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.vertical_bias_fraction) {
            return Err(MediaError::invalid_config(format!(
                "vertical_bias_fraction must be in [0, 1), got {}",
                self.vertical_bias_fraction
            )));
        }
        self.template_tracker.validate()?;
        self.target_size()?;
        Ok(())
    }
}
