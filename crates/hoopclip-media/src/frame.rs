//! Decoded video frames.

use crate::error::{MediaError, MediaResult};
use hoopclip_models::FrameSize;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

/// An immutable RGB frame (8 bits per channel) and its capture time.
///
/// Frames are owned by whoever supplies them; the reframing pipeline borrows
/// each one for the duration of a single step and never stores it.
#[derive(Debug, Clone)]
pub struct Frame {
    time: f64,
    size: FrameSize,
    image: RgbImage,
}

impl Frame {
    /// Wrap an RGB image. Zero-sized images are rejected.
    pub fn new(time: f64, image: RgbImage) -> MediaResult<Self> {
        let size = FrameSize::new(image.width(), image.height())
            .map_err(|_| MediaError::EmptyFrame { time })?;
        Ok(Self { time, size, image })
    }

    /// Build a frame from tightly packed RGB bytes.
    pub fn from_rgb(time: f64, width: u32, height: u32, data: Vec<u8>) -> MediaResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(MediaError::invalid_input(format!(
                "expected {} bytes for {}x{} RGB frame, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        let image = RgbImage::from_raw(width, height, data)
            .ok_or_else(|| MediaError::internal("RGB buffer rejected by image crate"))?;
        Self::new(time, image)
    }

    /// Capture time in seconds.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Frame dimensions.
    #[inline]
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Borrow the pixel buffer.
    #[inline]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Luma version of the frame, used by the template tracker.
    pub fn to_gray(&self) -> GrayImage {
        imageops::grayscale(&self.image)
    }

    /// Downscale so the width does not exceed `max_width`.
    ///
    /// Returns the resized image and the factor that maps resized coordinates
    /// back to this frame (`>= 1.0`), or `None` when no resize is needed.
    pub fn downscaled(&self, max_width: u32) -> Option<(RgbImage, f64)> {
        let width = self.image.width();
        if max_width == 0 || width <= max_width {
            return None;
        }
        let scale = max_width as f64 / width as f64;
        let new_height = ((self.image.height() as f64 * scale).round() as u32).max(1);
        let resized = imageops::resize(&self.image, max_width, new_height, FilterType::Triangle);
        Some((resized, width as f64 / max_width as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_frame_rejected() {
        let err = Frame::new(1.5, RgbImage::new(0, 10)).unwrap_err();
        assert!(matches!(err, MediaError::EmptyFrame { .. }));
    }

    #[test]
    fn test_from_rgb_validates_length() {
        assert!(Frame::from_rgb(0.0, 2, 2, vec![0; 12]).is_ok());
        assert!(Frame::from_rgb(0.0, 2, 2, vec![0; 11]).is_err());
    }

    #[test]
    fn test_downscale_only_above_ceiling() {
        let small = Frame::new(0.0, RgbImage::new(1280, 720)).unwrap();
        assert!(small.downscaled(1280).is_none());

        let large = Frame::new(0.0, RgbImage::new(1920, 1080)).unwrap();
        let (resized, factor) = large.downscaled(1280).unwrap();
        assert_eq!(resized.width(), 1280);
        assert_eq!(resized.height(), 720);
        assert!((factor - 1.5).abs() < 1e-9);
    }
}
