//! Crop geometry: from a subject position to a clamped vertical crop.
//!
//! The source is scaled uniformly so its height matches the target height.
//! The crop window is centered on the scaled subject, raised by the vertical
//! bias, then clamped so it never leaves the scaled source. When the scaled
//! source is narrower than the target the window spans the whole axis and
//! the instruction carries padding for the renderer.

use hoopclip_models::{CropInstruction, CropRectangle, FrameSize, Padding, Point2D};

use crate::error::{MediaError, MediaResult};

/// Maps subject positions to crop instructions for one source/target pair.
///
/// Pure: the same subject always yields the same instruction.
#[derive(Debug, Clone, Copy)]
pub struct CropMapper {
    source: FrameSize,
    target: FrameSize,
    scale: f64,
    scaled: FrameSize,
    bias_px: i64,
    fill: [u8; 3],
}

impl CropMapper {
    /// Create a mapper.
    ///
    /// `bias_fraction` is the upward shift of the crop center as a fraction
    /// of the target height and must lie in `[0, 1)`.
    pub fn new(
        source: FrameSize,
        target: FrameSize,
        bias_fraction: f64,
        fill: [u8; 3],
    ) -> MediaResult<Self> {
        if !(0.0..1.0).contains(&bias_fraction) {
            return Err(MediaError::invalid_input(format!(
                "vertical bias fraction must be in [0, 1), got {}",
                bias_fraction
            )));
        }

        let scale = target.height() as f64 / source.height() as f64;
        let scaled_width = ((source.width() as f64 * scale).round() as u32).max(1);
        let scaled_height = ((source.height() as f64 * scale).round() as u32).max(1);
        let scaled = FrameSize::new(scaled_width, scaled_height)?;

        Ok(Self {
            source,
            target,
            scale,
            scaled,
            bias_px: (bias_fraction * target.height() as f64).round() as i64,
            fill,
        })
    }

    /// Uniform scale applied to the source.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Source dimensions after scaling.
    pub fn scaled_size(&self) -> FrameSize {
        self.scaled
    }

    /// Crop instruction for a subject at `subject` (source pixels) at `time`.
    pub fn map(&self, time: f64, subject: Point2D) -> MediaResult<CropInstruction> {
        let scaled_w = self.scaled.width() as i64;
        let scaled_h = self.scaled.height() as i64;
        let target_w = self.target.width() as i64;
        let target_h = self.target.height() as i64;

        let crop_w = target_w.min(scaled_w);
        let crop_h = target_h.min(scaled_h);

        let sx = (subject.x as f64 * self.scale).round() as i64;
        let sy = (subject.y as f64 * self.scale).round() as i64;

        let x = (sx - target_w / 2).clamp(0, scaled_w - crop_w);
        let y = (sy - target_h / 2 - self.bias_px).clamp(0, scaled_h - crop_h);

        let crop = CropRectangle::within(
            x as u32,
            y as u32,
            crop_w as u32,
            crop_h as u32,
            self.scaled,
        )?;

        let padding = (crop_w < target_w || crop_h < target_h).then(|| Padding {
            offset_x: ((target_w - crop_w) / 2) as u32,
            offset_y: ((target_h - crop_h) / 2) as u32,
            fill: self.fill,
        });

        Ok(CropInstruction {
            time,
            scale_factor: self.scale,
            scaled_size: self.scaled,
            crop,
            source_region: self.to_source(&crop)?,
            padding,
        })
    }

    /// Crop instruction centered on the source frame.
    pub fn centered(&self, time: f64) -> MediaResult<CropInstruction> {
        let center = self.source.center();
        // Cancel the bias so the window sits on the true center.
        let lift = (self.bias_px as f64 / self.scale).round() as i32;
        self.map(time, Point2D::new(center.x, center.y + lift))
    }

    /// Express a scaled-space crop in original source pixels.
    fn to_source(&self, crop: &CropRectangle) -> MediaResult<CropRectangle> {
        let src_w = self.source.width();
        let src_h = self.source.height();
        let unscale = |v: u32| (v as f64 / self.scale).round() as u32;

        let width = unscale(crop.width).clamp(1, src_w);
        let height = unscale(crop.height).clamp(1, src_h);
        let x = unscale(crop.x).min(src_w - width);
        let y = unscale(crop.y).min(src_h - height);

        Ok(CropRectangle::within(x, y, width, height, self.source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: u32, h: u32) -> FrameSize {
        FrameSize::new(w, h).unwrap()
    }

    fn landscape_mapper() -> CropMapper {
        CropMapper::new(size(1280, 720), size(1080, 1920), 0.1, [0, 0, 0]).unwrap()
    }

    #[test]
    fn test_landscape_to_vertical_scenario() {
        let mapper = landscape_mapper();
        assert!((mapper.scale() - 2.6667).abs() < 1e-3);
        assert_eq!(mapper.scaled_size(), size(3413, 1920));

        let instruction = mapper.map(1.0, Point2D::new(650, 360)).unwrap();
        // Subject lands at (1733, 960); origin (1193, -192) clamps to (1193, 0).
        assert_eq!(
            instruction.crop,
            CropRectangle {
                x: 1193,
                y: 0,
                width: 1080,
                height: 1920
            }
        );
        assert!(!instruction.padding_required());
        assert_eq!(instruction.source_region.x, 447);
        assert_eq!(instruction.source_region.width, 405);
        assert_eq!(instruction.source_region.height, 720);
    }

    #[test]
    fn test_crop_clamped_at_edges() {
        let mapper = landscape_mapper();

        let left = mapper.map(0.0, Point2D::new(10, 700)).unwrap();
        assert_eq!((left.crop.x, left.crop.y), (0, 0));

        let right = mapper.map(0.0, Point2D::new(1279, 0)).unwrap();
        assert_eq!(right.crop.x, 3413 - 1080);
        assert!(right.crop.fits(mapper.scaled_size()));

        // Off-frame subjects still produce an in-bounds crop.
        let outside = mapper.map(0.0, Point2D::new(-500, 5000)).unwrap();
        assert!(outside.crop.fits(mapper.scaled_size()));
        assert!(outside.source_region.fits(size(1280, 720)));
    }

    #[test]
    fn test_narrow_source_needs_padding() {
        let mapper = CropMapper::new(size(600, 1280), size(1080, 1920), 0.1, [16, 16, 16]).unwrap();
        let instruction = mapper.map(0.0, Point2D::new(300, 640)).unwrap();

        assert_eq!(instruction.crop.x, 0);
        assert_eq!(instruction.crop.width, 900);
        assert_eq!(
            instruction.padding,
            Some(Padding {
                offset_x: 90,
                offset_y: 0,
                fill: [16, 16, 16]
            })
        );
        assert_eq!(instruction.source_region.width, 600);
    }

    #[test]
    fn test_map_is_idempotent() {
        let mapper = landscape_mapper();
        let a = mapper.map(2.0, Point2D::new(900, 200)).unwrap();
        let b = mapper.map(2.0, Point2D::new(900, 200)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_centered_crop_sits_on_frame_center() {
        let mapper = landscape_mapper();
        let instruction = mapper.centered(0.0).unwrap();
        // Scaled center x = 1707; 1707 - 540 = 1167.
        assert_eq!(instruction.crop.x, 1167);
    }

    #[test]
    fn test_rejects_bad_bias() {
        assert!(CropMapper::new(size(1280, 720), size(1080, 1920), 1.0, [0, 0, 0]).is_err());
        assert!(CropMapper::new(size(1280, 720), size(1080, 1920), -0.1, [0, 0, 0]).is_err());
    }
}
