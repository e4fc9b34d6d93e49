//! Crop rectangles and the per-timestamp instructions consumed by the renderer.

use crate::geometry::{FrameSize, GeometryError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Crop region inside a governing frame.
///
/// [`CropRectangle::within`] checks `x + width <= bounds.width` and
/// `y + height <= bounds.height`. Deserialization only rejects empty or
/// overflowing rectangles since the bounds are not known there; use
/// [`CropRectangle::check_within`] once they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "RawCropRectangle", into = "RawCropRectangle")]
pub struct CropRectangle {
    /// Left edge x-coordinate
    pub x: u32,
    /// Top edge y-coordinate
    pub y: u32,
    /// Crop width
    pub width: u32,
    /// Crop height
    pub height: u32,
}

#[derive(Serialize, Deserialize, JsonSchema)]
struct RawCropRectangle {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl TryFrom<RawCropRectangle> for CropRectangle {
    type Error = GeometryError;

    fn try_from(raw: RawCropRectangle) -> Result<Self, Self::Error> {
        let RawCropRectangle {
            x,
            y,
            width,
            height,
        } = raw;
        if width == 0
            || height == 0
            || x.checked_add(width).is_none()
            || y.checked_add(height).is_none()
        {
            return Err(GeometryError::InvalidCrop {
                x,
                y,
                width,
                height,
            });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }
}

impl From<CropRectangle> for RawCropRectangle {
    fn from(crop: CropRectangle) -> Self {
        RawCropRectangle {
            x: crop.x,
            y: crop.y,
            width: crop.width,
            height: crop.height,
        }
    }
}

impl CropRectangle {
    /// Create a crop rectangle, validating it against `bounds`.
    pub fn within(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        bounds: FrameSize,
    ) -> Result<Self, GeometryError> {
        let fits_x = x as u64 + width as u64 <= bounds.width() as u64;
        let fits_y = y as u64 + height as u64 <= bounds.height() as u64;
        if width == 0 || height == 0 || !fits_x || !fits_y {
            return Err(GeometryError::CropOutOfBounds {
                x,
                y,
                width,
                height,
                bounds_width: bounds.width(),
                bounds_height: bounds.height(),
            });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Validate an existing rectangle against `bounds`.
    pub fn check_within(&self, bounds: FrameSize) -> Result<(), GeometryError> {
        Self::within(self.x, self.y, self.width, self.height, bounds).map(|_| ())
    }

    /// Right edge (exclusive).
    pub fn x2(&self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn y2(&self) -> u32 {
        self.y + self.height
    }

    /// Returns true if the rectangle lies inside `bounds`.
    pub fn fits(&self, bounds: FrameSize) -> bool {
        self.x2() <= bounds.width() && self.y2() <= bounds.height()
    }

    /// Linear interpolation between two rectangles sharing the same bounds.
    ///
    /// The result is re-clamped so rounding never pushes it past `bounds`.
    pub fn lerp(a: &CropRectangle, b: &CropRectangle, t: f64, bounds: FrameSize) -> CropRectangle {
        let t = t.clamp(0.0, 1.0);
        let mix = |p: u32, q: u32| (p as f64 + t * (q as f64 - p as f64)).round() as u32;

        let width = mix(a.width, b.width).clamp(1, bounds.width());
        let height = mix(a.height, b.height).clamp(1, bounds.height());
        let x = mix(a.x, b.x).min(bounds.width() - width);
        let y = mix(a.y, b.y).min(bounds.height() - height);

        CropRectangle {
            x,
            y,
            width,
            height,
        }
    }
}

/// Instruction to center an undersized region on the target canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Padding {
    /// Horizontal offset of the region inside the target canvas
    pub offset_x: u32,
    /// Vertical offset of the region inside the target canvas
    pub offset_y: u32,
    /// RGB fill for the uncovered canvas area
    pub fill: [u8; 3],
}

/// One entry of the crop stream handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CropInstruction {
    /// Timestamp in seconds
    pub time: f64,
    /// Uniform scale applied to the source so its height fills the target
    pub scale_factor: f64,
    /// Source dimensions after uniform scaling
    pub scaled_size: FrameSize,
    /// Crop region in scaled-source pixels
    pub crop: CropRectangle,
    /// The same region expressed in original source pixels
    pub source_region: CropRectangle,
    /// Present when the region is smaller than the target along an axis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Padding>,
}

impl CropInstruction {
    /// True when the renderer must letterbox instead of filling the canvas.
    pub fn padding_required(&self) -> bool {
        self.padding.is_some()
    }
}
