//! Image-plane geometry shared by the locator, tracker and crop mapper.
//!
//! All coordinates are integer pixels. Boxes carry the invariant
//! `width > 0 && height > 0`; the only way to obtain one is through a
//! validating constructor.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when geometry is constructed from invalid inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("frame dimensions must be positive, got {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },

    #[error("bounding box dimensions must be positive, got {width}x{height}")]
    InvalidBox { width: i32, height: i32 },

    #[error("scale factor must be finite and positive, got {0}")]
    InvalidScale(f64),

    #[error("crop {width}x{height}+{x}+{y} is empty or overflows the coordinate range")]
    InvalidCrop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("crop {width}x{height}+{x}+{y} exceeds bounds {bounds_width}x{bounds_height}")]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        bounds_width: u32,
        bounds_height: u32,
    },
}

/// Integer point in image-plane coordinates.
///
/// There is no inherent validity range; whether a point lies inside a frame
/// depends on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
}

impl Point2D {
    /// Create a new point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::fmt::Display for Point2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Validated frame dimensions (both axes strictly positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "RawFrameSize", into = "RawFrameSize")]
pub struct FrameSize {
    width: u32,
    height: u32,
}

#[derive(Serialize, Deserialize, JsonSchema)]
struct RawFrameSize {
    width: u32,
    height: u32,
}

impl TryFrom<RawFrameSize> for FrameSize {
    type Error = GeometryError;

    fn try_from(raw: RawFrameSize) -> Result<Self, Self::Error> {
        FrameSize::new(raw.width, raw.height)
    }
}

impl From<FrameSize> for RawFrameSize {
    fn from(size: FrameSize) -> Self {
        RawFrameSize {
            width: size.width,
            height: size.height,
        }
    }
}

impl FrameSize {
    /// Create a frame size, rejecting zero-sized axes.
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidFrameSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Geometric center (integer division, matching box centers).
    pub fn center(&self) -> Point2D {
        Point2D::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// Returns true if the point lies inside the frame.
    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as i64) < self.width as i64
            && (point.y as i64) < self.height as i64
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned bounding box in pixel coordinates.
///
/// May lie partially or fully outside a frame until clipped with
/// [`BoundingBox::clip_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "RawBox", into = "RawBox")]
pub struct BoundingBox {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

#[derive(Serialize, Deserialize, JsonSchema)]
struct RawBox {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl TryFrom<RawBox> for BoundingBox {
    type Error = GeometryError;

    fn try_from(raw: RawBox) -> Result<Self, Self::Error> {
        BoundingBox::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl From<BoundingBox> for RawBox {
    fn from(b: BoundingBox) -> Self {
        RawBox {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
        }
    }
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Result<Self, GeometryError> {
        if width <= 0 || height <= 0 {
            return Err(GeometryError::InvalidBox { width, height });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Square box of side `size` centered on `center`.
    pub fn centered_on(center: Point2D, size: i32) -> Result<Self, GeometryError> {
        Self::new(center.x - size / 2, center.y - size / 2, size, size)
    }

    /// Left edge x-coordinate.
    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Top edge y-coordinate.
    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Box width.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Box height.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn x2(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn y2(&self) -> i32 {
        self.y + self.height
    }

    /// Box center using integer halves.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Box area in pixels.
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// True when the box is at least `min_ratio` times as tall as it is wide.
    pub fn is_upright(&self, min_ratio: f64) -> bool {
        self.height as f64 >= min_ratio * self.width as f64
    }

    /// Multiply every coordinate by `factor`, keeping each side at least one pixel.
    pub fn scaled(&self, factor: f64) -> Result<Self, GeometryError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(GeometryError::InvalidScale(factor));
        }
        let scale = |v: i32| (v as f64 * factor).round() as i32;
        Self::new(
            scale(self.x),
            scale(self.y),
            scale(self.width).max(1),
            scale(self.height).max(1),
        )
    }

    /// Same-size box moved so its top-left corner is at `(x, y)`.
    pub fn moved_to(&self, x: i32, y: i32) -> Self {
        Self { x, y, ..*self }
    }

    /// Intersection with the frame, or `None` if the box lies fully outside.
    pub fn clip_to(&self, frame: FrameSize) -> Option<Self> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = self.x2().min(frame.width() as i32);
        let y2 = self.y2().min(frame.height() as i32);
        Self::new(x1, y1, x2 - x1, y2 - y1).ok()
    }
}
