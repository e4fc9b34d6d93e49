//! Color-space conversion and band thresholding.

use image::{GrayImage, Luma, RgbImage};

use super::config::HsvBand;

/// Convert one RGB pixel to 8-bit HSV using OpenCV's scaling
/// (H in 0..180, S and V in 0..=255).
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;

    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    // Hue is halved to fit a byte; 360 wraps back to 0.
    let h8 = ((h / 2.0).round() as u32 % 180) as u8;
    [h8, s.round() as u8, v as u8]
}

/// Binary mask (0 / 255) of pixels whose HSV value lies inside `band`.
pub fn in_range(image: &RgbImage, band: &HsvBand) -> GrayImage {
    let mut mask = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        if band.contains(rgb_to_hsv(pixel.0)) {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    mask
}
