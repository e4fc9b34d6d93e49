//! Binary morphology and region extraction on 0/255 masks.
//!
//! Square structuring elements are separable for min/max filters, so each
//! operation runs as a horizontal pass followed by a vertical pass. Pixels
//! outside the image never influence the result.

use image::GrayImage;
use std::collections::VecDeque;

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

fn filter_pass(src: &GrayImage, kernel: u32, horizontal: bool, op: Extremum) -> GrayImage {
    let (width, height) = src.dimensions();
    let mut dst = GrayImage::new(width, height);
    // OpenCV anchor for a k-wide kernel sits at k/2.
    let before = (kernel / 2) as i64;
    let after = (kernel as i64 - 1) - before;

    for y in 0..height {
        for x in 0..width {
            let (pos, len) = if horizontal {
                (x as i64, width as i64)
            } else {
                (y as i64, height as i64)
            };
            let lo = (pos - before).max(0);
            let hi = (pos + after).min(len - 1);

            let mut acc = match op {
                Extremum::Min => u8::MAX,
                Extremum::Max => u8::MIN,
            };
            for i in lo..=hi {
                let v = if horizontal {
                    src.get_pixel(i as u32, y).0[0]
                } else {
                    src.get_pixel(x, i as u32).0[0]
                };
                acc = match op {
                    Extremum::Min => acc.min(v),
                    Extremum::Max => acc.max(v),
                };
            }
            dst.get_pixel_mut(x, y).0[0] = acc;
        }
    }
    dst
}

/// Erosion with a `kernel`×`kernel` square.
pub fn erode(mask: &GrayImage, kernel: u32) -> GrayImage {
    let pass = filter_pass(mask, kernel, true, Extremum::Min);
    filter_pass(&pass, kernel, false, Extremum::Min)
}

/// Dilation with a `kernel`×`kernel` square.
pub fn dilate(mask: &GrayImage, kernel: u32) -> GrayImage {
    let pass = filter_pass(mask, kernel, true, Extremum::Max);
    filter_pass(&pass, kernel, false, Extremum::Max)
}

/// Erode then dilate: removes specks smaller than the kernel.
pub fn open(mask: &GrayImage, kernel: u32) -> GrayImage {
    dilate(&erode(mask, kernel), kernel)
}

/// Dilate then erode: closes pinholes and narrow gaps.
pub fn close(mask: &GrayImage, kernel: u32) -> GrayImage {
    erode(&dilate(mask, kernel), kernel)
}

/// A connected foreground region bounded by an external contour.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Pixel area, holes included
    pub area: u32,
    /// First-moment / zeroth-moment centroid
    pub centroid: (f64, f64),
    /// Inclusive bounds: (min_x, min_y, max_x, max_y)
    pub bounds: (u32, u32, u32, u32),
}

/// Fill background pockets that cannot reach the image border.
///
/// Background connectivity is 4-way, the dual of 8-way foreground, so what
/// remains matches the area enclosed by each outer contour.
fn fill_holes(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    let idx = |x: u32, y: u32| (y * width + x) as usize;
    let mut outside = vec![false; (width * height) as usize];
    let mut queue = VecDeque::new();

    let seed = |x: u32, y: u32, outside: &mut [bool], queue: &mut VecDeque<(u32, u32)>| {
        if mask.get_pixel(x, y).0[0] == 0 && !outside[idx(x, y)] {
            outside[idx(x, y)] = true;
            queue.push_back((x, y));
        }
    };
    for x in 0..width {
        seed(x, 0, &mut outside, &mut queue);
        seed(x, height - 1, &mut outside, &mut queue);
    }
    for y in 0..height {
        seed(0, y, &mut outside, &mut queue);
        seed(width - 1, y, &mut outside, &mut queue);
    }

    while let Some((x, y)) = queue.pop_front() {
        let neighbors = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbors {
            if nx < width && ny < height {
                seed(nx, ny, &mut outside, &mut queue);
            }
        }
    }

    let mut filled = mask.clone();
    for (x, y, pixel) in filled.enumerate_pixels_mut() {
        if !outside[idx(x, y)] {
            pixel.0[0] = 255;
        }
    }
    filled
}

/// Extract the regions enclosed by external contours (8-connected).
///
/// Regions nested inside another region's hole are absorbed by it.
pub fn external_regions(mask: &GrayImage) -> Vec<Region> {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let solid = fill_holes(mask);
    let idx = |x: u32, y: u32| (y * width + x) as usize;
    let mut visited = vec![false; (width * height) as usize];
    let mut regions = Vec::new();
    let mut stack: Vec<(u32, u32)> = Vec::new();

    for sy in 0..height {
        for sx in 0..width {
            if visited[idx(sx, sy)] || solid.get_pixel(sx, sy).0[0] == 0 {
                continue;
            }

            visited[idx(sx, sy)] = true;
            stack.push((sx, sy));
            let mut area = 0u32;
            let (mut sum_x, mut sum_y) = (0f64, 0f64);
            let mut bounds = (sx, sy, sx, sy);

            while let Some((x, y)) = stack.pop() {
                area += 1;
                sum_x += x as f64;
                sum_y += y as f64;
                bounds = (
                    bounds.0.min(x),
                    bounds.1.min(y),
                    bounds.2.max(x),
                    bounds.3.max(y),
                );

                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                            continue;
                        }
                        let (nx, ny) = (nx as u32, ny as u32);
                        if !visited[idx(nx, ny)] && solid.get_pixel(nx, ny).0[0] != 0 {
                            visited[idx(nx, ny)] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            regions.push(Region {
                area,
                centroid: (sum_x / area as f64, sum_y / area as f64),
                bounds,
            });
        }
    }

    regions
}
