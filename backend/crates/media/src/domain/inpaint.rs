//! Object erasure
//!
//! Fills a user-painted mask from the surrounding pixels:
//! threshold the mask, grow it by a disc, fill it layer by layer from the
//! boundary inwards, then optionally sharpen.

use crate::domain::value_objects::EraseParams;
use image::{GrayImage, Rgb, RgbImage, imageops};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Mask pixels brighter than this are erased
pub const MASK_THRESHOLD: u8 = 10;

const DILATE_ITERATIONS: u32 = 2;

const SHARPEN_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// Dilation kernel diameter: `max(3, floor(min_side * 0.005) * strength)`
pub fn kernel_size(width: u32, height: u32, strength: u32) -> u32 {
    let base = (width.min(height) as f64 * 0.005) as u32;
    (base * strength).max(3)
}

/// Neighbourhood radius used when filling: `max(3, floor(min_side * 0.01))`
pub fn inpaint_radius(width: u32, height: u32) -> u32 {
    ((width.min(height) as f64 * 0.01) as u32).max(3)
}

/// Binary mask: 255 where `mask > threshold`, else 0
pub fn threshold_mask(mask: &GrayImage, level: u8) -> GrayImage {
    threshold(mask, level, ThresholdType::Binary)
}

/// Grow a binary mask by a disc of diameter `kernel_size`, `iterations` times
///
/// Linear in the pixel count whatever the kernel size or mask shape.
pub fn dilate(mask: &GrayImage, kernel_size: u32, iterations: u32) -> GrayImage {
    let radius = (kernel_size / 2).clamp(1, u8::MAX as u32) as u8;
    let mut current = mask.clone();
    for _ in 0..iterations {
        current = morphology::dilate(&current, Norm::L2, radius);
    }
    current
}

/// Sample offsets for the fill: the 8 compass directions at distances
/// 1, 2, 4, ... up to `radius`, with inverse-square weights
fn ray_offsets(radius: u32) -> Vec<(i64, i64, f64)> {
    let radius = radius.max(1) as i64;
    let mut steps = Vec::new();
    let mut step = 1;
    while step < radius {
        steps.push(step);
        step *= 2;
    }
    steps.push(radius);

    let mut offsets = Vec::with_capacity(steps.len() * 8);
    for &step in &steps {
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let d2 = (step * step * (dx * dx + dy * dy)) as f64;
                offsets.push((dx * step, dy * step, 1.0 / (1.0 + d2)));
            }
        }
    }
    offsets
}

/// Fill masked pixels from known pixels within `radius`
///
/// Works in layers: each pass fills the masked pixels touching the known
/// region with a distance-weighted mean of known pixels sampled along eight
/// rays around them, then those pixels become known for the next pass.
/// Every pixel is filled once from a fixed number of samples.
/// If nothing outside the mask is known the image is returned unchanged.
pub fn inpaint(image: &RgbImage, mask: &GrayImage, radius: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let idx = |x: u32, y: u32| (y * w + x) as usize;
    let mut out = image.clone();

    let mut known: Vec<bool> = mask.pixels().map(|p| p[0] == 0).collect();
    if known.iter().all(|&k| k) || known.iter().all(|&k| !k) {
        return out;
    }

    let mut queued = vec![false; known.len()];
    let mut frontier = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if !known[idx(x, y)] && neighbours(x, y, w, h).any(|(nx, ny)| known[idx(nx, ny)]) {
                queued[idx(x, y)] = true;
                frontier.push((x, y));
            }
        }
    }

    let offsets = ray_offsets(radius);
    while !frontier.is_empty() {
        let mut filled = Vec::with_capacity(frontier.len());
        for &(x, y) in &frontier {
            let mut acc = [0.0f64; 3];
            let mut total = 0.0f64;
            for &(dx, dy, weight) in &offsets {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                if !known[idx(nx, ny)] {
                    continue;
                }
                let px = out.get_pixel(nx, ny);
                for c in 0..3 {
                    acc[c] += px[c] as f64 * weight;
                }
                total += weight;
            }
            if total > 0.0 {
                let rgb = acc.map(|v| (v / total).round().clamp(0.0, 255.0) as u8);
                filled.push((x, y, rgb));
            }
        }

        // Nothing could be filled this round; leave the rest untouched.
        if filled.is_empty() {
            break;
        }

        let mut next = Vec::new();
        for &(x, y, rgb) in &filled {
            out.put_pixel(x, y, Rgb(rgb));
            known[idx(x, y)] = true;
        }
        for &(x, y, _) in &filled {
            for (nx, ny) in neighbours(x, y, w, h) {
                let i = idx(nx, ny);
                if !known[i] && !queued[i] {
                    queued[i] = true;
                    next.push((nx, ny));
                }
            }
        }
        frontier = next;
    }

    out
}

fn neighbours(x: u32, y: u32, w: u32, h: u32) -> impl Iterator<Item = (u32, u32)> {
    (-1i64..=1)
        .flat_map(|dy| (-1i64..=1).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .filter_map(move |(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            (nx >= 0 && ny >= 0 && nx < w as i64 && ny < h as i64)
                .then_some((nx as u32, ny as u32))
        })
}

pub fn sharpen(image: &RgbImage) -> RgbImage {
    imageops::filter3x3(image, &SHARPEN_KERNEL)
}

/// Full erase pipeline on an image and a mask of the same size
pub fn erase_object(image: &RgbImage, mask: &GrayImage, params: EraseParams) -> RgbImage {
    let (w, h) = image.dimensions();
    let binary = threshold_mask(mask, MASK_THRESHOLD);
    let grown = dilate(&binary, kernel_size(w, h, params.strength), DILATE_ITERATIONS);
    let filled = inpaint(image, &grown, inpaint_radius(w, h));
    if params.detail > 0 {
        sharpen(&filled)
    } else {
        filled
    }
}
