//! Bucket fill for picture notes.

use image::{Rgb, RgbaImage};
use std::collections::VecDeque;
use std::path::Path;

use crate::Result;

/// Tolerance used by the picture editor's fill tool.
pub const DEFAULT_FILL_TOLERANCE: u8 = 20;

/// A fill whose color is this close to the seed on every channel is skipped.
const NOOP_EPSILON: u8 = 5;

fn within(a: [u8; 3], b: [u8; 3], tolerance: u8) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= tolerance)
}

fn rgb_of(image: &RgbaImage, x: u32, y: u32) -> [u8; 3] {
    let [r, g, b, _] = image.get_pixel(x, y).0;
    [r, g, b]
}

/// Fills the 4-connected region around `(x, y)` with `replacement`.
///
/// A pixel belongs to the region when each of its R, G and B channels is
/// within `tolerance` of the seed pixel's original color. Alpha is never
/// touched. Out-of-range seeds, and replacements within a few units of the
/// seed color, leave the image unchanged.
///
/// Returns the number of pixels recolored.
pub fn flood_fill(image: &mut RgbaImage, x: i64, y: i64, replacement: Rgb<u8>, tolerance: u8) -> usize {
    let (width, height) = image.dimensions();
    if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
        return 0;
    }
    let (sx, sy) = (x as u32, y as u32);
    let seed = rgb_of(image, sx, sy);
    if within(seed, replacement.0, NOOP_EPSILON) {
        log::debug!("Skipping fill at ({x}, {y}): replacement matches seed color");
        return 0;
    }

    let index = |px: u32, py: u32| py as usize * width as usize + px as usize;
    let mut visited = vec![false; width as usize * height as usize];
    let mut queue = VecDeque::new();
    visited[index(sx, sy)] = true;
    queue.push_back((sx, sy));

    let mut changed = 0;
    while let Some((px, py)) = queue.pop_front() {
        let pixel = image.get_pixel_mut(px, py);
        let [_, _, _, alpha] = pixel.0;
        let [r, g, b] = replacement.0;
        pixel.0 = [r, g, b, alpha];
        changed += 1;

        let neighbors = [
            (px.checked_sub(1), Some(py)),
            (px.checked_add(1).filter(|v| *v < width), Some(py)),
            (Some(px), py.checked_sub(1)),
            (Some(px), py.checked_add(1).filter(|v| *v < height)),
        ];
        for (nx, ny) in neighbors {
            let (Some(nx), Some(ny)) = (nx, ny) else {
                continue;
            };
            let i = index(nx, ny);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            if within(rgb_of(image, nx, ny), seed, tolerance) {
                queue.push_back((nx, ny));
            }
        }
    }

    changed
}

/// Loads the image at `path`, fills it and writes it back in place.
///
/// # Errors
///
/// Returns [`crate::NotebookError::Image`] if the file cannot be decoded or
/// re-encoded in its format.
pub fn fill_image_file(path: &Path, x: i64, y: i64, replacement: Rgb<u8>, tolerance: u8) -> Result<usize> {
    let mut image = image::open(path)?.to_rgba8();
    let changed = flood_fill(&mut image, x, y, replacement, tolerance);
    if changed > 0 {
        image.save(path)?;
        log::info!("Filled {changed} pixels in {}", path.display());
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    const RED: Rgba<u8> = Rgba([200, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 200, 0, 128]);

    /// 10x10 red canvas with a black frame from (2,2) to (7,7) enclosing a
    /// 4x4 green interior.
    fn framed() -> RgbaImage {
        RgbaImage::from_fn(10, 10, |x, y| {
            let on_frame = (2..=7).contains(&x)
                && (2..=7).contains(&y)
                && (x == 2 || x == 7 || y == 2 || y == 7);
            let inside = (3..=6).contains(&x) && (3..=6).contains(&y);
            if on_frame {
                BLACK
            } else if inside {
                GREEN
            } else {
                RED
            }
        })
    }

    #[test]
    fn test_fill_with_seed_color_is_noop() {
        let mut image = framed();
        let before = image.clone();
        assert_eq!(flood_fill(&mut image, 0, 0, Rgb([200, 0, 0]), 20), 0);
        assert_eq!(flood_fill(&mut image, 0, 0, Rgb([203, 2, 4]), 20), 0);
        assert_eq!(image, before);
    }

    #[test]
    fn test_enclosed_region_is_contained() {
        let mut image = framed();
        let before = image.clone();
        let changed = flood_fill(&mut image, 4, 4, Rgb([0, 0, 255]), 20);
        assert_eq!(changed, 16);

        for (x, y, pixel) in image.enumerate_pixels() {
            let inside = (3..=6).contains(&x) && (3..=6).contains(&y);
            if inside {
                assert_eq!(pixel.0, [0, 0, 255, 128], "pixel ({x}, {y})");
            } else {
                assert_eq!(pixel, before.get_pixel(x, y), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_outer_region_wraps_around_frame() {
        let mut image = framed();
        let changed = flood_fill(&mut image, 0, 0, Rgb([255, 255, 255]), 20);
        assert_eq!(changed, 100 - 36);
        assert_eq!(*image.get_pixel(4, 4), GREEN);
        assert_eq!(*image.get_pixel(2, 2), BLACK);
    }

    #[test]
    fn test_tolerance_is_measured_against_seed() {
        // A gradient where each step is within tolerance of its neighbor but
        // the far end is not within tolerance of the seed.
        let mut image = RgbaImage::from_fn(10, 1, |x, _| {
            let v = (x * 10) as u8;
            Rgba([v, v, v, 255])
        });
        let changed = flood_fill(&mut image, 0, 0, Rgb([255, 0, 0]), 20);
        assert_eq!(changed, 3);
        assert_eq!(image.get_pixel(3, 0).0, [30, 30, 30, 255]);
    }

    #[test]
    fn test_out_of_range_seed_is_noop() {
        let mut image = framed();
        let before = image.clone();
        assert_eq!(flood_fill(&mut image, -1, 0, Rgb([1, 2, 3]), 20), 0);
        assert_eq!(flood_fill(&mut image, 0, 10, Rgb([1, 2, 3]), 20), 0);
        assert_eq!(image, before);
    }

    #[test]
    fn test_large_fill_does_not_overflow_stack() {
        let mut image = RgbaImage::from_pixel(1000, 1000, RED);
        let changed = flood_fill(&mut image, 500, 500, Rgb([0, 0, 0]), 0);
        assert_eq!(changed, 1_000_000);
    }

    #[test]
    fn test_fill_image_file_writes_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("canvas.png");
        framed().save(&path).unwrap();

        let changed = fill_image_file(&path, 4, 4, Rgb([0, 0, 255]), DEFAULT_FILL_TOLERANCE).unwrap();
        assert_eq!(changed, 16);
        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded.get_pixel(5, 5).0, [0, 0, 255, 128]);
    }
}
