//! Testing utilities for speckle.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Solid gray image.
pub fn uniform_gray(width: u32, height: u32, value: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([value, value, value]))
}

/// Paint a `size`×`size` square of gray `value` with its top-left corner at `(x0, y0)`.
pub fn paint_square(image: &mut RgbImage, x0: u32, y0: u32, size: u32, value: u8) {
    for y in y0..(y0 + size).min(image.height()) {
        for x in x0..(x0 + size).min(image.width()) {
            image.put_pixel(x, y, Rgb([value, value, value]));
        }
    }
}

/// Gray `background` field with black squares given as `(x0, y0, size)`.
pub fn square_scene(width: u32, height: u32, background: u8, squares: &[(u32, u32, u32)]) -> RgbImage {
    let mut image = uniform_gray(width, height, background);
    for &(x0, y0, size) in squares {
        paint_square(&mut image, x0, y0, size, 0);
    }
    image
}

/// 100×100 field of gray 200 with a 10×10 black square centered at (50, 50).
pub fn centered_square_scene() -> RgbImage {
    square_scene(100, 100, 200, &[(45, 45, 10)])
}

/// Save `image` as PNG under `dir` and return the path.
pub fn write_png(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).expect("Failed to write test image");
    path
}

/// Count pixels of `image` equal to `color`.
pub fn count_color(image: &RgbImage, color: Rgb<u8>) -> usize {
    image.pixels().filter(|&&p| p == color).count()
}
