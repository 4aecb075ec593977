//! Assembling the annotated output image.
//!
//! The colorized region is pasted back into the full image, the region is
//! outlined, and the summary lines are burned in with the built-in font.

pub mod font;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::region::{Region, paste_rgb};

/// Color of the region outline and summary text.
pub const ANNOTATION_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Outline thickness, drawn inward from the region edge.
pub const OUTLINE_WIDTH: u32 = 2;

/// Font scale of the summary text.
pub const TEXT_SCALE: u32 = 2;

/// Text offset from the region's top-left corner.
const TEXT_INSET: i64 = 5;

/// Text anchor when the whole image is processed.
const DEFAULT_TEXT_ANCHOR: (i64, i64) = (15, 15);

/// Percentage of `marked` pixels in a mask of `total` pixels; 0 for an empty mask.
pub fn area_percentage(marked: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * marked as f64 / total as f64
}

/// Summary lines burned into the output image.
pub fn summary_lines(
    area_percentage: f64,
    particle_count: usize,
    cluster_count: Option<usize>,
) -> Vec<String> {
    let mut lines = vec![
        format!("PARTICLE AREA: {:.2}%", area_percentage),
        format!("PARTICLE COUNT: {}", particle_count),
    ];
    if let Some(clusters) = cluster_count {
        lines.push(format!("CLUSTER COUNT: {}", clusters));
    }
    lines
}

/// Write the processed `patch` into `image` and annotate it.
///
/// With a region, the patch is pasted at the region offset and the region is
/// outlined; without one, `patch` replaces the whole image.
pub fn compose(image: &mut RgbImage, patch: RgbImage, region: Option<&Region>, lines: &[String]) {
    match region {
        Some(region) => {
            paste_rgb(image, &patch, region);
            draw_outline(image, region);
        }
        None => *image = patch,
    }

    let (x, y) = region.map_or(DEFAULT_TEXT_ANCHOR, |r| {
        (r.left as i64 + TEXT_INSET, r.top as i64 + TEXT_INSET)
    });
    draw_summary(image, x, y, lines);
}

/// Outline `region` with [`OUTLINE_WIDTH`] nested one-pixel rectangles.
pub fn draw_outline(image: &mut RgbImage, region: &Region) {
    for inset in 0..OUTLINE_WIDTH {
        let width = region.width() as u32;
        let height = region.height() as u32;
        if width <= 2 * inset || height <= 2 * inset {
            break;
        }
        let rect = Rect::at((region.left as u32 + inset) as i32, (region.top as u32 + inset) as i32)
            .of_size(width - 2 * inset, height - 2 * inset);
        draw_hollow_rect_mut(image, rect, ANNOTATION_COLOR);
    }
}

/// Draw `lines` top to bottom starting at `(x, y)`.
pub fn draw_summary(image: &mut RgbImage, x: i64, y: i64, lines: &[String]) {
    let step = font::line_height(TEXT_SCALE) as i64;
    for (i, line) in lines.iter().enumerate() {
        font::draw_text(image, x, y + i as i64 * step, line, TEXT_SCALE, ANNOTATION_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAY: Rgb<u8> = Rgb([90, 90, 90]);

    #[test]
    fn test_area_percentage() {
        assert_eq!(area_percentage(0, 0), 0.0);
        assert_eq!(area_percentage(0, 50), 0.0);
        assert_eq!(area_percentage(100, 10_000), 1.0);
        assert_eq!(area_percentage(7, 7), 100.0);
    }

    #[test]
    fn test_summary_lines() {
        assert_eq!(
            summary_lines(1.0, 1, None),
            vec!["PARTICLE AREA: 1.00%", "PARTICLE COUNT: 1"]
        );
        assert_eq!(
            summary_lines(12.346, 3, Some(2)),
            vec![
                "PARTICLE AREA: 12.35%",
                "PARTICLE COUNT: 3",
                "CLUSTER COUNT: 2"
            ]
        );
    }

    #[test]
    fn test_outline_is_two_pixels_inward() {
        let mut image = RgbImage::from_pixel(30, 30, GRAY);
        draw_outline(&mut image, &Region::new(5, 5, 25, 20));

        assert_eq!(*image.get_pixel(5, 5), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(6, 6), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(24, 19), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(23, 18), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(7, 7), GRAY);
        assert_eq!(*image.get_pixel(4, 5), GRAY);
        assert_eq!(*image.get_pixel(25, 10), GRAY);
    }

    #[test]
    fn test_outline_of_tiny_region() {
        let mut image = RgbImage::from_pixel(10, 10, GRAY);
        draw_outline(&mut image, &Region::new(3, 3, 4, 4));
        assert_eq!(*image.get_pixel(3, 3), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(4, 4), GRAY);
    }

    #[test]
    fn test_compose_with_region_keeps_outside_pixels() {
        let mut image = RgbImage::from_pixel(120, 100, GRAY);
        let patch = RgbImage::from_pixel(60, 50, Rgb([1, 2, 3]));
        let region = Region::new(40, 30, 100, 80);

        compose(&mut image, patch, Some(&region), &[]);

        assert_eq!(*image.get_pixel(70, 60), Rgb([1, 2, 3]));
        assert_eq!(*image.get_pixel(10, 10), GRAY);
        assert_eq!(*image.get_pixel(40, 30), ANNOTATION_COLOR);
    }

    #[test]
    fn test_compose_text_anchor() {
        let lines = summary_lines(0.0, 0, None);

        let mut image = RgbImage::from_pixel(200, 100, GRAY);
        let patch = image.clone();
        compose(&mut image, patch, None, &lines);
        // Nothing above or left of the (15, 15) anchor.
        for (x, y, pixel) in image.enumerate_pixels() {
            if x < 15 || y < 15 {
                assert_eq!(*pixel, GRAY, "({x}, {y})");
            }
        }
        assert!(image.pixels().any(|&p| p == ANNOTATION_COLOR));
    }
}
