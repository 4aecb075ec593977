//! Painting detected particle pixels into the region image.
//!
//! Only pixels set in the mask are written; every other pixel keeps its
//! original color.

use common::{BitBuffer2, Buffer2};
use image::{Rgb, RgbImage};

use crate::cluster::ClusterAssignment;
use crate::labeling::LabelMap;
use crate::threshold::ThresholdBand;

/// Color of particle pixels in flat mode.
pub const FLAT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Red channel range of gradient mode: `GRADIENT_BASE + intensity * GRADIENT_SPAN`.
const GRADIENT_BASE: f32 = 100.0;
const GRADIENT_SPAN: f32 = 155.0;

/// How masked pixels get their color.
#[derive(Debug, Clone, Copy)]
pub enum Palette<'a> {
    /// Every particle pixel is [`FLAT_COLOR`].
    Flat,
    /// Red depth follows the pixel's darkness within the threshold band.
    Gradient {
        band: &'a ThresholdBand,
        gray: &'a Buffer2<u8>,
    },
    /// Each particle takes the color of its cluster. Labels must be compact:
    /// label `l` is particle `l - 1` of `assignment`.
    Clustered {
        labels: &'a LabelMap,
        assignment: &'a ClusterAssignment,
    },
}

/// Gradient red for a normalized intensity in [0, 1].
#[inline]
pub fn gradient_color(intensity: f32) -> Rgb<u8> {
    let red = (GRADIENT_BASE + intensity.clamp(0.0, 1.0) * GRADIENT_SPAN).round() as u8;
    Rgb([red, 0, 0])
}

/// Paint masked pixels of `image` according to `palette`.
pub fn colorize(image: &mut RgbImage, mask: &BitBuffer2, palette: Palette<'_>) {
    assert_eq!(image.width() as usize, mask.width(), "width mismatch");
    assert_eq!(image.height() as usize, mask.height(), "height mismatch");

    let width = mask.width();
    for y in 0..mask.height() {
        for x in 0..width {
            if !mask.get_xy(x, y) {
                continue;
            }
            let idx = y * width + x;
            let color = match palette {
                Palette::Flat => FLAT_COLOR,
                Palette::Gradient { band, gray } => gradient_color(band.intensity(idx, gray[idx])),
                Palette::Clustered { labels, assignment } => {
                    let label = labels[idx];
                    debug_assert!(label > 0, "masked pixel without a label");
                    assignment.color_of((label - 1) as usize)
                }
            };
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}
