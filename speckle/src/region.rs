//! Rectangular region of interest and the crop/paste helpers around it.

use common::Buffer2;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rectangle in image pixel coordinates. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Region {
    /// Build a region from two corners given in any order.
    pub fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// The whole `width`×`height` image.
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.bottom - self.top
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Clamp to image bounds. Fails if nothing of the region remains.
    pub fn clamped(&self, width: usize, height: usize) -> Result<Self> {
        let clamped = Self {
            left: self.left.min(width),
            top: self.top.min(height),
            right: self.right.min(width),
            bottom: self.bottom.min(height),
        };
        if clamped.left >= clamped.right || clamped.top >= clamped.bottom {
            return Err(Error::invalid_parameter(
                "region",
                format!(
                    "{:?} has no pixels inside the {}x{} image",
                    self, width, height
                ),
            ));
        }
        Ok(clamped)
    }

    /// Parse `"left,top,right,bottom"`.
    pub fn parse(text: &str) -> Result<Self> {
        let values: Vec<usize> = text
            .split(',')
            .map(|part| part.trim().parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::invalid_parameter("region", format!("'{text}': {e}")))?;

        match values.as_slice() {
            &[left, top, right, bottom] => Ok(Self::new(left, top, right, bottom)),
            _ => Err(Error::invalid_parameter(
                "region",
                format!("'{text}': expected left,top,right,bottom"),
            )),
        }
    }
}

/// Copy the region out of an RGB image.
pub fn crop_rgb(image: &RgbImage, region: &Region) -> RgbImage {
    image::imageops::crop_imm(
        image,
        region.left as u32,
        region.top as u32,
        region.width() as u32,
        region.height() as u32,
    )
    .to_image()
}

/// Copy the region out of a single-channel grid.
pub fn crop_gray<T: Copy>(buffer: &Buffer2<T>, region: &Region) -> Buffer2<T> {
    buffer.sub_buffer(region.left, region.top, region.width(), region.height())
}

/// Write `patch` back into `image` at the region offset.
pub fn paste_rgb(image: &mut RgbImage, patch: &RgbImage, region: &Region) {
    debug_assert_eq!(patch.width() as usize, region.width());
    debug_assert_eq!(patch.height() as usize, region.height());
    image::imageops::replace(image, patch, region.left as i64, region.top as i64);
}
