//! Image loading and color normalization.
//!
//! Every source is reduced to an opaque RGB image plus an 8-bit luminance
//! channel. Transparent pixels are composited over white.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use common::Buffer2;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};

use crate::error::{Error, Result};

/// Where a pipeline input comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A file to decode.
    Path(PathBuf),
    /// An already decoded bitmap in any color mode.
    Bitmap(DynamicImage),
    /// An already normalized image.
    Pixels(PixelImage),
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&PathBuf> for ImageSource {
    fn from(path: &PathBuf) -> Self {
        ImageSource::Path(path.clone())
    }
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        ImageSource::Bitmap(image)
    }
}

impl From<RgbImage> for ImageSource {
    fn from(image: RgbImage) -> Self {
        ImageSource::Bitmap(DynamicImage::ImageRgb8(image))
    }
}

impl From<PixelImage> for ImageSource {
    fn from(image: PixelImage) -> Self {
        ImageSource::Pixels(image)
    }
}

impl ImageSource {
    /// Resolve the source into a normalized image.
    pub fn load(self) -> Result<PixelImage> {
        match self {
            ImageSource::Path(path) => PixelImage::from_file(&path),
            ImageSource::Bitmap(image) => PixelImage::from_dynamic(image),
            ImageSource::Pixels(image) => Ok(image),
        }
    }
}

/// Opaque RGB image with its derived luminance channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    rgb: RgbImage,
    gray: Buffer2<u8>,
}

impl PixelImage {
    /// Decode an image file. The format is guessed from the file contents.
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let image = reader.decode().map_err(|source| match source {
            image::ImageError::IoError(source) => Error::Io {
                path: path.to_path_buf(),
                source,
            },
            source => Error::Decode {
                path: path.to_path_buf(),
                source,
            },
        })?;

        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Decoded image"
        );
        Self::from_dynamic(image)
    }

    /// Normalize a decoded bitmap: composite alpha over white, convert to RGB.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }

        let rgb = if image.color().has_alpha() {
            flatten_on_white(&image)
        } else {
            image.into_rgb8()
        };
        Ok(Self::from_rgb(rgb))
    }

    /// Wrap an opaque RGB image, deriving the luminance channel.
    pub fn from_rgb(rgb: RgbImage) -> Self {
        let gray = luminance(&rgb);
        Self { rgb, gray }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.rgb.width() as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rgb.height() as usize
    }

    #[inline]
    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    #[inline]
    pub fn gray(&self) -> &Buffer2<u8> {
        &self.gray
    }

    pub fn into_rgb(self) -> RgbImage {
        self.rgb
    }
}

/// Composite `new = alpha*pixel + (1-alpha)*white`.
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([blend_on_white(r, a), blend_on_white(g, a), blend_on_white(b, a)])
    })
}

/// One channel of `c` at opacity `a` over white, `c*a/255 + 255 - a` rounded
/// to nearest. Uses the shift form of division by 255 common to 8-bit
/// compositors, so results match mask-pasting onto a white canvas exactly.
#[inline]
pub(crate) fn blend_on_white(c: u8, a: u8) -> u8 {
    let (c, a) = (c as u32, a as u32);
    let v = c * a + 255 * (255 - a) + 128;
    (((v >> 8) + v) >> 8) as u8
}

/// ITU-R 601-2 luma: `L = R*299/1000 + G*587/1000 + B*114/1000`.
///
/// Fixed-point weights sum to 65536 so pure gray maps to itself.
pub fn luminance(rgb: &RgbImage) -> Buffer2<u8> {
    let pixels = rgb
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
        })
        .collect();
    Buffer2::new(rgb.width() as usize, rgb.height() as usize, pixels)
}
