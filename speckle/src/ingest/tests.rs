use super::*;
use image::{GrayImage, Luma, LumaA, Rgba, RgbaImage};

#[test]
fn test_transparent_pixels_become_white() {
    let rgba = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 0]));
    let image = PixelImage::from_dynamic(DynamicImage::ImageRgba8(rgba)).unwrap();

    for p in image.rgb().pixels() {
        assert_eq!(p.0, [255, 255, 255]);
    }
    assert!(image.gray().pixels().iter().all(|&v| v == 255));
}

#[test]
fn test_opaque_pixels_keep_color() {
    let rgba = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
    let image = PixelImage::from_dynamic(DynamicImage::ImageRgba8(rgba)).unwrap();
    assert_eq!(image.rgb().get_pixel(1, 1).0, [10, 20, 30]);
}

#[test]
fn test_half_alpha_blends_toward_white() {
    let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
    let image = PixelImage::from_dynamic(DynamicImage::ImageRgba8(rgba)).unwrap();
    // 0 * 128/255 + 255 * 127/255 = 127
    assert_eq!(image.rgb().get_pixel(0, 0).0, [127, 127, 127]);
}

#[test]
fn test_blend_rounds_to_nearest_for_every_alpha() {
    for a in 0..=255u8 {
        for c in 0..=255u8 {
            let exact = (c as f64 * a as f64 + 255.0 * (255 - a) as f64) / 255.0;
            assert_eq!(blend_on_white(c, a), exact.round() as u8, "c = {c}, a = {a}");
        }
    }
    // 62.84 rounds up.
    assert_eq!(blend_on_white(10, 200), 63);
}

#[test]
fn test_gray_alpha_is_flattened() {
    let la = image::ImageBuffer::from_pixel(3, 1, LumaA([0u8, 0]));
    let image = PixelImage::from_dynamic(DynamicImage::ImageLumaA8(la)).unwrap();
    assert_eq!(image.rgb().get_pixel(2, 0).0, [255, 255, 255]);
}

#[test]
fn test_grayscale_input_expands_to_rgb() {
    let gray = GrayImage::from_pixel(3, 2, Luma([77]));
    let image = PixelImage::from_dynamic(DynamicImage::ImageLuma8(gray)).unwrap();
    assert_eq!(image.width(), 3);
    assert_eq!(image.height(), 2);
    assert_eq!(image.rgb().get_pixel(0, 0).0, [77, 77, 77]);
    assert!(image.gray().pixels().iter().all(|&v| v == 77));
}

#[test]
fn test_luminance_weights() {
    let mut rgb = RgbImage::new(3, 1);
    rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
    rgb.put_pixel(1, 0, Rgb([0, 255, 0]));
    rgb.put_pixel(2, 0, Rgb([0, 0, 255]));
    let gray = luminance(&rgb);
    assert_eq!(gray.pixels(), &[76, 150, 29]);
}

#[test]
fn test_empty_bitmap_rejected() {
    let err = PixelImage::from_dynamic(DynamicImage::new_rgb8(0, 5)).unwrap_err();
    assert!(err.is_invalid_image());
}

#[test]
fn test_missing_file_is_io_error() {
    let err = ImageSource::from("/nonexistent/particles.png")
        .load()
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "got {err:?}");
}

#[test]
fn test_garbage_file_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let err = ImageSource::from(path.as_path()).load().unwrap_err();
    assert!(err.is_invalid_image(), "got {err:?}");
}

#[test]
fn test_round_trip_through_png_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.png");
    let rgb = RgbImage::from_fn(5, 4, |x, y| Rgb([x as u8 * 40, y as u8 * 50, 9]));
    rgb.save(&path).unwrap();

    let loaded = ImageSource::from(path).load().unwrap();
    assert_eq!(loaded.rgb(), &rgb);
}

#[test]
fn test_pixels_source_passes_through() {
    let image = PixelImage::from_rgb(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])));
    let loaded = ImageSource::from(image.clone()).load().unwrap();
    assert_eq!(loaded, image);
}
