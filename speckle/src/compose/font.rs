//! Built-in 5x7 bitmap font for burned-in annotations.
//!
//! Each glyph is seven rows of five bits, most significant bit leftmost.
//! Lowercase letters render as uppercase; characters without a glyph render
//! as blank cells.

use image::{Rgb, RgbImage};

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;

/// Horizontal advance per character, in unscaled pixels.
const ADVANCE_X: u32 = GLYPH_WIDTH + 1;
/// Vertical advance per line, in unscaled pixels.
const ADVANCE_Y: u32 = GLYPH_HEIGHT + 3;

type Glyph = [u8; GLYPH_HEIGHT as usize];

#[rustfmt::skip]
const DIGITS: [Glyph; 10] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
];

#[rustfmt::skip]
const LETTERS: [Glyph; 26] = [
    [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
];

const PERIOD: Glyph = [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C];
const PERCENT: Glyph = [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03];
const COLON: Glyph = [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00];
const MINUS: Glyph = [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00];

/// Bitmap for `c`, or `None` for blank cells.
pub fn glyph(c: char) -> Option<&'static Glyph> {
    match c.to_ascii_uppercase() {
        d @ '0'..='9' => Some(&DIGITS[d as usize - '0' as usize]),
        l @ 'A'..='Z' => Some(&LETTERS[l as usize - 'A' as usize]),
        '.' => Some(&PERIOD),
        '%' => Some(&PERCENT),
        ':' => Some(&COLON),
        '-' => Some(&MINUS),
        _ => None,
    }
}

/// Width in pixels of `text` drawn at `scale`, without trailing spacing.
pub fn text_width(text: &str, scale: u32) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    (chars * ADVANCE_X - 1) * scale
}

/// Distance between the tops of consecutive lines at `scale`.
pub fn line_height(scale: u32) -> u32 {
    ADVANCE_Y * scale
}

/// Draw one line of text with its top-left corner at `(x, y)`.
/// Pixels falling outside the image are skipped.
pub fn draw_text(image: &mut RgbImage, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
    let width = image.width() as i64;
    let height = image.height() as i64;
    let scale = scale.max(1) as i64;

    for (char_idx, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else {
            continue;
        };
        let origin_x = x + char_idx as i64 * ADVANCE_X as i64 * scale;

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let px0 = origin_x + col as i64 * scale;
                let py0 = y + row as i64 * scale;
                for py in py0..py0 + scale {
                    for px in px0..px0 + scale {
                        if px >= 0 && px < width && py >= 0 && py < height {
                            image.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    fn count_colored(image: &RgbImage, color: Rgb<u8>) -> usize {
        image.pixels().filter(|&&p| p == color).count()
    }

    #[test]
    fn test_glyph_coverage() {
        for c in "PARTICLE AREA: 12.34% COUNT CLUSTER-0123456789".chars() {
            if c != ' ' {
                assert!(glyph(c).is_some(), "missing glyph for {c:?}");
            }
        }
        assert!(glyph(' ').is_none());
        assert_eq!(glyph('a'), glyph('A'));
    }

    #[test]
    fn test_glyphs_fit_five_columns() {
        for g in DIGITS.iter().chain(LETTERS.iter()) {
            assert!(g.iter().all(|&row| row < 0x20));
        }
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("A", 1), 5);
        assert_eq!(text_width("AB", 2), 22);
    }

    #[test]
    fn test_draw_scales_pixels() {
        let mut image = RgbImage::new(20, 20);
        draw_text(&mut image, 0, 0, "-", 1, BLUE);
        assert_eq!(count_colored(&image, BLUE), 5);

        let mut image = RgbImage::new(20, 20);
        draw_text(&mut image, 0, 0, "-", 2, BLUE);
        assert_eq!(count_colored(&image, BLUE), 20);
        assert_eq!(*image.get_pixel(0, 6), BLUE);
        assert_eq!(*image.get_pixel(9, 7), BLUE);
    }

    #[test]
    fn test_draw_clips_to_image() {
        let mut image = RgbImage::new(8, 8);
        draw_text(&mut image, -3, 4, "PARTICLE AREA", 2, BLUE);
        assert!(count_colored(&image, BLUE) > 0);

        let mut image = RgbImage::new(8, 8);
        draw_text(&mut image, 100, 100, "X", 2, BLUE);
        assert_eq!(count_colored(&image, BLUE), 0);
    }
}
