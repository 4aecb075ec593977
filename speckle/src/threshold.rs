//! Adaptive dual thresholds relative to the local background.
//!
//! ```text
//! factor(s)      = 0.5 + 0.5 * s
//! threshold_high = B * factor(sensitivity_max)
//! threshold_low  = B * factor(sensitivity_min)
//! ```
//!
//! Raising a sensitivity moves its factor toward 1.0, admitting pixels closer
//! to the background brightness.

use common::{BitBuffer2, Buffer2};

use crate::config::Config;

/// Threshold scale for a sensitivity in [0, 1].
#[inline]
pub fn threshold_factor(sensitivity: f32) -> f32 {
    0.5 + 0.5 * sensitivity
}

/// Per-pixel lower and upper edges of the darkness band.
#[derive(Debug, Clone)]
pub struct ThresholdBand {
    pub low: Buffer2<f32>,
    pub high: Buffer2<f32>,
}

impl ThresholdBand {
    /// Derive both threshold fields from the background luminance.
    ///
    /// Expects a validated config (`sensitivity_min <= sensitivity_max`).
    pub fn from_background(background: &Buffer2<f32>, config: &Config) -> Self {
        let low_factor = threshold_factor(config.sensitivity_min);
        let high_factor = threshold_factor(config.sensitivity_max);
        Self {
            low: background.map(|&b| b * low_factor),
            high: background.map(|&b| b * high_factor),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.high.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.high.height()
    }

    /// Particle mask: `gray < high`, and with `reject_below_band` also `low <= gray`.
    pub fn mask(&self, gray: &Buffer2<u8>, reject_below_band: bool) -> BitBuffer2 {
        assert_eq!(gray.width(), self.width(), "width mismatch");
        assert_eq!(gray.height(), self.height(), "height mismatch");

        let width = gray.width();
        let mut mask = BitBuffer2::new_default(width, gray.height());
        for y in 0..gray.height() {
            let gray_row = gray.row(y);
            let high_row = self.high.row(y);
            let low_row = self.low.row(y);
            for x in 0..width {
                let value = gray_row[x] as f32;
                let marked = value < high_row[x] && (!reject_below_band || low_row[x] <= value);
                if marked {
                    mask.set_xy(x, y, true);
                }
            }
        }

        tracing::debug!(
            "Threshold mask: {} of {} pixels",
            mask.count_ones(),
            mask.len()
        );
        mask
    }

    /// Normalized darkness of `gray` inside the band at linear index `idx`,
    /// clamped to [0, 1]. 1 means at or below the lower edge.
    #[inline]
    pub fn intensity(&self, idx: usize, gray: u8) -> f32 {
        const MIN_BAND_WIDTH: f32 = 1e-5;

        let high = self.high[idx];
        let band = (high - self.low[idx]).max(MIN_BAND_WIDTH);
        ((high - gray as f32) / band).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band_for(background: f32, min: f32, max: f32) -> ThresholdBand {
        let config = Config {
            sensitivity_min: min,
            sensitivity_max: max,
            ..Default::default()
        };
        ThresholdBand::from_background(&Buffer2::new_filled(1, 1, background), &config)
    }

    #[test]
    fn test_threshold_factor_range() {
        assert_eq!(threshold_factor(0.0), 0.5);
        assert_eq!(threshold_factor(0.5), 0.75);
        assert_eq!(threshold_factor(1.0), 1.0);
    }

    #[test]
    fn test_band_edges() {
        let band = band_for(200.0, 0.2, 0.6);
        assert!((band.low[0] - 120.0).abs() < 1e-4);
        assert!((band.high[0] - 160.0).abs() < 1e-4);
    }

    #[test]
    fn test_mask_upper_edge_is_exclusive() {
        // high = 100 * 0.75 = 75
        let band = band_for(100.0, 0.0, 0.5);
        let at_edge = Buffer2::new_filled(1, 1, 75u8);
        let below = Buffer2::new_filled(1, 1, 74u8);
        assert!(!band.mask(&at_edge, false).get(0));
        assert!(band.mask(&below, false).get(0));
    }

    #[test]
    fn test_mask_below_band_kept_by_default() {
        // low = 50, high = 100
        let band = band_for(100.0, 0.0, 1.0);
        let very_dark = Buffer2::new_filled(1, 1, 10u8);
        assert!(band.mask(&very_dark, false).get(0));
        assert!(!band.mask(&very_dark, true).get(0));

        let in_band = Buffer2::new_filled(1, 1, 50u8);
        assert!(band.mask(&in_band, true).get(0));
    }

    #[test]
    fn test_pixel_at_background_never_marked() {
        let band = band_for(200.0, 0.0, 1.0);
        let gray = Buffer2::new_filled(1, 1, 200u8);
        assert!(!band.mask(&gray, false).get(0));
    }

    #[test]
    fn test_intensity() {
        // low = 50, high = 100
        let band = band_for(100.0, 0.0, 1.0);
        assert_eq!(band.intensity(0, 100), 0.0);
        assert_eq!(band.intensity(0, 75), 0.5);
        assert_eq!(band.intensity(0, 50), 1.0);
        assert_eq!(band.intensity(0, 0), 1.0);
        assert_eq!(band.intensity(0, 255), 0.0);
    }

    #[test]
    fn test_intensity_degenerate_band() {
        let band = band_for(100.0, 0.4, 0.4);
        assert_eq!(band.intensity(0, 69), 1.0);
        assert_eq!(band.intensity(0, 70), 0.0);
    }

    #[test]
    fn test_wider_band_is_superset() {
        let gray = Buffer2::new(4, 1, vec![20u8, 60, 90, 99]);
        let background = Buffer2::new_filled(4, 1, 100.0f32);
        let mut previous = 0;
        for max in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let config = Config {
                sensitivity_max: max,
                ..Default::default()
            };
            let count = ThresholdBand::from_background(&background, &config)
                .mask(&gray, false)
                .count_ones();
            assert!(count >= previous);
            previous = count;
        }
        assert_eq!(previous, 4);
    }
}
