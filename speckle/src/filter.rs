//! Component filters applied to the particle mask after labeling.
//!
//! Both filters keep the mask and the label map in agreement: a pixel is set
//! in the mask exactly when its label is non-zero.

use common::BitBuffer2;

use crate::config::Config;
use crate::labeling::LabelMap;

/// Components removed by the size band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeRejections {
    pub too_small: usize,
    pub too_large: usize,
}

/// Drop components outside `[min_particle_size, max_particle_size]`.
pub fn filter_by_size(mask: &mut BitBuffer2, labels: &mut LabelMap, config: &Config) -> SizeRejections {
    let mut rejections = SizeRejections::default();
    if !config.has_size_bounds() {
        return rejections;
    }

    let keep: Vec<bool> = labels
        .component_stats()
        .iter()
        .map(|stats| {
            let accepted = config.accepts_size(stats.pixel_count);
            if !accepted {
                if stats.pixel_count < config.min_particle_size {
                    rejections.too_small += 1;
                } else {
                    rejections.too_large += 1;
                }
            }
            accepted
        })
        .collect();

    labels.retain(&keep);
    *mask = labels.to_mask();

    tracing::debug!(
        "Size filter: kept {} components, {} too small, {} too large",
        labels.num_labels(),
        rejections.too_small,
        rejections.too_large
    );
    rejections
}

/// Clear a frame of `border_width` pixels along every edge of the mask.
///
/// Components erased completely are dropped from the label map; components
/// only trimmed keep their label. A width of at least half the smaller
/// dimension clears everything. Returns the number of dropped components.
pub fn mask_border(mask: &mut BitBuffer2, labels: &mut LabelMap, border_width: usize) -> usize {
    if border_width == 0 || mask.is_empty() {
        return 0;
    }

    let width = mask.width();
    let height = mask.height();
    let inner_x = border_width..width.saturating_sub(border_width);
    let inner_y = border_width..height.saturating_sub(border_width);

    if inner_x.is_empty() || inner_y.is_empty() {
        mask.fill(false);
    } else {
        for y in 0..height {
            if !inner_y.contains(&y) {
                for x in 0..width {
                    mask.set_xy(x, y, false);
                }
                continue;
            }
            for x in (0..inner_x.start).chain(inner_x.end..width) {
                mask.set_xy(x, y, false);
            }
        }
    }

    labels.intersect_mask(mask);
    let keep: Vec<bool> = labels
        .component_stats()
        .iter()
        .map(|stats| stats.pixel_count > 0)
        .collect();
    let removed = keep.iter().filter(|&&k| !k).count();
    labels.retain(&keep);

    tracing::debug!(
        "Border mask ({} px): {} components removed, {} remain",
        border_width,
        removed,
        labels.num_labels()
    );
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Connectivity;

    fn labeled(width: usize, height: usize, pixels: &[(usize, usize)]) -> (BitBuffer2, LabelMap) {
        let mut mask = BitBuffer2::new_default(width, height);
        for &(x, y) in pixels {
            mask.set_xy(x, y, true);
        }
        let labels = LabelMap::from_mask(&mask, Connectivity::Four);
        (mask, labels)
    }

    fn block(x0: usize, y0: usize, w: usize, h: usize) -> Vec<(usize, usize)> {
        (y0..y0 + h)
            .flat_map(|y| (x0..x0 + w).map(move |x| (x, y)))
            .collect()
    }

    #[test]
    fn test_size_filter_without_bounds_is_noop() {
        let (mut mask, mut labels) = labeled(10, 10, &block(2, 2, 3, 3));
        let before = mask.clone();
        let rejections = filter_by_size(&mut mask, &mut labels, &Config::default());
        assert_eq!(rejections, SizeRejections::default());
        assert_eq!(mask, before);
        assert_eq!(labels.num_labels(), 1);
    }

    #[test]
    fn test_size_filter_band() {
        // Components of 1, 4 and 9 pixels.
        let mut pixels = vec![(0, 0)];
        pixels.extend(block(3, 0, 2, 2));
        pixels.extend(block(7, 5, 3, 3));
        let (mut mask, mut labels) = labeled(12, 10, &pixels);
        assert_eq!(labels.num_labels(), 3);

        let config = Config {
            min_particle_size: 2,
            max_particle_size: Some(4),
            ..Default::default()
        };
        let rejections = filter_by_size(&mut mask, &mut labels, &config);

        assert_eq!(rejections.too_small, 1);
        assert_eq!(rejections.too_large, 1);
        assert_eq!(labels.num_labels(), 1);
        assert_eq!(mask.count_ones(), 4);
        assert!(mask.get_xy(3, 0) && !mask.get_xy(0, 0) && !mask.get_xy(8, 6));
        assert_eq!(labels.get(4, 1), 1);
    }

    #[test]
    fn test_size_bounds_are_inclusive() {
        let (mut mask, mut labels) = labeled(10, 10, &block(1, 1, 2, 2));
        let config = Config {
            min_particle_size: 4,
            max_particle_size: Some(4),
            ..Default::default()
        };
        filter_by_size(&mut mask, &mut labels, &config);
        assert_eq!(labels.num_labels(), 1);
    }

    #[test]
    fn test_border_clears_frame() {
        let (mut mask, mut labels) = labeled(10, 8, &block(0, 0, 10, 8));
        let removed = mask_border(&mut mask, &mut labels, 2);

        assert_eq!(removed, 0);
        assert_eq!(mask.count_ones(), 6 * 4);
        for y in 0..8 {
            for x in 0..10 {
                let inside = (2..8).contains(&x) && (2..6).contains(&y);
                assert_eq!(mask.get_xy(x, y), inside, "({x}, {y})");
                assert_eq!(labels.get(x, y) != 0, inside);
            }
        }
    }

    #[test]
    fn test_border_drops_erased_components_only() {
        let mut pixels = vec![(0, 0)];
        pixels.extend(block(0, 4, 4, 2)); // straddles the frame
        pixels.extend(block(4, 1, 2, 2)); // fully inside
        let (mut mask, mut labels) = labeled(10, 10, &pixels);
        assert_eq!(labels.num_labels(), 3);

        let removed = mask_border(&mut mask, &mut labels, 1);
        assert_eq!(removed, 1);
        assert_eq!(labels.num_labels(), 2);
        assert!(!mask.get_xy(0, 0));
        assert!(mask.get_xy(1, 4));
        assert!(!mask.get_xy(0, 4));
    }

    #[test]
    fn test_border_split_component_keeps_one_label() {
        // A U shape whose base lies in the frame splits into two arms.
        let mut pixels = block(2, 1, 1, 6);
        pixels.extend(block(6, 1, 1, 6));
        pixels.extend(block(2, 7, 5, 1));
        let (mut mask, mut labels) = labeled(9, 9, &pixels);
        assert_eq!(labels.num_labels(), 1);

        mask_border(&mut mask, &mut labels, 2);
        assert_eq!(labels.num_labels(), 1);
        assert_eq!(labels.get(2, 3), labels.get(6, 3));
    }

    #[test]
    fn test_wide_border_clears_everything() {
        let (mut mask, mut labels) = labeled(10, 6, &block(0, 0, 10, 6));
        let removed = mask_border(&mut mask, &mut labels, 3);
        assert_eq!(removed, 1);
        assert_eq!(mask.count_ones(), 0);
        assert_eq!(labels.num_labels(), 0);
    }
}
