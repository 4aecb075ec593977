//! Packed boolean plane used for particle masks.
//!
//! Every row starts on a fresh `u64`, so the labeler can walk a row word by
//! word. Bits past `width` in a row's last word stay zero.

const WORD_BITS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer2 {
    width: usize,
    height: usize,
    stride: usize,
    words: Vec<u64>,
}

impl BitBuffer2 {
    pub fn new_default(width: usize, height: usize) -> Self {
        let stride = width.div_ceil(WORD_BITS);
        Self {
            width,
            height,
            stride,
            words: vec![0; stride * height],
        }
    }

    pub fn new_filled(width: usize, height: usize, value: bool) -> Self {
        let mut mask = Self::new_default(width, height);
        mask.fill(value);
        mask
    }

    /// Packs a row-major slice of flags. Panics when the length does not match.
    pub fn from_slice(width: usize, height: usize, flags: &[bool]) -> Self {
        assert!(
            flags.len() == width * height,
            "mask {width}x{height} needs {} flags, got {}",
            width * height,
            flags.len()
        );

        let mut mask = Self::new_default(width, height);
        for (y, row) in flags.chunks(width.max(1)).enumerate().take(height) {
            for (x, _) in row.iter().enumerate().filter(|(_, set)| **set) {
                mask.set_xy(x, y, true);
            }
        }
        mask
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel count, `width * height`.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage words of row `y`, least significant bit first.
    #[inline]
    pub fn row_words(&self, y: usize) -> &[u64] {
        let start = y * self.stride;
        &self.words[start..start + self.stride]
    }

    /// Valid bits of a row's last word.
    fn tail_mask(&self) -> u64 {
        match self.width % WORD_BITS {
            0 => u64::MAX,
            bits => (1u64 << bits) - 1,
        }
    }

    #[inline]
    fn bit(&self, x: usize, y: usize) -> (usize, u64) {
        debug_assert!(x < self.width && y < self.height);
        (y * self.stride + x / WORD_BITS, 1 << (x % WORD_BITS))
    }

    #[inline]
    pub fn get_xy(&self, x: usize, y: usize) -> bool {
        let (word, bit) = self.bit(x, y);
        self.words[word] & bit != 0
    }

    #[inline]
    pub fn set_xy(&mut self, x: usize, y: usize, value: bool) {
        let (word, bit) = self.bit(x, y);
        if value {
            self.words[word] |= bit;
        } else {
            self.words[word] &= !bit;
        }
    }

    /// Reads the pixel at row-major offset `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        self.get_xy(idx % self.width, idx / self.width)
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: bool) {
        self.set_xy(idx % self.width, idx / self.width, value);
    }

    pub fn fill(&mut self, value: bool) {
        if !value || self.stride == 0 {
            self.words.fill(0);
            return;
        }
        let tail = self.tail_mask();
        for row in self.words.chunks_exact_mut(self.stride) {
            row.fill(u64::MAX);
            row[row.len() - 1] = tail;
        }
    }

    /// Number of marked pixels.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Pixel flags in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.height).flat_map(move |y| {
            let row = self.row_words(y);
            (0..self.width).map(move |x| (row[x / WORD_BITS] >> (x % WORD_BITS)) & 1 == 1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_mask_leaves_padding_clear() {
        let mask = BitBuffer2::new_filled(70, 3, true);
        assert_eq!(mask.count_ones(), 210);
        assert_eq!(mask.row_words(2), &[u64::MAX, 0b11_1111]);
    }

    #[test]
    fn test_marking_pixels() {
        let mut mask = BitBuffer2::new_default(90, 40);
        for (x, y) in [(0, 0), (63, 5), (64, 5), (89, 39)] {
            mask.set_xy(x, y, true);
        }
        assert_eq!(mask.count_ones(), 4);
        assert!(mask.get_xy(63, 5) && mask.get_xy(64, 5));
        assert!(!mask.get_xy(65, 5));

        mask.set_xy(63, 5, false);
        assert!(!mask.get_xy(63, 5));
        assert_eq!(mask.count_ones(), 3);
    }

    #[test]
    fn test_offset_access_is_row_major() {
        let mut mask = BitBuffer2::new_default(12, 3);
        mask.set(27, true);
        assert!(mask.get_xy(3, 2));
        assert!(mask.get(27));
        assert!(!mask.get(26));
    }

    #[test]
    fn test_each_row_starts_new_word() {
        let mut mask = BitBuffer2::new_default(65, 2);
        mask.set_xy(64, 0, true);
        mask.set_xy(0, 1, true);
        assert_eq!(mask.row_words(0), &[0, 1]);
        assert_eq!(mask.row_words(1), &[1, 0]);
    }

    #[test]
    fn test_from_slice_round_trips_through_iter() {
        let flags = [false, true, true, false, true, false, false, false, true];
        let mask = BitBuffer2::from_slice(3, 3, &flags);
        assert_eq!(mask.iter().collect::<Vec<_>>(), flags);
        assert_eq!(mask.count_ones(), 4);
    }

    #[test]
    fn test_fill_clears_and_sets() {
        let mut mask = BitBuffer2::new_filled(10, 10, true);
        mask.fill(false);
        assert_eq!(mask.count_ones(), 0);
        mask.fill(true);
        assert_eq!(mask.count_ones(), 100);
    }

    #[test]
    fn test_zero_sized_masks() {
        let narrow = BitBuffer2::new_filled(0, 5, true);
        assert!(narrow.is_empty());
        assert_eq!(narrow.count_ones(), 0);
        assert_eq!(narrow.iter().count(), 0);

        let flat = BitBuffer2::from_slice(4, 0, &[]);
        assert!(flat.is_empty());
    }
}
