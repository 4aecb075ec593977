//! Row-major 2D storage shared by the grayscale, background and label planes.

use std::ops::{Index, IndexMut, Range};

/// A `width`×`height` plane of values stored row after row.
///
/// Element `(x, y)` lives at linear offset `y * width + x`; both the tuple and
/// the linear form can be used with `[]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer2<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Buffer2<T> {
    /// Wraps `data` as a plane. Panics when the length does not match.
    pub fn new(width: usize, height: usize, data: Vec<T>) -> Self {
        assert!(
            data.len() == width * height,
            "plane {width}x{height} needs {} values, got {}",
            width * height,
            data.len()
        );
        Self {
            width,
            height,
            data,
        }
    }

    pub fn new_filled(width: usize, height: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn new_default(width: usize, height: usize) -> Self
    where
        T: Clone + Default,
    {
        Self::new_filled(width, height, T::default())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    #[inline]
    fn row_span(&self, y: usize) -> Range<usize> {
        let start = y * self.width;
        start..start + self.width
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.offset(x, y)]
    }

    /// All values in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[self.row_span(y)]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let span = self.row_span(y);
        &mut self.data[span]
    }

    /// Builds a plane of the same size from a per-value transform.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Buffer2<U> {
        Buffer2::new(self.width, self.height, self.data.iter().map(f).collect())
    }

    /// Copies the `width`×`height` window anchored at `(x, y)` into a new plane.
    ///
    /// Panics when the window reaches past the right or bottom edge.
    pub fn sub_buffer(&self, x: usize, y: usize, width: usize, height: usize) -> Buffer2<T>
    where
        T: Copy,
    {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "window at ({x}, {y}) of {width}x{height} leaves the {}x{} plane",
            self.width,
            self.height
        );

        let data = (y..y + height)
            .flat_map(|row| self.row(row)[x..x + width].iter().copied())
            .collect();
        Buffer2::new(width, height, data)
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        self.get(x, y)
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        let offset = self.offset(x, y);
        &mut self.data[offset]
    }
}

impl<T> Index<usize> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, offset: usize) -> &T {
        &self.data[offset]
    }
}

impl<T> IndexMut<usize> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, offset: usize) -> &mut T {
        &mut self.data[offset]
    }
}
