//! Connected component labeling using union-find over horizontal runs.
//!
//! Each mask row is decomposed into runs of set bits by word-level scanning;
//! runs overlapping runs of the previous row are merged through a union-find
//! table, and provisional labels are flattened to sequential ids `1..=n` in
//! order of each component's first run (scanline order). 0 is background.


use common::{BitBuffer2, Buffer2};

use crate::config::Connectivity;

// ============================================================================
// Run-Length Encoding
// ============================================================================

/// A horizontal run of foreground pixels.
#[derive(Debug, Clone, Copy)]
struct Run {
    start: u32, // inclusive
    end: u32,   // exclusive
    label: u32,
}

impl Run {
    /// Columns of the previous row that may touch this run. End is exclusive.
    #[inline]
    fn search_window(&self, connectivity: Connectivity) -> (u32, u32) {
        match connectivity {
            Connectivity::Four => (self.start, self.end),
            Connectivity::Eight => (self.start.saturating_sub(1), self.end + 1),
        }
    }
}

#[inline]
fn runs_connected(prev: &Run, curr: &Run, connectivity: Connectivity) -> bool {
    match connectivity {
        Connectivity::Four => prev.start < curr.end && prev.end > curr.start,
        Connectivity::Eight => prev.start < curr.end + 1 && prev.end + 1 > curr.start,
    }
}

/// Extract runs from one row of words, skipping empty and full words whole.
fn extract_runs_from_row(row_words: &[u64], width: usize, runs: &mut Vec<Run>) {
    let width = width as u32;
    let mut in_run = false;
    let mut run_start = 0u32;

    for (word_idx, &word) in row_words.iter().enumerate() {
        let base_x = word_idx as u32 * 64;

        if word == 0 {
            if in_run {
                runs.push(Run {
                    start: run_start,
                    end: base_x,
                    label: 0,
                });
                in_run = false;
            }
            continue;
        }

        if word == !0u64 {
            if !in_run {
                run_start = base_x;
                in_run = true;
            }
            continue;
        }

        let word_end = (base_x + 64).min(width);
        let mut pos = base_x;
        while pos < word_end {
            let remaining = word >> (pos - base_x);
            if in_run {
                let end = pos + (!remaining).trailing_zeros();
                if end >= word_end {
                    break;
                }
                runs.push(Run {
                    start: run_start,
                    end,
                    label: 0,
                });
                in_run = false;
                pos = end;
            } else {
                if remaining == 0 {
                    break;
                }
                let start = pos + remaining.trailing_zeros();
                if start >= word_end {
                    break;
                }
                run_start = start;
                in_run = true;
                pos = start;
            }
        }
    }

    if in_run {
        runs.push(Run {
            start: run_start,
            end: width,
            label: 0,
        });
    }
}

/// Give each run of the current row a label, merging with overlapping runs
/// of the previous row.
fn merge_runs_with_prev(
    curr_runs: &mut [Run],
    prev_runs: &[Run],
    connectivity: Connectivity,
    uf: &mut UnionFind,
) {
    let mut prev_idx = 0;
    for run in curr_runs.iter_mut() {
        let (search_start, search_end) = run.search_window(connectivity);

        while prev_idx < prev_runs.len() && prev_runs[prev_idx].end <= search_start {
            prev_idx += 1;
        }

        let mut assigned_label = None;
        let mut check_idx = prev_idx;
        while check_idx < prev_runs.len() && prev_runs[check_idx].start < search_end {
            let prev_run = &prev_runs[check_idx];
            if runs_connected(prev_run, run, connectivity) {
                match assigned_label {
                    Some(label) if label != prev_run.label => uf.union(label, prev_run.label),
                    None => assigned_label = Some(prev_run.label),
                    _ => {}
                }
            }
            check_idx += 1;
        }

        run.label = assigned_label.unwrap_or_else(|| uf.make_set());
    }
}

// ============================================================================
// LabelMap
// ============================================================================

/// Pixel count and coordinate sums of one component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentStats {
    pub pixel_count: usize,
    pub sum_x: u64,
    pub sum_y: u64,
}

impl ComponentStats {
    /// Mean (column, row) of the component's pixels.
    pub fn centroid(&self) -> (f64, f64) {
        if self.pixel_count == 0 {
            return (0.0, 0.0);
        }
        let n = self.pixel_count as f64;
        (self.sum_x as f64 / n, self.sum_y as f64 / n)
    }
}

/// A 2D label map from connected component analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Buffer2<u32>,
    num_labels: usize,
}

impl LabelMap {
    /// Label the set pixels of `mask`.
    pub fn from_mask(mask: &BitBuffer2, connectivity: Connectivity) -> Self {
        let width = mask.width();
        let height = mask.height();
        let mut labels = Buffer2::new_filled(width, height, 0u32);

        if width == 0 || height == 0 {
            return Self {
                labels,
                num_labels: 0,
            };
        }

        let mut uf = UnionFind::new();
        let mut prev_runs: Vec<Run> = Vec::with_capacity(width / 4);
        let mut curr_runs: Vec<Run> = Vec::with_capacity(width / 4);

        for y in 0..height {
            curr_runs.clear();
            extract_runs_from_row(mask.row_words(y), width, &mut curr_runs);

            if curr_runs.is_empty() {
                prev_runs.clear();
                continue;
            }

            merge_runs_with_prev(&mut curr_runs, &prev_runs, connectivity, &mut uf);

            let row = labels.row_mut(y);
            for run in &curr_runs {
                row[run.start as usize..run.end as usize].fill(run.label);
            }

            std::mem::swap(&mut prev_runs, &mut curr_runs);
        }

        let num_labels = uf.flatten_labels(labels.pixels_mut());
        Self { labels, num_labels }
    }

    /// Number of connected components (excluding background).
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.labels.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.labels.height()
    }

    #[inline]
    pub fn labels(&self) -> &[u32] {
        self.labels.pixels()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        *self.labels.get(x, y)
    }

    /// Per-component statistics, indexed by `label - 1`.
    pub fn component_stats(&self) -> Vec<ComponentStats> {
        let mut stats = vec![ComponentStats::default(); self.num_labels];
        let width = self.width();
        for (idx, &label) in self.labels.pixels().iter().enumerate() {
            if label == 0 {
                continue;
            }
            let s = &mut stats[(label - 1) as usize];
            s.pixel_count += 1;
            s.sum_x += (idx % width) as u64;
            s.sum_y += (idx / width) as u64;
        }
        stats
    }

    /// Keep only components whose `keep[label - 1]` is true, renumbering the
    /// survivors to `1..=k` in their current order. Returns the old label of
    /// each surviving new label.
    pub fn retain(&mut self, keep: &[bool]) -> Vec<u32> {
        assert_eq!(keep.len(), self.num_labels, "keep length mismatch");

        let mut remap = vec![0u32; self.num_labels + 1];
        let mut survivors = Vec::new();
        for (i, &k) in keep.iter().enumerate() {
            if k {
                survivors.push(i as u32 + 1);
                remap[i + 1] = survivors.len() as u32;
            }
        }

        for l in self.labels.pixels_mut() {
            *l = remap[*l as usize];
        }
        self.num_labels = survivors.len();
        survivors
    }

    /// Zero every label whose mask bit is clear.
    pub fn intersect_mask(&mut self, mask: &BitBuffer2) {
        assert_eq!(mask.width(), self.width(), "width mismatch");
        assert_eq!(mask.height(), self.height(), "height mismatch");

        let width = self.width();
        for y in 0..self.height() {
            let row = self.labels.row_mut(y);
            for (x, l) in row.iter_mut().enumerate().take(width) {
                if *l != 0 && !mask.get_xy(x, y) {
                    *l = 0;
                }
            }
        }
    }

    /// Mask of all labeled pixels.
    pub fn to_mask(&self) -> BitBuffer2 {
        let mut mask = BitBuffer2::new_default(self.width(), self.height());
        for (idx, &l) in self.labels.pixels().iter().enumerate() {
            if l != 0 {
                mask.set(idx, true);
            }
        }
        mask
    }
}

impl std::ops::Index<usize> for LabelMap {
    type Output = u32;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.labels[idx]
    }
}

// ============================================================================
// Union-Find
// ============================================================================

/// Union-find over provisional labels `1..`; the smaller label becomes root.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: Vec::with_capacity(256),
        }
    }

    #[inline]
    fn make_set(&mut self) -> u32 {
        let label = self.parent.len() as u32 + 1;
        self.parent.push(label);
        label
    }

    /// Find root with path compression.
    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[(root - 1) as usize] != root {
            root = self.parent[(root - 1) as usize];
        }

        let mut current = label;
        while current != root {
            let next = self.parent[(current - 1) as usize];
            self.parent[(current - 1) as usize] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (smaller, larger) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[(larger - 1) as usize] = smaller;
        }
    }

    /// Rewrite provisional labels to sequential 1..n. Returns n.
    fn flatten_labels(&mut self, labels: &mut [u32]) -> usize {
        let len = self.parent.len();
        if len == 0 {
            return 0;
        }

        let mut label_map = vec![0u32; len + 1];
        let mut num_labels = 0u32;
        for i in 1..=len as u32 {
            let root = self.find(i);
            if label_map[root as usize] == 0 {
                num_labels += 1;
                label_map[root as usize] = num_labels;
            }
            label_map[i as usize] = label_map[root as usize];
        }

        for l in labels.iter_mut() {
            *l = label_map[*l as usize];
        }
        num_labels as usize
    }
}
