//! Background luminance estimation.
//!
//! The expected local brightness of every pixel is a Gaussian-smoothed copy of
//! the grayscale channel. The blur is separable: rows first, then columns,
//! which is O(n×k) instead of O(n×k²) for kernel size k.
//!
//! `blur_radius` (the Gaussian sigma) must exceed the radius of the largest
//! particle to be detected, otherwise particles darken their own background
//! and fall out of the threshold band. This is a tuning contract for callers
//! and is not enforced.


use common::Buffer2;
use rayon::prelude::*;

/// Kernel half-width in units of sigma.
const TRUNCATE_SIGMAS: f64 = 4.0;

/// Rows handed to one rayon task.
const ROWS_PER_CHUNK: usize = 8;

/// Compute a normalized 1D Gaussian kernel of radius `floor(4σ + 0.5)`.
pub fn gaussian_kernel_1d(sigma: f64) -> Vec<f64> {
    assert!(sigma > 0.0, "Sigma must be positive");

    let radius = (TRUNCATE_SIGMAS * sigma + 0.5) as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Map an out-of-range coordinate into `0..n` by half-sample symmetric
/// reflection (`d c b a | a b c d | d c b a`).
#[inline]
fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m >= n {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

/// Smoothed luminance field of `gray` with Gaussian sigma `blur_radius`.
///
/// Accumulates in f64 and stores f32; values are not clamped or rounded.
pub fn estimate_background(gray: &Buffer2<u8>, blur_radius: f32) -> Buffer2<f32> {
    let width = gray.width();
    let height = gray.height();
    if width == 0 || height == 0 {
        return Buffer2::new_default(width, height);
    }

    let kernel = gaussian_kernel_1d(blur_radius as f64);
    let radius = kernel.len() / 2;

    let input: Vec<f64> = gray.pixels().iter().map(|&v| v as f64).collect();

    let mut temp = vec![0.0f64; width * height];
    convolve_rows(&input, &mut temp, width, &kernel);

    let mut output = vec![0.0f32; width * height];
    convolve_cols(&temp, &mut output, width, height, &kernel);

    tracing::debug!(
        "Estimated background {}x{} with sigma={:.1} (kernel radius {})",
        width,
        height,
        blur_radius,
        radius
    );

    Buffer2::new(width, height, output)
}

/// Horizontal pass.
fn convolve_rows(input: &[f64], output: &mut [f64], width: usize, kernel: &[f64]) {
    let radius = kernel.len() / 2;

    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let y_start = chunk_idx * ROWS_PER_CHUNK;
            let rows_in_chunk = out_chunk.len() / width;
            let mut padded = vec![0.0f64; width + 2 * radius];

            for local_y in 0..rows_in_chunk {
                let y = y_start + local_y;
                let in_row = &input[y * width..(y + 1) * width];
                for (i, p) in padded.iter_mut().enumerate() {
                    *p = in_row[reflect_index(i as isize - radius as isize, width)];
                }

                let out_row = &mut out_chunk[local_y * width..(local_y + 1) * width];
                for (x, out) in out_row.iter_mut().enumerate() {
                    *out = padded[x..x + kernel.len()]
                        .iter()
                        .zip(kernel)
                        .map(|(&p, &k)| p * k)
                        .sum();
                }
            }
        });
}

/// Vertical pass; each output row is a weighted sum of whole input rows.
fn convolve_cols(input: &[f64], output: &mut [f32], width: usize, height: usize, kernel: &[f64]) {
    let radius = kernel.len() / 2;

    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let y_start = chunk_idx * ROWS_PER_CHUNK;
            let rows_in_chunk = out_chunk.len() / width;
            let mut acc = vec![0.0f64; width];

            for local_y in 0..rows_in_chunk {
                let y = y_start + local_y;
                acc.fill(0.0);

                for (k, &kval) in kernel.iter().enumerate() {
                    let sy = reflect_index(y as isize + k as isize - radius as isize, height);
                    let in_row = &input[sy * width..(sy + 1) * width];
                    for (a, &v) in acc.iter_mut().zip(in_row) {
                        *a += v * kval;
                    }
                }

                let out_row = &mut out_chunk[local_y * width..(local_y + 1) * width];
                for (out, &a) in out_row.iter_mut().zip(&acc) {
                    *out = a as f32;
                }
            }
        });
}
