//! Owned luminance buffer for one image, row-major.
//!
//! Cells are `f64`. After [`Grid::from_rgb`] they lie in `[0, 255]`, but a
//! transform may leave values outside that range; nothing here clamps.

use crate::error::{ImgProcError, Result};

/// Weights applied to the red, green and blue channels to get luminance.
pub const LUMA_WEIGHTS: [f64; 3] = [0.2989, 0.5870, 0.1140];

/// Rectangular, non-empty grid of luminance values.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Grid {
    /// Wrap a row-major buffer. Fails when the grid would be empty or when
    /// `data` does not hold exactly `rows * cols` cells.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(ImgProcError::Empty);
        }
        if data.len() != rows * cols {
            return Err(ImgProcError::Ragged {
                row: data.len() / cols,
                expected: cols,
                found: data.len() % cols,
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Grid with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Result<Self> {
        Self::new(rows, cols, vec![value; rows * cols])
    }

    /// Build from nested rows, checking that every row has the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let height = rows.len();
        let mut data = Vec::with_capacity(height * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(ImgProcError::Ragged {
                    row: i,
                    expected: cols,
                    found: row.len(),
                });
            }
            data.extend(row);
        }
        Self::new(height, cols, data)
    }

    /// Convert packed RGB8 pixels to luminance with [`LUMA_WEIGHTS`].
    pub fn from_rgb(width: usize, height: usize, rgb: &[u8]) -> Result<Self> {
        let data = rgb
            .chunks_exact(3)
            .map(|px| {
                LUMA_WEIGHTS[0] * f64::from(px[0])
                    + LUMA_WEIGHTS[1] * f64::from(px[1])
                    + LUMA_WEIGHTS[2] * f64::from(px[2])
            })
            .collect();
        Self::new(height, width, data)
    }

    /// Number of rows (image height).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (image width).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Iterate rows top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols)
    }

    /// Whole buffer in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Apply `f` to every cell, keeping the shape.
    pub fn map(&self, f: impl FnMut(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().copied().map(f).collect(),
        }
    }

    /// Smallest and largest cell value.
    pub fn min_max(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }
}
