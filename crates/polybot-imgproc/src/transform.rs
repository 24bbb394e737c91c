//! Pixel transforms. Each function reads its input grid(s) and returns a new one.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ImgProcError, Result};
use crate::grid::Grid;

/// Cells drawing below this value become salt (255).
pub const SALT_PROBABILITY: f64 = 0.2;
/// Cells drawing above this value become pepper (0).
pub const PEPPER_THRESHOLD: f64 = 0.8;
/// Cells strictly above this luminance are white after [`segment`].
pub const SEGMENT_THRESHOLD: f64 = 100.0;

/// Box blur with a `level × level` window and no padding.
///
/// The output is `(rows - level + 1) × (cols - level + 1)`; each cell is the
/// floor of the mean of its window.
pub fn blur(grid: &Grid, level: usize) -> Result<Grid> {
    let (rows, cols) = grid.dims();
    if level == 0 || level > rows.min(cols) {
        return Err(ImgProcError::InvalidBlurLevel { level, rows, cols });
    }

    // Summed-area table with a zero border: sat[(r, c)] = sum of grid[..r][..c].
    let stride = cols + 1;
    let mut sat = vec![0.0_f64; (rows + 1) * stride];
    for r in 0..rows {
        let mut run = 0.0;
        for c in 0..cols {
            run += grid.get(r, c);
            sat[(r + 1) * stride + c + 1] = sat[r * stride + c + 1] + run;
        }
    }

    let out_rows = rows - level + 1;
    let out_cols = cols - level + 1;
    let area = (level * level) as f64;
    let mut data = Vec::with_capacity(out_rows * out_cols);
    for r in 0..out_rows {
        for c in 0..out_cols {
            let sum = sat[(r + level) * stride + c + level] - sat[r * stride + c + level]
                - sat[(r + level) * stride + c]
                + sat[r * stride + c];
            data.push((sum / area).floor());
        }
    }
    Grid::new(out_rows, out_cols, data)
}

/// Horizontal edge magnitude: each row becomes the absolute differences of
/// adjacent cells, so the grid loses one column.
pub fn contour(grid: &Grid) -> Result<Grid> {
    let (rows, cols) = grid.dims();
    if cols < 2 {
        return Err(ImgProcError::TooSmall {
            op: "contour",
            rows,
            cols,
        });
    }
    let data = grid
        .iter_rows()
        .flat_map(|row| row.windows(2).map(|w| (w[0] - w[1]).abs()))
        .collect();
    Grid::new(rows, cols - 1, data)
}

/// How [`rotate`] builds its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotateMode {
    /// True 90° clockwise rotation of any rectangular grid.
    #[default]
    Full,
    /// Row `i` of the output is column `i` read from row 1 downwards, reversed.
    /// Only defined for square grids; the output is `n × (n - 1)`, i.e. the
    /// clockwise rotation without its last column.
    LegacyCrop,
}

/// Rotate the grid a quarter turn clockwise.
pub fn rotate(grid: &Grid, mode: RotateMode) -> Result<Grid> {
    let (rows, cols) = grid.dims();
    match mode {
        RotateMode::Full => {
            let mut data = Vec::with_capacity(rows * cols);
            for c in 0..cols {
                data.extend((0..rows).rev().map(|r| grid.get(r, c)));
            }
            Grid::new(cols, rows, data)
        }
        RotateMode::LegacyCrop => {
            if rows != cols {
                return Err(ImgProcError::NotSquare {
                    op: "rotate",
                    rows,
                    cols,
                });
            }
            if rows < 2 {
                return Err(ImgProcError::TooSmall {
                    op: "rotate",
                    rows,
                    cols,
                });
            }
            let n = rows;
            let mut data = Vec::with_capacity(n * (n - 1));
            for i in 0..n {
                data.extend((1..n).rev().map(|j| grid.get(j, i)));
            }
            Grid::new(n, n - 1, data)
        }
    }
}

/// Independently per cell: with probability 0.2 set to 255, with probability
/// 0.2 set to 0, otherwise keep the value.
pub fn salt_n_pepper<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Grid {
    grid.map(|v| {
        let draw: f64 = rng.random();
        if draw < SALT_PROBABILITY {
            255.0
        } else if draw > PEPPER_THRESHOLD {
            0.0
        } else {
            v
        }
    })
}

/// Binary threshold: 255 where the cell is above 100, else 0.
pub fn segment(grid: &Grid) -> Grid {
    grid.map(|v| if v > SEGMENT_THRESHOLD { 255.0 } else { 0.0 })
}

/// Side on which the second image is attached by [`concat`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// `other` goes to the right; width doubles.
    #[default]
    Horizontal,
    /// `other` goes below; height doubles.
    Vertical,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

impl FromStr for Direction {
    type Err = ImgProcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(ImgProcError::UnsupportedDirection(other.to_string())),
        }
    }
}

/// Join two grids of identical shape side by side or one above the other.
pub fn concat(first: &Grid, other: &Grid, direction: Direction) -> Result<Grid> {
    if first.dims() != other.dims() {
        return Err(ImgProcError::SizeMismatch {
            left_rows: first.rows(),
            left_cols: first.cols(),
            right_rows: other.rows(),
            right_cols: other.cols(),
        });
    }
    let (rows, cols) = first.dims();
    match direction {
        Direction::Horizontal => {
            let mut data = Vec::with_capacity(rows * cols * 2);
            for (left, right) in first.iter_rows().zip(other.iter_rows()) {
                data.extend_from_slice(left);
                data.extend_from_slice(right);
            }
            Grid::new(rows, cols * 2, data)
        }
        Direction::Vertical => {
            let mut data = Vec::with_capacity(rows * cols * 2);
            data.extend_from_slice(first.as_slice());
            data.extend_from_slice(other.as_slice());
            Grid::new(rows * 2, cols, data)
        }
    }
}

/// One transform together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Blur { level: usize },
    Contour,
    Rotate(RotateMode),
    SaltAndPepper,
    Segment,
    Concat(Direction),
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blur { .. } => "blur",
            Self::Contour => "contour",
            Self::Rotate(_) => "rotate",
            Self::SaltAndPepper => "salt_n_pepper",
            Self::Segment => "segment",
            Self::Concat(_) => "concat",
        }
    }

    /// How many source images the transform reads.
    pub fn inputs(&self) -> usize {
        match self {
            Self::Concat(_) => 2,
            _ => 1,
        }
    }

    /// Apply to `inputs`, drawing noise from the thread-local generator.
    pub fn apply(&self, inputs: &[Grid]) -> Result<Grid> {
        self.apply_with_rng(inputs, &mut rand::rng())
    }

    pub fn apply_with_rng<R: Rng + ?Sized>(&self, inputs: &[Grid], rng: &mut R) -> Result<Grid> {
        if inputs.len() != self.inputs() {
            return Err(ImgProcError::Inputs {
                op: self.name(),
                expected: self.inputs(),
                found: inputs.len(),
            });
        }
        let first = &inputs[0];
        match *self {
            Self::Blur { level } => blur(first, level),
            Self::Contour => contour(first),
            Self::Rotate(mode) => rotate(first, mode),
            Self::SaltAndPepper => Ok(salt_n_pepper(first, rng)),
            Self::Segment => Ok(segment(first)),
            Self::Concat(direction) => concat(first, &inputs[1], direction),
        }
    }
}
