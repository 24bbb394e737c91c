use thiserror::Error;

/// Errors produced while building, transforming, loading or saving a grid.
#[derive(Debug, Error)]
pub enum ImgProcError {
    #[error("grid must have at least one row and one column")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("size mismatch: {left_rows}x{left_cols} vs {right_rows}x{right_cols}")]
    SizeMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    #[error("blur level {level} is invalid for a {rows}x{cols} grid")]
    InvalidBlurLevel {
        level: usize,
        rows: usize,
        cols: usize,
    },

    #[error("{op} needs a larger grid than {rows}x{cols}")]
    TooSmall {
        op: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("{op} expects a square grid, got {rows}x{cols}")]
    NotSquare {
        op: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("unsupported concat direction: {0}")]
    UnsupportedDirection(String),

    #[error("{op} expects {expected} input image(s), got {found}")]
    Inputs {
        op: &'static str,
        expected: usize,
        found: usize,
    },

    /// Decode or encode failure, including the file I/O underneath it.
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),
}

impl ImgProcError {
    /// `true` when the error was caused by the caller's input (shape or option),
    /// as opposed to a codec or filesystem failure.
    pub fn is_input(&self) -> bool {
        !matches!(self, Self::Codec(_))
    }
}

pub type Result<T> = std::result::Result<T, ImgProcError>;
