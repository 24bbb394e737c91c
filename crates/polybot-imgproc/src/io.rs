//! Raster load/save for grids.
//!
//! - `load_grayscale`: decode any supported raster and convert to luminance.
//! - `save_filtered`: write a grid next to its source as `<stem>_filtered<ext>`.
//! - `to_gray_image`: rescale a grid into an 8-bit grayscale buffer.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use tracing::debug;

use crate::error::Result;
use crate::grid::Grid;

/// Suffix inserted between the file stem and extension of a saved grid.
pub const FILTERED_SUFFIX: &str = "_filtered";

/// Decode the raster at `path` and convert it to a luminance grid.
pub fn load_grayscale(path: &Path) -> Result<Grid> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    debug!(path = %path.display(), width, height, "loaded raster");
    Grid::from_rgb(width as usize, height as usize, rgb.as_raw())
}

/// `dir/photo.jpg` -> `dir/photo_filtered.jpg`.
pub fn filtered_path(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match original.extension() {
        Some(ext) => format!("{stem}{FILTERED_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{FILTERED_SUFFIX}"),
    };
    original.with_file_name(name)
}

/// Map the grid's `[min, max]` range linearly onto `[0, 255]`.
///
/// A constant grid maps to all zeros.
pub fn to_gray_image(grid: &Grid) -> GrayImage {
    let (lo, hi) = grid.min_max();
    let span = hi - lo;
    GrayImage::from_fn(grid.cols() as u32, grid.rows() as u32, |x, y| {
        let v = grid.get(y as usize, x as usize);
        let scaled = if span > 0.0 {
            ((v - lo) / span * 255.0).round()
        } else {
            0.0
        };
        Luma([scaled.clamp(0.0, 255.0) as u8])
    })
}

/// Write `grid` as a single-channel raster beside `original` and return the
/// new path. The encoder is picked from the original extension.
pub fn save_filtered(grid: &Grid, original: &Path) -> Result<PathBuf> {
    let path = filtered_path(original);
    to_gray_image(grid).save(&path)?;
    debug!(path = %path.display(), rows = grid.rows(), cols = grid.cols(), "saved grid");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn filtered_path_inserts_suffix_before_extension() {
        assert_eq!(
            filtered_path(Path::new("photos/file_3.jpg")),
            PathBuf::from("photos/file_3_filtered.jpg")
        );
        assert_eq!(
            filtered_path(Path::new("noext")),
            PathBuf::from("noext_filtered")
        );
    }

    #[test]
    fn rescales_to_full_range() {
        let g = Grid::from_rows(vec![vec![-10.0, 0.0, 10.0]]).unwrap();
        let img = to_gray_image(&g);
        assert_eq!(img.as_raw(), &vec![0u8, 128, 255]);
    }

    #[test]
    fn constant_grid_saves_black() {
        let g = Grid::filled(2, 2, 77.0).unwrap();
        assert!(to_gray_image(&g).as_raw().iter().all(|&p| p == 0));
    }

    #[test]
    fn save_then_load_keeps_shape() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("pic.png");
        RgbImage::from_fn(5, 3, |x, _| Rgb([(x * 40) as u8, 0, 0]))
            .save(&src)
            .unwrap();

        let grid = load_grayscale(&src).unwrap();
        assert_eq!(grid.dims(), (3, 5));

        let out = save_filtered(&grid, &src).unwrap();
        assert_eq!(out, dir.path().join("pic_filtered.png"));
        assert!(out.exists());
        assert_eq!(load_grayscale(&out).unwrap().dims(), (3, 5));
    }
}
