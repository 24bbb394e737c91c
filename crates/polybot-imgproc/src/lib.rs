//! Luminance grid and the pixel transforms the bot applies to user photos.
//!
//! Every transform is a pure function from one or two [`Grid`]s to a new
//! `Grid`. Loading and saving rasters lives in [`io`].

pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod transform;

pub use config::ImageConfig;
pub use error::{ImgProcError, Result};
pub use grid::Grid;
pub use transform::{Direction, RotateMode, Transform};
