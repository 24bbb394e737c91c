use serde::{Deserialize, Serialize};

use crate::transform::{Direction, RotateMode};

/// Default blur window edge, in pixels.
pub const DEFAULT_BLUR_LEVEL: usize = 16;

/// Parameters the caption keywords are expanded with (`[image]` section).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageConfig {
    #[serde(default = "default_blur_level")]
    pub blur_level: usize,
    #[serde(default)]
    pub rotate_mode: RotateMode,
    #[serde(default)]
    pub concat_direction: Direction,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            blur_level: DEFAULT_BLUR_LEVEL,
            rotate_mode: RotateMode::default(),
            concat_direction: Direction::default(),
        }
    }
}

fn default_blur_level() -> usize {
    DEFAULT_BLUR_LEVEL
}
