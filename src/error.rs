//! Errors raised while building a [Grid](crate::grid::Grid).

use thiserror::Error;

/// Invalid grid construction parameters. Values are reported as given and never clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("cell radius must be positive and finite, got {0}")]
    NonPositiveRadius(f32),

    #[error("grid extent must be positive and finite, got {width} x {height}")]
    NonPositiveExtent { width: f32, height: f32 },

    #[error("grid extent {width} x {height} holds no cell of diameter {diameter}")]
    EmptyGrid {
        width: f32,
        height: f32,
        diameter: f32,
    },

    #[error("grid of {width} x {height} cells is too large")]
    TooLarge { width: usize, height: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
