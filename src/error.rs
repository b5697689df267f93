//! Error types.
//!
//! Rendering never fails on its own; the only render-time error is the optional input ceiling.

use std::path::PathBuf;

/// Errors from [`try_render`][crate::try_render].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("input is {len} bytes, over the {max} byte limit")]
    InputTooLong { len: usize, max: usize },
}

/// Errors from loading [`RenderOptions`][crate::RenderOptions] out of a TOML file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// A value parsed but is not usable.
    #[error("Validation error: {0}")]
    Validation(String),
}
