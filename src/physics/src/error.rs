//! Error types for the fluid backdrop.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FluidError {
    #[error("render surface error: {0}")]
    Surface(String),

    #[error("pixel upload failed: {0}")]
    Pixels(String),

    #[error("missing element: {0}")]
    MissingElement(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, FluidError>;
