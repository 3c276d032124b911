// src/puzzle/error.rs
use crate::math::error::MathError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("Failed to decode image '{url}': {reason}")]
    ImageDecode { url: String, reason: String },

    #[error("No image URL given and none loaded before")]
    MissingImage,

    #[error("Puzzle has not been prepared yet")]
    NotPrepared,

    #[error("Geometry error: {0}")]
    Geometry(#[from] MathError),

    #[error("Snapshot (de)serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type PuzzleResult<T> = Result<T, PuzzleError>;
