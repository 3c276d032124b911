// src/math/error.rs
use crate::math::geometry::SideId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MathError {
    #[error("Too few seeds or tiles: expected at least {expected}, got {actual}")]
    TooFewSeeds { expected: usize, actual: usize },

    #[error("Bed must have a positive size, got {width}x{height}")]
    InvalidBed { width: f64, height: f64 },

    #[error("Triangulation failed: {reason}")]
    TriangulationFailed { reason: String },

    #[error("Tesselation produced no tiles")]
    EmptyTesselation,

    #[error("Tile {tile} references unknown edge {edge}")]
    UnknownEdge { tile: u32, edge: u32 },

    #[error("Complement requested for unknown side {0}")]
    UnknownSide(SideId),

    #[error("Side {0} referenced more than twice")]
    SideOverused(SideId),

    #[error("Merging {polygons} outlines left no boundary sides")]
    DegenerateMerge { polygons: usize },
}

pub type MathResult<T> = Result<T, MathError>;
