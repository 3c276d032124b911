// src/math/mod.rs
pub mod error;
pub mod geometry;
pub mod probability;
pub mod tesselation;
pub mod types;
pub mod utils;

// Re-exports für einfache Verwendung
pub use error::{MathError, MathResult};
pub use types::*;
