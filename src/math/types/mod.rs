// src/math/types/mod.rs
pub mod bounds;
pub mod point;

pub use bounds::*;
pub use point::*;

// Einheitliche Typen für das gesamte Modul
pub type SpadePoint = spade::Point2<f64>;
