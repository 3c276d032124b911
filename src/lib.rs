// src/lib.rs
pub mod math;
pub mod puzzle;
pub mod render;
