// src/math/probability/seed/mod.rs
pub mod resource;

pub use resource::SeedResource;
