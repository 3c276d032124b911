// src/render/mod.rs
pub mod recording;
pub mod surface;
pub mod svg;

pub use recording::{DrawOp, RecordingSurface};
pub use surface::{FillStyle, RasterImage, Shadow, StrokeStyle, Surface};
pub use self::svg::SvgSurface;
