// src/puzzle/mod.rs
pub mod bed;
pub mod board;
pub mod config;
pub mod details;
pub mod error;
pub mod image;
pub mod part;
pub mod piece;
pub mod preview;
pub mod snapshot;
pub mod visibility;

pub use bed::PuzzleBed;
pub use board::{IdAllocator, Puzzle, PuzzleState};
pub use config::PuzzleConfig;
pub use details::PuzzleDetails;
pub use error::{PuzzleError, PuzzleResult};
pub use image::{FsImageLoader, ImageLoader, StaticImageLoader};
pub use part::{DrawContext, PartId, PieceId, PuzzlePart};
pub use piece::{PuzzlePiece, RotationSteps};
pub use preview::PuzzlePreview;
pub use snapshot::PuzzleSnapshot;
pub use visibility::Visibility;
