// src/puzzle/part.rs

use crate::math::types::{Bbox, Point};
use crate::render::{RasterImage, Surface};
use serde::{Deserialize, Serialize};

/// Stabile ID eines Teils, vergeben pro Puzzle
pub type PieceId = u32;

/// Eintrag im Zeichenstapel; das Puzzle löst ihn zum konkreten Teil auf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PartId {
    Bed,
    Piece(PieceId),
    Preview,
}

impl PartId {
    pub fn piece(&self) -> Option<PieceId> {
        match self {
            PartId::Piece(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_piece(&self) -> bool {
        matches!(self, PartId::Piece(_))
    }
}

/// Gemeinsamer Zeichenzustand aller Teile
pub struct DrawContext<'a> {
    /// Quellbild, auf Bettgröße skaliert
    pub working_image: &'a RasterImage,
    pub background_color: &'a str,
}

/// Alles, was auf dem Brett gezeichnet und getroffen werden kann.
pub trait PuzzlePart {
    fn part_id(&self) -> PartId;

    fn is_hidden(&self) -> bool;
    fn set_hidden(&mut self, hidden: bool);

    /// Geometrische Bounding Box
    fn bbox(&self) -> Bbox;

    /// Bereich, den das Teil beim Zeichnen berührt
    fn display_bbox(&self) -> Bbox {
        self.bbox()
    }

    fn display_pos(&self) -> Point;
    fn set_display_pos(&mut self, pos: Point);

    fn contains_point(&self, p: Point) -> bool;

    fn intersects(&self, bbox: &Bbox) -> bool {
        self.display_bbox().intersects(bbox)
    }

    /// Skaliert Geometrie und Lage um `factor`; `working_image` hat bereits die neue Größe.
    fn resize(&mut self, factor: f64, working_image: &RasterImage);

    fn draw(&self, surface: &mut dyn Surface, ctx: &DrawContext<'_>);

    fn is_edge(&self) -> bool {
        false
    }

    fn is_composite(&self) -> bool {
        false
    }
}
