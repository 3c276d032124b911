// src/puzzle/preview.rs

use super::part::{DrawContext, PartId, PuzzlePart};
use super::snapshot::PreviewRecord;
use crate::math::types::{Bbox, Point};
use crate::render::{RasterImage, Shadow, StrokeStyle, Surface};

/// Verkleinerte Vorschau des Zielbildes mit Schlagschatten und Fase.
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzlePreview {
    hidden: bool,
    bbox: Bbox,
}

impl PuzzlePreview {
    pub const SHADOW: f64 = 12.0;
    const SCALE_DOWN: f64 = 2.5;

    /// Startet ausgeblendet.
    pub fn new(working_image: &RasterImage) -> Self {
        let mut preview = Self {
            hidden: true,
            bbox: Bbox::default(),
        };
        preview.fit_to(working_image);
        preview
    }

    pub fn from_record(record: &PreviewRecord) -> Self {
        Self {
            hidden: record.hidden,
            bbox: record.bbox,
        }
    }

    pub fn record(&self) -> PreviewRecord {
        PreviewRecord {
            hidden: self.hidden,
            bbox: self.bbox,
        }
    }

    fn fit_to(&mut self, working_image: &RasterImage) {
        self.bbox = Bbox::new(
            0.0,
            0.0,
            working_image.width as f64 / Self::SCALE_DOWN,
            working_image.height as f64 / Self::SCALE_DOWN,
        );
    }
}

impl PuzzlePart for PuzzlePreview {
    fn part_id(&self) -> PartId {
        PartId::Preview
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    fn bbox(&self) -> Bbox {
        self.bbox
    }

    fn display_bbox(&self) -> Bbox {
        let mut shadowed = self.bbox;
        shadowed.br.offset(Self::SHADOW, Self::SHADOW);
        shadowed
    }

    fn display_pos(&self) -> Point {
        self.bbox.center()
    }

    fn set_display_pos(&mut self, pos: Point) {
        let center = self.bbox.center();
        self.bbox.offset(pos.x - center.x, pos.y - center.y);
    }

    fn contains_point(&self, p: Point) -> bool {
        self.bbox.contains_point(p)
    }

    fn resize(&mut self, factor: f64, working_image: &RasterImage) {
        self.bbox.scale(factor);
        let pos = self.display_pos();
        self.fit_to(working_image);
        self.set_display_pos(pos);
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &DrawContext<'_>) {
        let image = ctx.working_image;
        surface.save();
        surface.set_shadow(Some(Shadow {
            offset_x: Self::SHADOW / 2.0,
            offset_y: Self::SHADOW / 2.0,
            blur: Self::SHADOW - 4.0,
            color: "rgba(0,0,0,0.6)".to_string(),
        }));
        surface.draw_image(image, &image.bounds(), &self.bbox);
        surface.restore();

        // Fase: helle Kante oben links, dunkle unten rechts
        surface.save();
        surface.begin_path();
        surface.rect(&self.bbox);
        surface.clip();
        surface.set_shadow(Some(Shadow {
            offset_x: 3.0,
            offset_y: 3.0,
            blur: 3.0,
            color: "rgba(255,255,255,0.6)".to_string(),
        }));
        surface.stroke_rect(&self.bbox, &StrokeStyle::solid("#fff", 2.0));
        surface.set_shadow(Some(Shadow {
            offset_x: -3.0,
            offset_y: -3.0,
            blur: 3.0,
            color: "rgba(0,0,0,0.6)".to_string(),
        }));
        surface.stroke_rect(&self.bbox, &StrokeStyle::solid("#000", 2.0));
        surface.restore();
    }
}
