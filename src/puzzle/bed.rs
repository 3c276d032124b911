// src/puzzle/bed.rs

use super::part::{DrawContext, PartId, PuzzlePart};
use super::snapshot::BedRecord;
use crate::math::types::{Bbox, Point};
use crate::render::{RasterImage, StrokeStyle, Surface};

/// Zielfläche des fertigen Bildes; wird nie getroffen und nie bewegt.
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleBed {
    hidden: bool,
    /// Um die Linienbreite vergrößerte Fläche
    outline: Bbox,
}

impl PuzzleBed {
    pub const LINE_WIDTH: f64 = 2.0;
    const DASH: [f64; 2] = [10.0, 10.0];

    /// Bett der Größe `width x height`, zentriert auf `center`
    pub fn new(center: Point, width: f64, height: f64) -> Self {
        Self::from_inner(Bbox::from_origin_size(
            Point::new(center.x - width / 2.0, center.y - height / 2.0),
            width,
            height,
        ))
    }

    pub fn from_inner(inner: Bbox) -> Self {
        Self {
            hidden: false,
            outline: inner.grown(Self::LINE_WIDTH),
        }
    }

    pub fn from_record(record: &BedRecord) -> Self {
        let mut bed = Self::from_inner(record.bbox);
        bed.hidden = record.hidden;
        bed
    }

    pub fn record(&self) -> BedRecord {
        BedRecord {
            hidden: self.hidden,
            bbox: self.bbox(),
        }
    }

    /// Kontrastfarbe der Bettkontur nach wahrgenommener Helligkeit (HSP).
    ///
    /// Nicht lesbare Farben gelten als hell.
    pub fn outline_color(background: &str) -> &'static str {
        let channel = |i: usize| {
            background
                .get(i..i + 2)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .map(f64::from)
        };
        let rgb = background
            .starts_with('#')
            .then(|| Some((channel(1)?, channel(3)?, channel(5)?)))
            .flatten();
        let Some((r, g, b)) = rgb else {
            return "#404040";
        };
        let brightness = (0.299 * r * r + 0.587 * g * g + 0.114 * b * b).sqrt();
        if brightness > 128.0 {
            "#404040"
        } else {
            "#c0c0c0c0"
        }
    }
}

impl PuzzlePart for PuzzleBed {
    fn part_id(&self) -> PartId {
        PartId::Bed
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    fn bbox(&self) -> Bbox {
        self.outline.shrunk(Self::LINE_WIDTH)
    }

    fn display_bbox(&self) -> Bbox {
        self.outline.quantized()
    }

    fn display_pos(&self) -> Point {
        self.outline.center()
    }

    fn set_display_pos(&mut self, pos: Point) {
        let center = self.outline.center();
        self.outline.offset(pos.x - center.x, pos.y - center.y);
    }

    fn contains_point(&self, _p: Point) -> bool {
        false
    }

    fn resize(&mut self, factor: f64, _working_image: &RasterImage) {
        self.outline
            .shrink(Self::LINE_WIDTH, Self::LINE_WIDTH)
            .scale(factor)
            .grow(Self::LINE_WIDTH, Self::LINE_WIDTH);
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &DrawContext<'_>) {
        let color = Self::outline_color(ctx.background_color);
        let rect = Bbox::from_origin_size(
            self.outline.tl.offsetted(1.0, 1.0),
            self.outline.width() - 3.0,
            self.outline.height() - 3.0,
        );
        surface.save();
        surface.stroke_rect(
            &rect,
            &StrokeStyle::solid(color, Self::LINE_WIDTH).with_dash(&Self::DASH),
        );
        surface.restore();
    }
}
