// src/render/recording.rs
use super::surface::{FillStyle, RasterImage, Shadow, StrokeStyle, Surface};
use crate::math::types::{Bbox, Point};

/// Eine aufgezeichnete Zeichenoperation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Translate(f64, f64),
    Rotate(f64),
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    BezierCurveTo(Point, Point, Point),
    Rect(Bbox),
    ClosePath,
    Clip,
    Fill(FillStyle),
    Stroke(StrokeStyle),
    SetShadow(Option<Shadow>),
    DrawImage {
        url: String,
        src: Bbox,
        dst: Bbox,
    },
}

/// Zeichenfläche ohne Ausgabe, die alle Aufrufe mitschreibt.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&DrawOp) -> bool,
    {
        self.ops.iter().filter(|op| predicate(op)).count()
    }

    pub fn images_drawn(&self) -> usize {
        self.count(|op| matches!(op, DrawOp::DrawImage { .. }))
    }

    /// Rechtecke, die als erstes nach einem `Save` geclippt wurden
    pub fn clip_rects(&self) -> Vec<Bbox> {
        self.ops
            .windows(3)
            .filter_map(|w| match w {
                [DrawOp::BeginPath, DrawOp::Rect(r), DrawOp::Clip] => Some(*r),
                _ => None,
            })
            .collect()
    }

    /// Save und Restore sind ausgeglichen
    pub fn is_balanced(&self) -> bool {
        let mut depth: i64 = 0;
        for op in &self.ops {
            match op {
                DrawOp::Save => depth += 1,
                DrawOp::Restore => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return false;
            }
        }
        depth == 0
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.ops.push(DrawOp::Translate(dx, dy));
    }

    fn rotate(&mut self, angle: f64) {
        self.ops.push(DrawOp::Rotate(angle));
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, p: Point) {
        self.ops.push(DrawOp::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.ops.push(DrawOp::LineTo(p));
    }

    fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.ops.push(DrawOp::BezierCurveTo(c1, c2, p));
    }

    fn rect(&mut self, rect: &Bbox) {
        self.ops.push(DrawOp::Rect(*rect));
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn clip(&mut self) {
        self.ops.push(DrawOp::Clip);
    }

    fn fill(&mut self, style: &FillStyle) {
        self.ops.push(DrawOp::Fill(style.clone()));
    }

    fn stroke(&mut self, style: &StrokeStyle) {
        self.ops.push(DrawOp::Stroke(style.clone()));
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.ops.push(DrawOp::SetShadow(shadow));
    }

    fn draw_image(&mut self, image: &RasterImage, src: &Bbox, dst: &Bbox) {
        self.ops.push(DrawOp::DrawImage {
            url: image.url.clone(),
            src: *src,
            dst: *dst,
        });
    }
}
