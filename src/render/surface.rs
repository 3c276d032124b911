// src/render/surface.rs
use crate::math::types::{Bbox, Point};
use serde::{Deserialize, Serialize};

/// Handle auf ein dekodiertes Rasterbild bekannter Größe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }

    /// Dieselbe Quelle, auf eine neue Pixelgröße skaliert
    pub fn scaled_to(&self, width: f64, height: f64) -> Self {
        Self {
            url: self.url.clone(),
            width: width.round().max(1.0) as u32,
            height: height.round().max(1.0) as u32,
        }
    }

    pub fn bounds(&self) -> Bbox {
        Bbox::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillStyle {
    Color(String),
    /// Wiederholtes Bild über einer Grundfarbe; `alpha` ist die Deckkraft des Bildes.
    Pattern {
        image: RasterImage,
        base_color: String,
        alpha: f64,
    },
}

impl FillStyle {
    pub fn color(color: impl Into<String>) -> Self {
        FillStyle::Color(color.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f64,
    pub dash: Vec<f64>,
}

impl StrokeStyle {
    pub fn solid(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
            dash: Vec::new(),
        }
    }

    pub fn with_dash(mut self, dash: &[f64]) -> Self {
        self.dash = dash.to_vec();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub color: String,
}

/// Abstraktes 2D-Zeichenbackend.
///
/// Transformationen (`translate`, `rotate`) und Clip-Regionen gelten bis zum
/// passenden `restore`. Pfade werden mit `begin_path` begonnen und von `fill`,
/// `stroke` oder `clip` verbraucht.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);

    fn translate(&mut self, dx: f64, dy: f64);
    /// Rotation in Radiant um den aktuellen Ursprung
    fn rotate(&mut self, angle: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point);
    fn rect(&mut self, rect: &Bbox);
    fn close_path(&mut self);

    /// Schneidet alle folgenden Operationen auf den aktuellen Pfad zu
    fn clip(&mut self);
    fn fill(&mut self, style: &FillStyle);
    fn stroke(&mut self, style: &StrokeStyle);

    fn set_shadow(&mut self, shadow: Option<Shadow>);

    /// Zeichnet den Bereich `src` des Bildes in das Rechteck `dst`.
    fn draw_image(&mut self, image: &RasterImage, src: &Bbox, dst: &Bbox);

    fn fill_rect(&mut self, rect: &Bbox, style: &FillStyle) {
        self.begin_path();
        self.rect(rect);
        self.fill(style);
    }

    fn stroke_rect(&mut self, rect: &Bbox, style: &StrokeStyle) {
        self.begin_path();
        self.rect(rect);
        self.stroke(style);
    }
}
