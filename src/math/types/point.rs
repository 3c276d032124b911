// src/math/types/point.rs

use super::Bbox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Veränderliche 2D-Koordinate in Canvas-Pixeln (y zeigt nach unten).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Ganzzahliger Schlüssel eines Punktes, `round(x)_round(y)`.
pub type PointKey = (i64, i64);

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Hash-Schlüssel für das Verketten von Seiten über gemeinsame Endpunkte.
    pub fn to_key(&self) -> PointKey {
        (self.x.round() as i64, self.y.round() as i64)
    }

    pub fn offset(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub fn offsetted(mut self, dx: f64, dy: f64) -> Self {
        self.offset(dx, dy);
        self
    }

    pub fn scale(&mut self, factor: f64) {
        self.x *= factor;
        self.y *= factor;
    }

    pub fn scaled(mut self, factor: f64) -> Self {
        self.scale(factor);
        self
    }

    /// Klemmt den Punkt in die Bounding Box.
    pub fn confine(&mut self, bbox: &Bbox) -> &mut Self {
        self.x = self.x.clamp(bbox.tl.x, bbox.br.x.max(bbox.tl.x));
        self.y = self.y.clamp(bbox.tl.y, bbox.br.y.max(bbox.tl.y));
        self
    }

    /// Rotiert den Punkt um `(x0, y0)` mit vorberechnetem Kosinus/Sinus.
    pub fn rotate_about(&mut self, x0: f64, y0: f64, cos: f64, sin: f64) {
        let x = self.x - x0;
        let y = self.y - y0;
        self.x = x * cos - y * sin + x0;
        self.y = x * sin + y * cos + y0;
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<spade::Point2<f64>> for Point {
    fn from(p: spade::Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Point> for spade::Point2<f64> {
    fn from(p: Point) -> Self {
        spade::Point2::new(p.x, p.y)
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        geo::Coord { x: p.x, y: p.y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{x:{},y:{}}}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_key_rounds_to_nearest_pixel() {
        assert_eq!(Point::new(10.4, -3.6).to_key(), (10, -4));
        assert_eq!(Point::new(10.5, 2.5).to_key(), (11, 3));
    }

    #[test]
    fn test_confine_clamps_into_bbox() {
        let bbox = Bbox::new(0.0, 0.0, 100.0, 50.0);
        let mut p = Point::new(-5.0, 70.0);
        p.confine(&bbox);
        assert_eq!(p, Point::new(0.0, 50.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut p = Point::new(10.0, 0.0);
        let angle = std::f64::consts::FRAC_PI_2;
        p.rotate_about(0.0, 0.0, angle.cos(), angle.sin());
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 10.0, epsilon = 1e-9);
    }
}
