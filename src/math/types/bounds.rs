// src/math/types/bounds.rs

use super::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Achsenparallele Box mit `tl` (oben links) und `br` (unten rechts).
///
/// Leer/degeneriert, sobald Breite oder Höhe `<= 0` ist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub tl: Point,
    pub br: Point,
}

impl Bbox {
    /// Erstellt eine Box aus `x1, y1, x2, y2`
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            tl: Point::new(x1, y1),
            br: Point::new(x2, y2),
        }
    }

    /// Erstellt eine Bounding Box aus zwei beliebigen Punkten
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            tl: Point::new(a.x.min(b.x), a.y.min(b.y)),
            br: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Box mit Ursprung und Größe
    pub fn from_origin_size(origin: Point, width: f64, height: f64) -> Self {
        Self {
            tl: origin,
            br: Point::new(origin.x + width, origin.y + height),
        }
    }

    /// Erstellt eine Bounding Box die alle Punkte umschließt
    pub fn from_points_iter<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self {
            tl: first,
            br: first,
        };
        for p in iter {
            bbox.union_point(p);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.br.x - self.tl.x
    }

    pub fn height(&self) -> f64 {
        self.br.y - self.tl.y
    }

    pub fn area(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.width() * self.height()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Zentrum der Box in absoluten Koordinaten
    pub fn center(&self) -> Point {
        Point::new(
            self.tl.x + self.width() / 2.0,
            self.tl.y + self.height() / 2.0,
        )
    }

    /// Strikter Enthaltenseinstest (Rand zählt nicht)
    pub fn contains_point(&self, p: Point) -> bool {
        p.x > self.tl.x && p.x < self.br.x && p.y > self.tl.y && p.y < self.br.y
    }

    /// Überschneidung mit positiver Fläche
    pub fn intersects(&self, other: &Bbox) -> bool {
        (other.br.x.min(self.br.x) - other.tl.x.max(self.tl.x)) > 0.0
            && (other.br.y.min(self.br.y) - other.tl.y.max(self.tl.y)) > 0.0
    }

    pub fn union_point(&mut self, p: Point) -> &mut Self {
        self.tl.x = self.tl.x.min(p.x);
        self.tl.y = self.tl.y.min(p.y);
        self.br.x = self.br.x.max(p.x);
        self.br.y = self.br.y.max(p.y);
        self
    }

    /// Vereinigung; eine leere Box übernimmt die andere, eine leere andere wird ignoriert.
    pub fn union(&mut self, other: &Bbox) -> &mut Self {
        if self.is_empty() {
            *self = *other;
        } else if !other.is_empty() {
            self.tl.x = self.tl.x.min(other.tl.x);
            self.tl.y = self.tl.y.min(other.tl.y);
            self.br.x = self.br.x.max(other.br.x);
            self.br.y = self.br.y.max(other.br.y);
        }
        self
    }

    pub fn unioned(mut self, other: &Bbox) -> Self {
        self.union(other);
        self
    }

    pub fn offset(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.tl.offset(dx, dy);
        self.br.offset(dx, dy);
        self
    }

    pub fn grow(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.tl.x -= dx;
        self.br.x += dx;
        self.tl.y -= dy;
        self.br.y += dy;
        self
    }

    /// Gleichmäßig vergrößerte Kopie
    pub fn grown(mut self, margin: f64) -> Self {
        self.grow(margin, margin);
        self
    }

    pub fn shrink(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.grow(-dx, -dy)
    }

    pub fn shrunk(mut self, margin: f64) -> Self {
        self.shrink(margin, margin);
        self
    }

    /// Skaliert Lage und Größe um den Faktor; der Mittelpunkt wird mitskaliert.
    pub fn scale(&mut self, factor: f64) -> &mut Self {
        let pos = self.center().scaled(factor);
        let half_w = self.width() * factor / 2.0;
        let half_h = self.height() * factor / 2.0;
        self.tl = Point::new(pos.x - half_w, pos.y - half_h);
        self.br = Point::new(pos.x + half_w, pos.y + half_h);
        self
    }

    /// Rundet nach außen auf ganze Pixel
    pub fn quantize(&mut self) -> &mut Self {
        self.tl.x = self.tl.x.floor();
        self.tl.y = self.tl.y.floor();
        self.br.x = self.br.x.ceil();
        self.br.y = self.br.y.ceil();
        self
    }

    pub fn quantized(mut self) -> Self {
        self.quantize();
        self
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{tl:{},br:{}}}", self.tl, self.br)
    }
}
