// src/math/geometry/polygon.rs

use super::side::{Side, SideId};
use crate::math::error::{MathError, MathResult};
use crate::math::types::{Bbox, Point, PointKey};
use crate::render::{StrokeStyle, Surface};
use geo::{Contains, LineString};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Stützstellen pro Bezier-Segment beim Abflachen für Treffertests
const FLATTEN_STEPS: usize = 8;

/// Geschlossener Umriss eines Teils als zyklische Folge von Seiten.
///
/// `centroid` ist relativ zur oberen linken Ecke der Bounding Box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PolygonRecord", into = "PolygonRecord")]
pub struct Polygon {
    sides: Vec<Side>,
    bbox: Bbox,
    centroid: Point,
}

impl Polygon {
    /// Erstellt einen Umriss; die erste Seite beginnt den Pfad.
    pub fn new(mut sides: Vec<Side>) -> Self {
        if let Some(first) = sides.first_mut() {
            first.moveto = true;
        }
        let mut polygon = Self {
            sides,
            bbox: Bbox::default(),
            centroid: Point::ZERO,
        };
        polygon.recalc();
        polygon
    }

    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    pub fn side_ids(&self) -> impl Iterator<Item = SideId> + '_ {
        self.sides.iter().map(|s| s.id)
    }

    pub fn bbox(&self) -> &Bbox {
        &self.bbox
    }

    pub fn centroid(&self) -> Point {
        self.centroid
    }

    pub fn absolute_centroid(&self) -> Point {
        self.centroid.offsetted(self.bbox.tl.x, self.bbox.tl.y)
    }

    pub fn intersects(&self, bbox: &Bbox) -> bool {
        self.bbox.intersects(bbox)
    }

    pub fn offset(&mut self, dx: f64, dy: f64) {
        for side in &mut self.sides {
            side.offset(dx, dy);
        }
        self.bbox.offset(dx, dy);
    }

    /// Verschiebt den Umriss so, dass sein Schwerpunkt auf `(x, y)` liegt.
    pub fn move_to(&mut self, x: f64, y: f64) {
        let c = self.absolute_centroid();
        self.offset(x - c.x, y - c.y);
    }

    pub fn rotate(&mut self, angle: f64, x0: f64, y0: f64) {
        let (sin, cos) = angle.sin_cos();
        for side in &mut self.sides {
            side.rotate_about(x0, y0, cos, sin);
        }
        self.recalc();
    }

    /// Skaliert den Umriss um den Ursprung; der Schwerpunkt wird mitskaliert.
    pub fn scale(&mut self, factor: f64) {
        for side in &mut self.sides {
            side.scale(factor);
        }
        self.recalc();
    }

    /// Fläche und Schwerpunkt nach Paul Bourke
    pub fn recalc(&mut self) {
        let mut bbox = Bbox::default();
        let (mut area, mut cx, mut cy) = (0.0, 0.0, 0.0);
        for side in &self.sides {
            bbox.union(side.bbox());
            let (a, b) = (side.pt_a, side.pt_b);
            let f = a.x * b.y - b.x * a.y;
            cx += (a.x + b.x) * f;
            cy += (a.y + b.y) * f;
            area += f;
        }
        area /= 2.0;
        let f = area * 6.0;
        self.centroid = if f != 0.0 {
            Point::new(cx / f - bbox.tl.x, cy / f - bbox.tl.y)
        } else {
            Point::ZERO
        };
        self.bbox = bbox;
    }

    /// Verschmilzt weitere Umrisse mit diesem.
    ///
    /// Seiten, deren Gegenseite ebenfalls im Pool liegt, sind nun innen und
    /// entfallen; der Rest wird über Endpunkt-Schlüssel neu verkettet. Bleibt
    /// keine Seite übrig, wird der Umriss nicht verändert.
    pub fn merge(&mut self, others: &[&Polygon]) -> MathResult<()> {
        // Pool in Einfügereihenfolge, Gegenseiten löschen sich aus
        let mut pool: Vec<Option<&Side>> = Vec::new();
        let mut index: HashMap<SideId, usize> = HashMap::new();
        let all = self
            .sides
            .iter()
            .chain(others.iter().flat_map(|p| p.sides.iter()));
        for side in all {
            if let Some(slot) = index.remove(&-side.id) {
                pool[slot] = None;
            } else {
                index.insert(side.id, pool.len());
                pool.push(Some(side));
            }
        }

        let mut unpool: BTreeMap<PointKey, VecDeque<Side>> = BTreeMap::new();
        for side in pool.into_iter().flatten() {
            unpool
                .entry(side.pt_a.to_key())
                .or_default()
                .push_back(side.clone());
        }
        if unpool.is_empty() {
            return Err(MathError::DegenerateMerge {
                polygons: others.len() + 1,
            });
        }

        let mut sides = Vec::new();
        while let Some(start) = unpool.keys().next().copied() {
            let Some(mut side) = take_from(&mut unpool, start) else {
                continue;
            };
            side.moveto = true;
            loop {
                let key = side.pt_b.to_key();
                sides.push(side);
                let Some(next) = take_from(&mut unpool, key) else {
                    break;
                };
                side = next;
                side.moveto = false;
            }
        }
        self.sides = sides;
        self.recalc();
        Ok(())
    }

    /// Baut den geschlossenen Pfad auf der Oberfläche auf.
    pub fn trace_path(&self, surface: &mut dyn Surface) {
        if self.sides.is_empty() {
            return;
        }
        surface.begin_path();
        for side in &self.sides {
            if side.moveto {
                surface.move_to(side.pt_a);
            } else {
                surface.line_to(side.pt_a);
            }
            side.trace(surface);
        }
        surface.close_path();
    }

    /// Hell/dunkel versetzte Konturen für einen leichten 3D-Eindruck
    pub fn draw_3d_edge(&self, surface: &mut dyn Surface) {
        surface.save();
        surface.translate(0.5, 0.5);
        self.trace_path(surface);
        surface.stroke(&StrokeStyle::solid("#fff8", 1.5));
        surface.translate(-1.0, -1.0);
        self.trace_path(surface);
        surface.stroke(&StrokeStyle::solid("#0007", 1.5));
        surface.restore();
    }

    /// Abgeflachte Teilpfade; jede `moveto`-Seite beginnt einen neuen Ring.
    pub fn rings(&self) -> Vec<Vec<Point>> {
        let mut rings: Vec<Vec<Point>> = Vec::new();
        for side in &self.sides {
            if side.moveto || rings.is_empty() {
                rings.push(vec![side.pt_a]);
            }
            if let Some(ring) = rings.last_mut() {
                side.flatten(FLATTEN_STEPS, ring);
            }
        }
        rings
    }

    /// Exakter Treffertest gegen die Kurvenkontur (gerade-ungerade Regel)
    pub fn contains_point(&self, p: Point) -> bool {
        if !self.bbox.contains_point(p) {
            return false;
        }
        let target = geo::Point::new(p.x, p.y);
        let hits = self
            .rings()
            .into_iter()
            .filter(|ring| ring.len() >= 3)
            .filter(|ring| {
                let line: LineString<f64> = ring.iter().map(|q| (q.x, q.y)).collect();
                geo::Polygon::new(line, vec![]).contains(&target)
            })
            .count();
        hits % 2 == 1
    }
}

fn take_from(unpool: &mut BTreeMap<PointKey, VecDeque<Side>>, key: PointKey) -> Option<Side> {
    let queue = unpool.get_mut(&key)?;
    let side = queue.pop_front();
    if queue.is_empty() {
        unpool.remove(&key);
    }
    side
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PolygonRecord {
    sides: Vec<Side>,
}

impl From<PolygonRecord> for Polygon {
    fn from(record: PolygonRecord) -> Self {
        let mut polygon = Polygon {
            sides: record.sides,
            bbox: Bbox::default(),
            centroid: Point::ZERO,
        };
        polygon.recalc();
        polygon
    }
}

impl From<Polygon> for PolygonRecord {
    fn from(polygon: Polygon) -> Self {
        PolygonRecord {
            sides: polygon.sides,
        }
    }
}
