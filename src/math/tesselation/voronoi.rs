// src/math/tesselation/voronoi.rs

use crate::math::{
    error::{MathError, MathResult},
    types::{Point, SpadePoint},
    utils::constants::WELD_TOLERANCE,
};
use spade::{DelaunayTriangulation, Triangulation};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Voronoi-Zerlegung eines Rechtecks `[0, width] x [0, height]`.
///
/// Jede Zelle entsteht, indem das Rechteck an den Mittelsenkrechten zu allen
/// Delaunay-Nachbarn des Saatpunktes beschnitten wird (Sutherland-Hodgman
/// gegen Halbebenen). Anschließend werden nahe Eckpunkte zellübergreifend
/// verschweißt und auf ganze Pixel gerundet, sodass benachbarte Zellen ihre
/// gemeinsamen Kanten mit identischen Koordinaten beschreiben.
#[derive(Debug, Clone, Copy)]
pub struct BoundedVoronoi {
    width: f64,
    height: f64,
}

impl BoundedVoronoi {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zellen in Reihenfolge der Saatpunkte; doppelte Saatpunkte liefern keine Zelle.
    pub fn compute(&self, seeds: &[Point]) -> MathResult<Vec<Vec<Point>>> {
        if seeds.len() < 2 {
            return Err(MathError::TooFewSeeds {
                expected: 2,
                actual: seeds.len(),
            });
        }

        let mut triangulation: DelaunayTriangulation<SpadePoint> = DelaunayTriangulation::new();
        let mut handles = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let handle = triangulation
                .insert(SpadePoint::from(*seed))
                .map_err(|e| MathError::TriangulationFailed {
                    reason: format!("{e:?} for seed {seed}"),
                })?;
            handles.push(handle);
        }

        // Bettecken im Uhrzeigersinn (y zeigt nach unten)
        let frame = vec![
            Point::new(0.0, 0.0),
            Point::new(self.width, 0.0),
            Point::new(self.width, self.height),
            Point::new(0.0, self.height),
        ];

        let mut taken = vec![false; triangulation.num_vertices()];
        let mut cells = Vec::with_capacity(seeds.len());
        for (seed, handle) in seeds.iter().zip(&handles) {
            let slot = handle.index();
            if taken[slot] {
                warn!("Duplicate Voronoi seed {} ignored", seed);
                continue;
            }
            taken[slot] = true;

            let vertex = triangulation.vertex(*handle);
            let site = Point::from(vertex.position());
            let mut ring = frame.clone();
            for edge in vertex.out_edges() {
                let neighbor = Point::from(edge.to().position());
                ring = clip_half_plane(&ring, site, neighbor);
                if ring.is_empty() {
                    break;
                }
            }
            cells.push(ring);
        }

        let cells = weld_and_round(cells);
        debug!(
            "Bounded Voronoi: {} seeds -> {} cells in {}x{}",
            seeds.len(),
            cells.len(),
            self.width,
            self.height
        );
        if cells.is_empty() {
            return Err(MathError::EmptyTesselation);
        }
        Ok(cells)
    }
}

/// Behält den Teil des Polygons, der näher an `site` als an `other` liegt.
fn clip_half_plane(ring: &[Point], site: Point, other: Point) -> Vec<Point> {
    let nx = other.x - site.x;
    let ny = other.y - site.y;
    let mx = (site.x + other.x) / 2.0;
    let my = (site.y + other.y) / 2.0;
    let side = |p: Point| (p.x - mx) * nx + (p.y - my) * ny;

    let mut out = Vec::with_capacity(ring.len() + 1);
    for (i, &current) in ring.iter().enumerate() {
        let next = ring[(i + 1) % ring.len()];
        let (dc, dn) = (side(current), side(next));
        if dc <= 0.0 {
            out.push(current);
        }
        if (dc <= 0.0) != (dn <= 0.0) {
            let t = dc / (dc - dn);
            out.push(Point::new(
                current.x + (next.x - current.x) * t,
                current.y + (next.y - current.y) * t,
            ));
        }
    }
    out
}

/// Verschweißt Eckpunkte innerhalb von `WELD_TOLERANCE`, rundet sie und
/// entfernt aufeinanderfolgende Duplikate.
fn weld_and_round(cells: Vec<Vec<Point>>) -> Vec<Vec<Point>> {
    let cell_size = WELD_TOLERANCE;
    let mut grid: HashMap<(i64, i64), Vec<Point>> = HashMap::new();
    let mut canonical = |p: Point| -> Point {
        let gx = (p.x / cell_size).floor() as i64;
        let gy = (p.y / cell_size).floor() as i64;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = grid.get(&(gx + dx, gy + dy)) {
                    if let Some(found) = bucket.iter().find(|q| q.distance(p) <= WELD_TOLERANCE) {
                        return *found;
                    }
                }
            }
        }
        grid.entry((gx, gy)).or_default().push(p);
        p
    };

    cells
        .into_iter()
        .map(|ring| {
            let mut out: Vec<Point> = Vec::with_capacity(ring.len());
            for p in ring {
                let w = canonical(p);
                let q = Point::new(w.x.round(), w.y.round());
                if out.last() != Some(&q) {
                    out.push(q);
                }
            }
            while out.len() > 1 && out.first() == out.last() {
                out.pop();
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_seeds(rows: usize, cols: usize, w: f64, h: f64) -> Vec<Point> {
        let (pw, ph) = (w / cols as f64, h / rows as f64);
        let mut seeds = Vec::new();
        for i in 0..rows {
            for j in 0..cols {
                seeds.push(Point::new(pw / 2.0 + j as f64 * pw, ph / 2.0 + i as f64 * ph));
            }
        }
        seeds
    }

    #[test]
    fn test_regular_grid_produces_rectangles() {
        let cells = BoundedVoronoi::new(200.0, 100.0)
            .compute(&grid_seeds(2, 2, 200.0, 100.0))
            .unwrap();
        assert_eq!(cells.len(), 2 * 2);
        for cell in &cells {
            assert_eq!(cell.len(), 4, "cell {cell:?}");
        }
        assert!(cells[0].contains(&Point::new(0.0, 0.0)));
        assert!(cells[0].contains(&Point::new(100.0, 50.0)));
    }

    #[test]
    fn test_vertices_are_integers_and_inside_bounds() {
        let seeds = vec![
            Point::new(13.0, 17.0),
            Point::new(71.0, 22.0),
            Point::new(40.0, 66.0),
            Point::new(88.0, 91.0),
            Point::new(20.0, 95.0),
        ];
        let cells = BoundedVoronoi::new(100.0, 120.0).compute(&seeds).unwrap();
        assert_eq!(cells.len(), seeds.len());
        for p in cells.iter().flatten() {
            assert_eq!(p.x, p.x.round());
            assert_eq!(p.y, p.y.round());
            assert!((0.0..=100.0).contains(&p.x));
            assert!((0.0..=120.0).contains(&p.y));
        }
    }

    #[test]
    fn test_duplicate_seed_is_skipped() {
        let seeds = vec![
            Point::new(10.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(60.0, 40.0),
        ];
        let cells = BoundedVoronoi::new(100.0, 100.0).compute(&seeds).unwrap();
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_too_few_seeds() {
        let result = BoundedVoronoi::new(10.0, 10.0).compute(&[Point::new(1.0, 1.0)]);
        assert!(matches!(result, Err(MathError::TooFewSeeds { .. })));
    }
}
