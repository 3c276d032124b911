// src/math/tesselation/mod.rs

pub mod hexagon;
pub mod square;
pub mod voronoi;

use crate::math::error::{MathError, MathResult};
use crate::math::probability::SeedResource;
use crate::math::types::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub use voronoi::BoundedVoronoi;

pub type TileId = u32;
pub type EdgeId = u32;

/// Eingabe für eine Tesselation in Bett-Koordinaten (Ursprung oben links).
#[derive(Debug, Clone, PartialEq)]
pub struct TesselationParams {
    pub bed_width: f64,
    pub bed_height: f64,
    pub num_rows: usize,
    pub num_cols: usize,
    pub piece_width: f64,
    pub piece_height: f64,
    /// Verzerrung der Saatpunkte in `[0, 9]`
    pub distortion: f64,
}

impl TesselationParams {
    pub fn new(bed_width: f64, bed_height: f64, num_rows: usize, num_cols: usize) -> Self {
        let num_rows = num_rows.max(1);
        let num_cols = num_cols.max(1);
        Self {
            bed_width,
            bed_height,
            num_rows,
            num_cols,
            piece_width: bed_width / num_cols as f64,
            piece_height: bed_height / num_rows as f64,
            distortion: 0.0,
        }
    }

    pub fn with_distortion(mut self, distortion: f64) -> Self {
        self.distortion = distortion.clamp(0.0, 9.0);
        self
    }

    pub fn validate(&self) -> MathResult<()> {
        if !(self.bed_width > 0.0 && self.bed_height > 0.0) {
            return Err(MathError::InvalidBed {
                width: self.bed_width,
                height: self.bed_height,
            });
        }
        if self.num_rows * self.num_cols < 2 {
            return Err(MathError::TooFewSeeds {
                expected: 2,
                actual: self.num_rows * self.num_cols,
            });
        }
        Ok(())
    }

    /// Maximale Verschiebung eines Saatpunktes in x und y
    pub(crate) fn wobble_range(&self) -> (f64, f64) {
        let factor = self.distortion / 9.0 * 0.5;
        (self.piece_width * factor, self.piece_height * factor)
    }

    pub(crate) fn wobble(&self, mut pt: Point, rng: &mut SeedResource) -> Point {
        let (var_x, var_y) = self.wobble_range();
        pt.x += (rng.next_f64() * var_x - 0.25).round();
        pt.y += (rng.next_f64() * var_y - 0.25).round();
        pt
    }
}

/// Verweis einer Kachel auf eine Kante; `flip` kehrt die gespeicherte Richtung um.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEdge {
    pub edge_id: EdgeId,
    pub flip: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub edges: Vec<TileEdge>,
}

/// Deduplizierte Kante mit den ein bis zwei angrenzenden Kacheln.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TessEdge {
    pub id: EdgeId,
    pub a: Point,
    pub b: Point,
    pub tiles: Vec<TileId>,
}

impl TessEdge {
    /// Grenzt nur an eine Kachel, liegt also auf dem Rand des Puzzles
    pub fn is_boundary(&self) -> bool {
        self.tiles.len() == 1
    }

    /// Endpunkte in der Laufrichtung der Kachel
    pub fn endpoints(&self, flip: bool) -> (Point, Point) {
        if flip { (self.b, self.a) } else { (self.a, self.b) }
    }
}

/// Ergebnis einer Tesselation: Kacheln und geteilte Kanten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tesselation {
    pub tiles: BTreeMap<TileId, Tile>,
    pub edges: BTreeMap<EdgeId, TessEdge>,
}

type EdgeKey = ((i64, i64), (i64, i64));

impl Tesselation {
    /// Baut Kacheln und Kantentabelle aus den gerundeten Zellumrissen.
    ///
    /// Kanten kürzer als ein Pixel werden verworfen.
    pub fn from_cells(cells: &[Vec<Point>]) -> Self {
        let mut tess = Tesselation::default();
        let mut by_key: BTreeMap<EdgeKey, EdgeId> = BTreeMap::new();
        let mut next_tile: TileId = 1;

        for ring in cells {
            if ring.len() < 3 {
                continue;
            }
            let tile_id = next_tile;
            next_tile += 1;
            let mut refs = Vec::with_capacity(ring.len());
            for (i, &a) in ring.iter().enumerate() {
                let b = ring[(i + 1) % ring.len()];
                if a.distance(b) < 1.0 {
                    continue;
                }
                let (ka, kb) = (a.to_key(), b.to_key());
                let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
                if let Some(&edge_id) = by_key.get(&key) {
                    if let Some(edge) = tess.edges.get_mut(&edge_id) {
                        edge.tiles.push(tile_id);
                        refs.push(TileEdge {
                            edge_id,
                            flip: edge.a.to_key() != ka,
                        });
                    }
                    continue;
                }
                let edge_id = tess.edges.len() as EdgeId + 1;
                by_key.insert(key, edge_id);
                tess.edges.insert(
                    edge_id,
                    TessEdge {
                        id: edge_id,
                        a,
                        b,
                        tiles: vec![tile_id],
                    },
                );
                refs.push(TileEdge {
                    edge_id,
                    flip: false,
                });
            }
            tess.tiles.insert(
                tile_id,
                Tile {
                    id: tile_id,
                    edges: refs,
                },
            );
        }
        tess
    }

    pub fn boundary_edge_count(&self) -> usize {
        self.edges.values().filter(|e| e.is_boundary()).count()
    }

    /// Jede Kante wird von genau einer oder zwei Kacheln referenziert.
    pub fn is_consistent(&self) -> bool {
        let mut refs: BTreeMap<EdgeId, usize> = BTreeMap::new();
        for tile in self.tiles.values() {
            for r in &tile.edges {
                *refs.entry(r.edge_id).or_default() += 1;
            }
        }
        self.edges.values().all(|e| {
            let n = refs.get(&e.id).copied().unwrap_or(0);
            n == e.tiles.len() && (n == 1 || n == 2)
        })
    }
}

/// Verfügbare Schnittmuster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cut {
    #[default]
    Square,
    Hexagon,
}

impl Cut {
    pub const ALL: [Cut; 2] = [Cut::Square, Cut::Hexagon];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cut| cut.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Cut::Square => "square",
            Cut::Hexagon => "hexagon",
        }
    }

    /// Erzeugt Saatpunkte nach dem Schnittmuster und zerlegt das Bett.
    pub fn tesselate(
        &self,
        params: &TesselationParams,
        rng: &mut SeedResource,
    ) -> MathResult<Tesselation> {
        params.validate()?;
        let seeds = match self {
            Cut::Square => square::create_seeds(params, rng),
            Cut::Hexagon => hexagon::create_seeds(params, rng),
        };
        let cells = BoundedVoronoi::new(params.bed_width, params.bed_height).compute(&seeds)?;
        let tess = Tesselation::from_cells(&cells);
        if tess.tiles.is_empty() {
            return Err(MathError::EmptyTesselation);
        }
        debug!(
            "{} tesselation: {} tiles, {} edges ({} on the boundary)",
            self.name(),
            tess.tiles.len(),
            tess.edges.len(),
            tess.boundary_edge_count()
        );
        Ok(tess)
    }
}
