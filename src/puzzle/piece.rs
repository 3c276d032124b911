// src/puzzle/piece.rs

use super::part::{DrawContext, PartId, PieceId, PuzzlePart};
use super::snapshot::PieceRecord;
use crate::math::error::MathResult;
use crate::math::geometry::Polygon;
use crate::math::types::{Bbox, Point};
use crate::math::utils::angles::deg_to_rad;
use crate::render::{RasterImage, Surface};
use serde::{Deserialize, Serialize};

// ===================================================================================
// 1. Rotationsschritte
// ===================================================================================

/// Drehraster eines Teils in ganzen Grad.
///
/// Die gewünschte Schrittzahl wird auf `[1, 90]` geklemmt; ein Schritt ist
/// `round(360 / steps)` Grad, die tatsächliche Anzahl `ceil(360 / Schritt)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct RotationSteps {
    requested: u32,
    step_degrees: u32,
    count: u32,
}

impl RotationSteps {
    pub fn new(requested: u32) -> Self {
        let requested = requested.clamp(1, 90);
        let step_degrees = (360.0 / requested as f64).round() as u32;
        Self {
            requested,
            step_degrees,
            count: 360u32.div_ceil(step_degrees),
        }
    }

    pub fn requested(&self) -> u32 {
        self.requested
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn step_degrees(&self) -> u32 {
        self.step_degrees
    }

    /// Beliebigen Schritt in `[0, count)` abbilden
    pub fn normalize(&self, step: i64) -> u32 {
        step.rem_euclid(self.count as i64) as u32
    }

    pub fn degrees(&self, step: u32) -> u32 {
        self.normalize(step as i64) * self.step_degrees
    }
}

impl Default for RotationSteps {
    fn default() -> Self {
        Self::new(1)
    }
}

impl From<u32> for RotationSteps {
    fn from(requested: u32) -> Self {
        Self::new(requested)
    }
}

impl From<RotationSteps> for u32 {
    fn from(steps: RotationSteps) -> Self {
        steps.requested
    }
}

// ===================================================================================
// 2. Teil
// ===================================================================================

/// Zeichenanweisung für den Bildausschnitt eines Teils.
///
/// `dst` und `pivot` sind relativ zur oberen linken Ecke des Anzeige-Umrisses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PieceTile {
    pub src: Bbox,
    pub dst: Bbox,
    pub pivot: Point,
    pub angle: f64,
}

/// Ein (eventuell zusammengesetztes) Puzzleteil.
///
/// Der Quell-Umriss liegt unrotiert in Bettkoordinaten und bestimmt den
/// Bildausschnitt; der Anzeige-Umriss ist um den Quell-Schwerpunkt gedreht
/// und auf die Anzeigeposition verschoben.
#[derive(Debug, Clone)]
pub struct PuzzlePiece {
    id: PieceId,
    hidden: bool,
    edge: bool,
    composite: Option<Vec<PieceId>>,
    source: Polygon,
    display: Polygon,
    rotation: RotationSteps,
    angle_step: u32,
    tile: PieceTile,
}

impl PuzzlePiece {
    /// Erstellt ein Teil, dessen Schwerpunkt auf `pos` liegt.
    pub fn new(id: PieceId, source: Polygon, edge: bool, rotation: RotationSteps, pos: Point) -> Self {
        let mut piece = Self {
            id,
            hidden: false,
            edge,
            composite: None,
            display: source.clone(),
            source,
            rotation,
            angle_step: 0,
            tile: PieceTile::default(),
        };
        piece.recalc();
        piece.set_display_pos(pos);
        piece
    }

    pub fn from_record(record: PieceRecord) -> Self {
        let mut piece = Self::new(
            record.id,
            record.source_polygon,
            record.edge,
            record.num_rotate_steps,
            record.display_pos,
        );
        piece.hidden = record.hidden;
        piece.composite = record.composite.filter(|members| !members.is_empty());
        piece.set_angle_step(record.angle_step as i64);
        piece
    }

    pub fn record(&self) -> PieceRecord {
        PieceRecord {
            id: self.id,
            hidden: self.hidden,
            edge: self.edge,
            composite: self.composite.clone(),
            source_polygon: self.source.clone(),
            angle_step: self.angle_step,
            num_rotate_steps: self.rotation,
            display_pos: self.display_pos(),
        }
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn composite(&self) -> Option<&[PieceId]> {
        self.composite.as_deref()
    }

    /// Alle Ursprungsteile, aus denen dieses Teil besteht
    pub fn members(&self) -> Vec<PieceId> {
        self.composite.clone().unwrap_or_else(|| vec![self.id])
    }

    pub fn source(&self) -> &Polygon {
        &self.source
    }

    pub fn display(&self) -> &Polygon {
        &self.display
    }

    pub fn rotation(&self) -> RotationSteps {
        self.rotation
    }

    pub fn angle_step(&self) -> u32 {
        self.angle_step
    }

    pub fn angle_degrees(&self) -> u32 {
        self.rotation.degrees(self.angle_step)
    }

    pub fn angle_radians(&self) -> f64 {
        deg_to_rad(self.angle_degrees() as f64)
    }

    pub fn set_angle_step(&mut self, step: i64) {
        let step = self.rotation.normalize(step);
        if step != self.angle_step {
            self.angle_step = step;
            self.recalc();
        }
    }

    /// Dreht um `delta` Schritte; `false`, wenn sich die Lage nicht ändert.
    pub fn rotate_by(&mut self, delta: i64) -> bool {
        let before = self.angle_step;
        self.set_angle_step(before as i64 + delta);
        self.angle_step != before
    }

    /// Versatz, um den `other` verschoben werden muss, um an dieses Teil anzudocken.
    ///
    /// Verlangt gleichen Drehschritt, sich überschneidende (um `snap_distance`
    /// vergrößerte) Boxen und ein passendes Seitenpaar innerhalb der Toleranz.
    pub fn find_snap_offset(&self, other: &PuzzlePiece, snap_distance: f64) -> Option<(f64, f64)> {
        if other.id == self.id || other.angle_step != self.angle_step {
            return None;
        }
        if !other.bbox().grown(snap_distance).intersects(&self.bbox()) {
            return None;
        }
        let own = self.display.sides().iter().filter(|s| s.attachable);
        for side in own {
            let mate = other
                .display
                .sides()
                .iter()
                .filter(|s| s.attachable)
                .find(|s| s.is_mate_of(side));
            let Some(mate) = mate else {
                continue;
            };
            let dx = side.pt_b.x - mate.pt_a.x;
            let dy = side.pt_b.y - mate.pt_a.y;
            if dx.abs() <= snap_distance && dy.abs() <= snap_distance {
                return Some((dx, dy));
            }
        }
        None
    }

    /// Nimmt `other`, um `(dx, dy)` verschoben, in dieses Teil auf.
    ///
    /// Die obere linke Ecke der gemeinsamen Box bleibt dabei stehen. Schlägt
    /// das Verschmelzen der Umrisse fehl, bleibt das Teil unverändert.
    pub fn absorb(&mut self, other: &PuzzlePiece, dx: f64, dy: f64) -> MathResult<()> {
        let mut other_bbox = other.bbox();
        other_bbox.offset(dx, dy);
        let tl_before = self.bbox().unioned(&other_bbox).tl;

        let mut source = self.source.clone();
        source.merge(&[&other.source])?;

        let mut members = self.members();
        members.extend(other.members());
        self.composite = Some(members);
        self.edge |= other.edge;
        self.source = source;
        self.recalc();

        let tl_after = self.bbox().tl;
        let pos = self.display_pos();
        self.set_display_pos(pos.offsetted(tl_before.x - tl_after.x, tl_before.y - tl_after.y));
        Ok(())
    }

    /// Leitet Anzeige-Umriss und Bildausschnitt neu ab; die Anzeigeposition bleibt.
    fn recalc(&mut self) {
        let pos = self.display_pos();
        let angle = self.angle_radians();
        let pivot = self.source.absolute_centroid();
        let mut display = self.source.clone();
        if self.angle_step != 0 {
            display.rotate(angle, pivot.x, pivot.y);
        }

        let src = *self.source.bbox();
        let s_centroid = self.source.centroid();
        let t_centroid = display.centroid();
        self.tile = PieceTile {
            src,
            dst: Bbox::from_origin_size(
                Point::new(t_centroid.x - s_centroid.x, t_centroid.y - s_centroid.y),
                src.width(),
                src.height(),
            ),
            pivot: t_centroid,
            angle,
        };
        self.display = display;
        self.set_display_pos(pos);
    }
}

impl PuzzlePart for PuzzlePiece {
    fn part_id(&self) -> PartId {
        PartId::Piece(self.id)
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    fn bbox(&self) -> Bbox {
        *self.display.bbox()
    }

    /// Schwerpunkt des Anzeige-Umrisses
    fn display_pos(&self) -> Point {
        self.display.absolute_centroid()
    }

    fn set_display_pos(&mut self, pos: Point) {
        self.display.move_to(pos.x, pos.y);
    }

    fn contains_point(&self, p: Point) -> bool {
        self.display.contains_point(p)
    }

    fn intersects(&self, bbox: &Bbox) -> bool {
        self.display.intersects(bbox)
    }

    fn resize(&mut self, factor: f64, _working_image: &RasterImage) {
        let pos = self.display_pos().scaled(factor);
        self.source.scale(factor);
        self.recalc();
        self.set_display_pos(pos);
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &DrawContext<'_>) {
        let tl = self.display.bbox().tl;
        surface.save();
        self.display.trace_path(surface);
        surface.clip();

        surface.save();
        surface.translate(tl.x, tl.y);
        if self.angle_step != 0 {
            let pivot = self.tile.pivot;
            surface.translate(pivot.x, pivot.y);
            surface.rotate(self.tile.angle);
            surface.translate(-pivot.x, -pivot.y);
        }
        surface.draw_image(ctx.working_image, &self.tile.src, &self.tile.dst);
        surface.restore();

        self.display.draw_3d_edge(surface);
        surface.restore();
    }

    fn is_edge(&self) -> bool {
        self.edge
    }

    fn is_composite(&self) -> bool {
        self.composite.is_some()
    }
}
