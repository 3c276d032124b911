// src/math/geometry/side.rs

use super::attachment::Attachment;
use crate::math::error::{MathError, MathResult};
use crate::math::types::{Bbox, Point};
use crate::render::Surface;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vorzeichenbehaftete Seiten-ID; zwei zusammengehörige Seiten teilen `|id|`.
pub type SideId = i32;

/// Konkrete Kante eines Teile-Umrisses von `pt_a` nach `pt_b`.
///
/// Die transformierte Kurve und die Bounding Box sind abgeleitet und werden
/// nach jeder Lageänderung über [`Side::recalc`] neu berechnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SideRecord", into = "SideRecord")]
pub struct Side {
    pub id: SideId,
    pub pt_a: Point,
    pub pt_b: Point,
    /// Außenkante des gesamten Puzzles
    pub edge: bool,
    /// Beginnt einen neuen Teilpfad
    pub moveto: bool,
    pub attachable: bool,
    normalized: Attachment,
    attachment: Attachment,
    bbox: Bbox,
}

impl Side {
    pub fn new(id: SideId, pt_a: Point, pt_b: Point, normalized: Attachment, edge: bool) -> Self {
        let mut side = Self {
            id,
            pt_a,
            pt_b,
            edge,
            moveto: false,
            attachable: normalized.attachable,
            normalized,
            attachment: Attachment::new(Vec::new(), false),
            bbox: Bbox::default(),
        };
        side.recalc();
        side
    }

    /// Gegenstück derselben physischen Kante: negierte ID, vertauschte
    /// Endpunkte, gespiegelte Kurve.
    pub fn complement(&self) -> Self {
        let mut side = Self::new(
            -self.id,
            self.pt_b,
            self.pt_a,
            self.normalized.complement(),
            self.edge,
        );
        side.moveto = self.moveto;
        side
    }

    pub fn is_mate_of(&self, other: &Side) -> bool {
        self.id + other.id == 0
    }

    pub fn normalized(&self) -> &Attachment {
        &self.normalized
    }

    /// Auf die Kante transformierte Kurve, relativ zu `pt_a`
    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn bbox(&self) -> &Bbox {
        &self.bbox
    }

    pub fn offset(&mut self, dx: f64, dy: f64) {
        self.pt_a.offset(dx, dy);
        self.pt_b.offset(dx, dy);
        self.bbox.offset(dx, dy);
    }

    pub fn rotate_about(&mut self, x0: f64, y0: f64, cos: f64, sin: f64) {
        self.pt_a.rotate_about(x0, y0, cos, sin);
        self.pt_b.rotate_about(x0, y0, cos, sin);
        self.recalc();
    }

    /// Skaliert beide Endpunkte um den Ursprung.
    pub fn scale(&mut self, factor: f64) {
        self.pt_a.scale(factor);
        self.pt_b.scale(factor);
        self.recalc();
    }

    /// Leitet Kurve und Bounding Box aus Endpunkten und normierter Kurve ab.
    pub fn recalc(&mut self) {
        self.attachment = self.normalized.transform(self.pt_a, self.pt_b);
        let mut bbox = self.attachment.bbox();
        bbox.offset(self.pt_a.x, self.pt_a.y);
        // Eine Kante ist mindestens ein Pixel breit bzw. hoch
        if bbox.width() == 0.0 {
            if self.pt_a.y < self.pt_b.y {
                bbox.tl.x -= 1.0;
            } else {
                bbox.br.x += 1.0;
            }
        } else if bbox.height() == 0.0 {
            if self.pt_a.x < self.pt_b.x {
                bbox.br.y += 1.0;
            } else {
                bbox.tl.y -= 1.0;
            }
        }
        self.bbox = bbox;
    }

    pub fn trace(&self, surface: &mut dyn Surface) {
        self.attachment.trace(surface, self.pt_a, self.pt_b);
    }

    pub fn flatten(&self, steps: usize, out: &mut Vec<Point>) {
        self.attachment.flatten(self.pt_a, self.pt_b, steps, out);
    }
}

/// Persistierte Form einer Seite; abgeleitete Daten werden beim Laden neu berechnet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SideRecord {
    id: SideId,
    edge: bool,
    pt_a: Point,
    pt_b: Point,
    #[serde(default)]
    moveto: bool,
    attachment_normalized: Attachment,
}

impl From<SideRecord> for Side {
    fn from(record: SideRecord) -> Self {
        let mut side = Side::new(
            record.id,
            record.pt_a,
            record.pt_b,
            record.attachment_normalized,
            record.edge,
        );
        side.moveto = record.moveto;
        side
    }
}

impl From<Side> for SideRecord {
    fn from(side: Side) -> Self {
        SideRecord {
            id: side.id,
            edge: side.edge,
            pt_a: side.pt_a,
            pt_b: side.pt_b,
            moveto: side.moveto,
            attachment_normalized: side.normalized,
        }
    }
}

// ===================================================================================
// Seiten-Register
// ===================================================================================

#[derive(Debug, Clone)]
struct SidePair {
    primary: Side,
    mate: Option<Side>,
}

/// Ordnet jeder absoluten Seiten-ID ihre ein bis zwei konkreten Seiten zu.
#[derive(Debug, Clone, Default)]
pub struct SideRegistry {
    entries: BTreeMap<u32, SidePair>,
}

impl SideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baut das Register aus allen Seiten einer Menge von Umrissen auf.
    pub fn from_sides<'a, I>(sides: I) -> MathResult<Self>
    where
        I: IntoIterator<Item = &'a Side>,
    {
        let mut registry = Self::new();
        for side in sides {
            match registry.entries.get_mut(&side.id.unsigned_abs()) {
                None => registry.register(side.clone())?,
                Some(pair) => {
                    if pair.mate.is_some() || !pair.primary.is_mate_of(side) {
                        return Err(duplicate(side.id));
                    }
                    pair.mate = Some(side.clone());
                }
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, side: Side) -> MathResult<()> {
        let key = side.id.unsigned_abs();
        if side.id == 0 || self.entries.contains_key(&key) {
            return Err(duplicate(side.id));
        }
        self.entries.insert(
            key,
            SidePair {
                primary: side,
                mate: None,
            },
        );
        Ok(())
    }

    /// Erzeugt und registriert das Gegenstück zur Seite `id`.
    pub fn complement(&mut self, id: SideId) -> MathResult<Side> {
        let pair = self
            .entries
            .get_mut(&id.unsigned_abs())
            .ok_or(MathError::UnknownSide(id))?;
        if pair.mate.is_some() {
            return Err(duplicate(-pair.primary.id));
        }
        let mate = pair.primary.complement();
        pair.mate = Some(mate.clone());
        Ok(mate)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Jede absolute ID hat genau eine oder zwei Seiten mit entgegengesetztem Vorzeichen.
    pub fn is_consistent(&self) -> bool {
        self.entries.iter().all(|(key, pair)| {
            pair.primary.id.unsigned_abs() == *key
                && pair
                    .mate
                    .as_ref()
                    .is_none_or(|m| m.is_mate_of(&pair.primary))
        })
    }
}

fn duplicate(id: SideId) -> MathError {
    MathError::SideOverused(id)
}
