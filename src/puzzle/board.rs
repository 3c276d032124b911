// src/puzzle/board.rs

use super::bed::PuzzleBed;
use super::config::PuzzleConfig;
use super::details::PuzzleDetails;
use super::error::{PuzzleError, PuzzleResult};
use super::image::ImageLoader;
use super::part::{DrawContext, PartId, PieceId, PuzzlePart};
use super::piece::{PuzzlePiece, RotationSteps};
use super::preview::PuzzlePreview;
use super::snapshot::PuzzleSnapshot;
use super::visibility::Visibility;
use crate::math::error::{MathError, MathResult};
use crate::math::geometry::{Attachment, AttachmentRandomizer, Polygon, Side, SideId, SideRegistry};
use crate::math::probability::SeedResource;
use crate::math::tesselation::{EdgeId, Tesselation};
use crate::math::types::{Bbox, Point};
use crate::math::utils::comparison::epsilon_eq;
use crate::render::{FillStyle, RasterImage, Surface};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Deckkraft des Hintergrundmusters über der Hintergrundfarbe
const PATTERN_ALPHA: f64 = 0.08;

// ===================================================================================
// 1. Zustand und ID-Vergabe
// ===================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PuzzleState {
    #[default]
    Uninitialized,
    Preparing,
    Solving,
    Solved,
}

/// Vergibt Seiten- und Teile-IDs fortlaufend pro Puzzle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdAllocator {
    next_side: SideId,
    next_piece: PieceId,
}

impl IdAllocator {
    pub fn next_side(&mut self) -> SideId {
        self.next_side += 1;
        self.next_side
    }

    pub fn next_piece(&mut self) -> PieceId {
        self.next_piece += 1;
        self.next_piece
    }
}

/// Vollständig aufgebautes Puzzle, das erst bei Erfolg übernommen wird.
struct Prepared {
    config: PuzzleConfig,
    image_url: String,
    source_image: RasterImage,
    working_image: RasterImage,
    background_pattern: Option<RasterImage>,
    details: PuzzleDetails,
    bed: PuzzleBed,
    preview: PuzzlePreview,
    pieces: BTreeMap<PieceId, PuzzlePiece>,
    ids: IdAllocator,
    rng: SeedResource,
}

// ===================================================================================
// 2. Puzzle
// ===================================================================================

/// Besitzt alle Teile, den Zeichenstapel und die Konfiguration eines Puzzles.
///
/// Der Zeichenstapel ist von unten nach oben geordnet: das Bett zuerst, dann
/// alle aktiven Teile, die Vorschau zuletzt. Interaktive Operationen melden
/// Erfolg als `bool` und sammeln den betroffenen Bereich für [`Puzzle::redraw`].
pub struct Puzzle {
    config: PuzzleConfig,
    image_url: String,
    source_image: Option<RasterImage>,
    working_image: RasterImage,
    background_pattern: Option<RasterImage>,
    details: PuzzleDetails,
    bed: PuzzleBed,
    preview: PuzzlePreview,
    pieces: BTreeMap<PieceId, PuzzlePiece>,
    composites: BTreeSet<PieceId>,
    drawing_stack: Vec<PartId>,
    total_pieces: usize,
    ids: IdAllocator,
    rng: SeedResource,
    state: PuzzleState,
    visibility: Visibility,
    pending: Option<Bbox>,
    full_redraw: bool,
    canvas_width: f64,
    canvas_height: f64,
}

impl Puzzle {
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        let working_image = RasterImage::new("", 0, 0);
        Self {
            config: PuzzleConfig::default(),
            image_url: String::new(),
            source_image: None,
            preview: PuzzlePreview::new(&working_image),
            working_image,
            background_pattern: None,
            details: PuzzleDetails::default(),
            bed: PuzzleBed::new(Point::new(canvas_width / 2.0, canvas_height / 2.0), 0.0, 0.0),
            pieces: BTreeMap::new(),
            composites: BTreeSet::new(),
            drawing_stack: Vec::new(),
            total_pieces: 0,
            ids: IdAllocator::default(),
            rng: SeedResource::default(),
            state: PuzzleState::default(),
            visibility: Visibility::default(),
            pending: None,
            full_redraw: true,
            canvas_width,
            canvas_height,
        }
    }

    // ----- Zugriff -----

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    pub fn details(&self) -> &PuzzleDetails {
        &self.details
    }

    pub fn state(&self) -> PuzzleState {
        self.state
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn working_image(&self) -> &RasterImage {
        &self.working_image
    }

    pub fn canvas_bbox(&self) -> Bbox {
        Bbox::new(0.0, 0.0, self.canvas_width, self.canvas_height)
    }

    pub fn is_prepared(&self) -> bool {
        !self.drawing_stack.is_empty()
    }

    pub fn drawing_stack(&self) -> &[PartId] {
        &self.drawing_stack
    }

    pub fn bed(&self) -> &PuzzleBed {
        &self.bed
    }

    pub fn preview(&self) -> &PuzzlePreview {
        &self.preview
    }

    /// Aktive (nicht aufgenommene) Teile
    pub fn pieces(&self) -> impl Iterator<Item = &PuzzlePiece> {
        self.pieces.values()
    }

    pub fn piece(&self, id: PieceId) -> Option<&PuzzlePiece> {
        self.pieces.get(&id)
    }

    /// Das aktive Teil, das das Ursprungsteil `member` enthält
    pub fn piece_of(&self, member: PieceId) -> Option<PieceId> {
        self.pieces
            .values()
            .find(|p| p.id() == member || p.composite().is_some_and(|c| c.contains(&member)))
            .map(PuzzlePiece::id)
    }

    pub fn num_pieces(&self) -> usize {
        self.pieces.len()
    }

    pub fn total_pieces(&self) -> usize {
        self.total_pieces
    }

    pub fn composites(&self) -> impl Iterator<Item = &PuzzlePiece> {
        self.composites.iter().filter_map(|id| self.pieces.get(id))
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn part(&self, id: PartId) -> Option<&dyn PuzzlePart> {
        if !self.is_prepared() {
            return None;
        }
        match id {
            PartId::Bed => Some(&self.bed),
            PartId::Preview => Some(&self.preview),
            PartId::Piece(pid) => self.pieces.get(&pid).map(|p| p as &dyn PuzzlePart),
        }
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut dyn PuzzlePart> {
        if !self.is_prepared() {
            return None;
        }
        match id {
            PartId::Bed => Some(&mut self.bed),
            PartId::Preview => Some(&mut self.preview),
            PartId::Piece(pid) => self.pieces.get_mut(&pid).map(|p| p as &mut dyn PuzzlePart),
        }
    }

    // ----- Vorbereitung -----

    /// Lädt das Bild, zerlegt es und baut alle Teile neu auf.
    ///
    /// Eine leere URL verwendet das zuletzt geladene Bild. Bei einem Fehler
    /// bleibt der bisherige Zustand vollständig erhalten.
    pub fn prepare_puzzle(
        &mut self,
        config: PuzzleConfig,
        image_url: &str,
        loader: &dyn ImageLoader,
    ) -> PuzzleResult<()> {
        let url = if image_url.is_empty() {
            self.image_url.clone()
        } else {
            image_url.to_string()
        };
        if url.is_empty() {
            return Err(PuzzleError::MissingImage);
        }

        let previous = self.state;
        self.state = PuzzleState::Preparing;
        match self.build(config.validated(), url, loader) {
            Ok(prepared) => {
                self.install(prepared);
                self.state = PuzzleState::Solving;
                Ok(())
            }
            Err(e) => {
                warn!("Puzzle preparation failed: {}", e);
                self.state = previous;
                Err(e)
            }
        }
    }

    fn build(
        &self,
        mut config: PuzzleConfig,
        image_url: String,
        loader: &dyn ImageLoader,
    ) -> PuzzleResult<Prepared> {
        let source_image = loader.decode(&image_url)?;
        let seed = config.seed.unwrap_or_else(rand::random);
        config.seed = Some(seed);
        let mut rng = SeedResource::from_seed(seed);

        let mut details =
            PuzzleDetails::new(self.canvas_width, self.canvas_height, &source_image, &config);
        details.compute_sizes(false);
        info!(
            "Puzzle '{}': bed {:.1}x{:.1}, {}x{} cells of {:.1}x{:.1}, seed {}",
            image_url,
            details.bed_width,
            details.bed_height,
            details.num_cols,
            details.num_rows,
            details.piece_width,
            details.piece_height,
            seed
        );

        let params = details.tesselation_params(config.distortion);
        let tesselation = config.cut_style().tesselate(&params, &mut rng)?;
        let mut ids = IdAllocator::default();
        let pieces = create_pieces(&tesselation, &details, &config, &mut ids, &mut rng)?;
        if pieces.len() < 2 {
            return Err(MathError::TooFewSeeds {
                expected: 2,
                actual: pieces.len(),
            }
            .into());
        }

        let working_image = source_image.scaled_to(details.bed_width, details.bed_height);
        let center = Point::new(self.canvas_width / 2.0, self.canvas_height / 2.0);
        let bed = PuzzleBed::new(center, details.bed_width, details.bed_height);
        let mut preview = PuzzlePreview::new(&working_image);
        preview.set_display_pos(center);
        let background_pattern = self.cached_or_load_pattern(&config.background_pattern, loader);

        Ok(Prepared {
            config,
            image_url,
            source_image,
            working_image,
            background_pattern,
            details,
            bed,
            preview,
            pieces,
            ids,
            rng,
        })
    }

    fn install(&mut self, prepared: Prepared) {
        self.drawing_stack = std::iter::once(PartId::Bed)
            .chain(prepared.pieces.keys().map(|id| PartId::Piece(*id)))
            .chain(std::iter::once(PartId::Preview))
            .collect();
        self.total_pieces = prepared.pieces.len();
        self.config = prepared.config;
        self.image_url = prepared.image_url;
        self.source_image = Some(prepared.source_image);
        self.working_image = prepared.working_image;
        self.background_pattern = prepared.background_pattern;
        self.details = prepared.details;
        self.bed = prepared.bed;
        self.preview = prepared.preview;
        self.pieces = prepared.pieces;
        self.composites.clear();
        self.ids = prepared.ids;
        self.rng = prepared.rng;
        self.visibility = Visibility::default();
        self.invalidate_all();
        info!("Puzzle prepared with {} pieces", self.total_pieces);
    }

    fn cached_or_load_pattern(&self, pattern: &str, loader: &dyn ImageLoader) -> Option<RasterImage> {
        if pattern.is_empty() {
            return None;
        }
        if pattern == self.config.background_pattern && self.background_pattern.is_some() {
            return self.background_pattern.clone();
        }
        match loader.decode(pattern) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Background pattern ignored: {}", e);
                None
            }
        }
    }

    // ----- Mischen -----

    /// Verteilt alle sichtbaren Einzelteile auf die Ränder um das Bett.
    ///
    /// Die bis zu vier Randstreifen werden nach Fläche gewichtet, damit die
    /// Dichte überall gleich ist. Ist mehr als ein Drehschritt erlaubt, wird
    /// auch die Drehung zufällig gewählt.
    pub fn shuffle(&mut self) -> bool {
        if self.pieces.len() <= 1 {
            return false;
        }
        let (cw, ch) = (self.canvas_width, self.canvas_height);
        let bw = ((cw - self.details.bed_width) / 2.0).round();
        let bh = ((ch - self.details.bed_height) / 2.0).round();
        let mw = (self.details.piece_width / 2.0).ceil() + 1.0;
        let mh = (self.details.piece_height / 2.0).ceil() + 1.0;

        let bands = if bw > bh {
            [
                Bbox::new(bw, 0.0, cw - bw, bh),
                Bbox::new(cw - bw, 0.0, cw, ch),
                Bbox::new(bw, ch - bh, cw - bw, ch),
                Bbox::new(0.0, 0.0, bw, ch),
            ]
        } else {
            [
                Bbox::new(0.0, 0.0, cw, bh),
                Bbox::new(cw - bw, bh, cw, ch - bh),
                Bbox::new(0.0, ch - bh, cw, ch),
                Bbox::new(0.0, bh, bw, ch - bh),
            ]
        };
        let mut regions: Vec<(f64, f64, Bbox)> = Vec::with_capacity(bands.len());
        let mut extent = 0.0;
        for mut band in bands {
            band.shrink(mw, mh);
            if band.is_empty() {
                continue;
            }
            let area = band.area();
            regions.push((extent, extent + area, band));
            extent += area;
        }
        if regions.is_empty() {
            debug!("Shuffle refused: no room around the bed");
            return false;
        }

        let order: Vec<PieceId> = self.drawing_stack.iter().filter_map(PartId::piece).collect();
        for id in order {
            let Some(piece) = self.pieces.get_mut(&id) else {
                continue;
            };
            if piece.is_hidden() || piece.is_composite() {
                continue;
            }
            let mut linear = self.rng.next_f64() * extent;
            for (low, high, band) in &regions {
                if linear > *high {
                    continue;
                }
                linear -= low;
                let x = band.tl.x + (linear % band.width()).round();
                let y = band.tl.y + (linear / band.width()).round();
                piece.set_display_pos(Point::new(x, y));
                let steps = piece.rotation().count() as usize;
                if steps > 1 {
                    piece.set_angle_step(self.rng.next_index(steps) as i64);
                }
                break;
            }
        }
        self.shuffle_z();
        debug!("Shuffled {} pieces", self.pieces.len());
        true
    }

    /// Mischt die Reihenfolge der Teile im Stapel; Bett und Vorschau bleiben.
    pub fn shuffle_z(&mut self) {
        let Some(low) = self.drawing_stack.iter().position(|p| p.is_piece()) else {
            return;
        };
        let high = self
            .drawing_stack
            .iter()
            .rposition(|p| !p.is_piece())
            .filter(|&h| h > low)
            .unwrap_or(self.drawing_stack.len());
        self.rng.shuffle(&mut self.drawing_stack[low..high]);
        self.invalidate_all();
    }

    // ----- Einrasten -----

    /// Versucht, das Teil `id` an passende Nachbarn anzudocken.
    ///
    /// Nach jeder Verschmelzung wird mit dem vereinigten Teil erneut gesucht,
    /// sodass ein Ablegen mehrere Verbindungen auf einmal schließen kann.
    pub fn snap_piece(&mut self, id: PieceId) -> bool {
        let snap_distance = self.config.snap_distance;
        let mut target = id;
        let mut merged = false;

        loop {
            let Some(moving) = self.pieces.remove(&target) else {
                break;
            };
            let mut absorbed_by = None;
            for part in &self.drawing_stack {
                let Some(pid) = part.piece() else {
                    continue;
                };
                let Some(candidate) = self.pieces.get_mut(&pid) else {
                    continue;
                };
                if candidate.is_hidden() {
                    continue;
                }
                let Some((dx, dy)) = candidate.find_snap_offset(&moving, snap_distance) else {
                    continue;
                };
                match candidate.absorb(&moving, dx, dy) {
                    Ok(()) => {
                        absorbed_by = Some(pid);
                        break;
                    }
                    Err(e) => debug!("Merge of {} into {} refused: {}", target, pid, e),
                }
            }

            let Some(pid) = absorbed_by else {
                self.pieces.insert(target, moving);
                break;
            };
            debug!("Piece {} snapped into {}", target, pid);
            self.composites.remove(&target);
            self.composites.insert(pid);
            self.drawing_stack.retain(|p| *p != PartId::Piece(target));
            target = pid;
            merged = true;
        }

        if !merged {
            return false;
        }
        self.snap_part_to_bed(target);
        self.invalidate_all();
        if self.is_solved() {
            self.state = PuzzleState::Solved;
            info!("Puzzle solved");
        }
        true
    }

    /// Richtet die Randkanten eines Teils am Bett aus.
    ///
    /// Nur bei Drehungen um ein Vielfaches von 45 Grad.
    pub fn snap_part_to_bed(&mut self, id: PieceId) -> bool {
        if !self.is_prepared() {
            return false;
        }
        let bed = self.bed.bbox();
        let snap = self.config.snap_distance;
        let Some(piece) = self.pieces.get_mut(&id) else {
            return false;
        };
        if piece.angle_degrees() % 45 != 0 {
            debug!("Bed snap of {} refused at {} degrees", id, piece.angle_degrees());
            return false;
        }

        let before = piece.display_bbox();
        let (mut dx, mut dy) = (None, None);
        for side in piece.display().sides().iter().filter(|s| s.edge) {
            let Bbox { tl: a, br: b } = *side.bbox();
            if dx.is_none() && (a.x - b.x).abs() < 1.1 {
                if epsilon_eq(a.x, before.tl.x) && (a.x - bed.tl.x).abs() <= snap {
                    dx = Some(bed.tl.x - a.x);
                } else if epsilon_eq(b.x, before.br.x) && (b.x - bed.br.x).abs() <= snap {
                    dx = Some(bed.br.x - b.x);
                }
            } else if dy.is_none() && (a.y - b.y).abs() < 1.1 {
                if epsilon_eq(a.y, before.tl.y) && (a.y - bed.tl.y).abs() <= snap {
                    dy = Some(bed.tl.y - a.y);
                } else if epsilon_eq(b.y, before.br.y) && (b.y - bed.br.y).abs() <= snap {
                    dy = Some(bed.br.y - b.y);
                }
            }
            if dx.is_some() && dy.is_some() {
                break;
            }
        }
        if dx.is_none() && dy.is_none() {
            return false;
        }
        let pos = piece.display_pos();
        piece.set_display_pos(pos.offsetted(dx.unwrap_or(0.0), dy.unwrap_or(0.0)));
        let after = piece.display_bbox();
        self.invalidate(before.unioned(&after));
        true
    }

    /// Genau ein Kompositum, das alle Ursprungsteile enthält
    pub fn is_solved(&self) -> bool {
        if self.composites.len() != 1 {
            return false;
        }
        self.composites()
            .next()
            .is_some_and(|p| p.members().len() == self.total_pieces)
    }

    // ----- Interaktion -----

    /// Verschiebt ein Teil auf `(x, y)`, begrenzt auf den Canvas.
    pub fn move_part(&mut self, id: PartId, x: f64, y: f64) -> bool {
        if id == PartId::Bed {
            return false;
        }
        let canvas = self.canvas_bbox();
        let Some(part) = self.part_mut(id) else {
            return false;
        };
        let before = part.display_bbox();
        let mut pos = Point::new(x, y);
        pos.confine(&canvas);
        part.set_display_pos(pos);
        let edge = part.is_edge();
        if let (true, Some(pid)) = (edge, id.piece()) {
            self.snap_part_to_bed(pid);
        }
        let after = self.part(id).map_or(before, |p| p.display_bbox());
        self.invalidate(before.unioned(&after));
        true
    }

    pub fn rotate_piece(&mut self, id: PieceId, delta: i64) -> bool {
        let Some(piece) = self.pieces.get_mut(&id) else {
            return false;
        };
        let before = piece.display_bbox();
        if !piece.rotate_by(delta) {
            return false;
        }
        let after = piece.display_bbox();
        self.invalidate(before.unioned(&after));
        true
    }

    /// Oberstes sichtbares Teil unter `p`
    pub fn part_under_point(&self, p: Point) -> Option<PartId> {
        self.drawing_stack.iter().rev().copied().find(|id| {
            self.part(*id)
                .is_some_and(|part| !part.is_hidden() && part.contains_point(p))
        })
    }

    /// Legt ein Teil direkt unter die Vorschau.
    pub fn send_top(&mut self, id: PartId) -> bool {
        if !id.is_piece() {
            return false;
        }
        let Some(index) = self.drawing_stack.iter().position(|p| *p == id) else {
            return false;
        };
        if index + 2 >= self.drawing_stack.len() {
            return false;
        }
        self.drawing_stack.remove(index);
        let at = self
            .drawing_stack
            .iter()
            .rposition(|p| !p.is_piece())
            .unwrap_or(self.drawing_stack.len());
        self.drawing_stack.insert(at, id);
        self.invalidate_part(id);
        true
    }

    /// Legt ein Teil direkt über das Bett.
    pub fn send_back(&mut self, id: PartId) -> bool {
        if !id.is_piece() {
            return false;
        }
        let Some(index) = self.drawing_stack.iter().position(|p| *p == id) else {
            return false;
        };
        if self.drawing_stack.iter().position(|p| p.is_piece()) == Some(index) {
            return false;
        }
        self.drawing_stack.remove(index);
        let at = self
            .drawing_stack
            .iter()
            .position(|p| p.is_piece())
            .unwrap_or_else(|| {
                self.drawing_stack
                    .iter()
                    .take_while(|p| **p == PartId::Bed)
                    .count()
            });
        self.drawing_stack.insert(at, id);
        self.invalidate_part(id);
        true
    }

    /// Blendet Teile nach Filter aus; `grabbed` bleibt immer sichtbar.
    pub fn set_visibility(&mut self, visibility: Visibility, grabbed: Option<PartId>) {
        self.visibility = visibility;
        for piece in self.pieces.values_mut() {
            let hide = grabbed != Some(piece.part_id())
                && visibility.hides(piece.is_edge(), piece.is_composite());
            piece.set_hidden(hide);
        }
        self.invalidate_all();
    }

    /// Zeigt oder verbirgt die Vorschau; ohne Argument wird umgeschaltet.
    pub fn toggle_preview(&mut self, show: Option<bool>) -> bool {
        if !self.is_prepared() {
            return false;
        }
        let hide = !show.unwrap_or(self.preview.is_hidden());
        if hide == self.preview.is_hidden() {
            return false;
        }
        self.preview.set_hidden(hide);
        self.invalidate_all();
        true
    }

    /// Setzt Hintergrundfarbe und optionales Muster.
    ///
    /// Kann das Muster nicht geladen werden, bleibt alles unverändert.
    pub fn set_background(
        &mut self,
        color: &str,
        pattern: &str,
        loader: &dyn ImageLoader,
    ) -> PuzzleResult<()> {
        let image = if pattern.is_empty() {
            None
        } else if pattern == self.config.background_pattern && self.background_pattern.is_some() {
            self.background_pattern.clone()
        } else {
            Some(loader.decode(pattern)?)
        };
        self.config.background_color = color.to_string();
        self.config.background_pattern = pattern.to_string();
        self.background_pattern = image;
        self.invalidate_all();
        Ok(())
    }

    // ----- Zeichnen -----

    fn background_fill(&self) -> FillStyle {
        match &self.background_pattern {
            Some(image) => FillStyle::Pattern {
                image: image.clone(),
                base_color: self.config.background_color.clone(),
                alpha: PATTERN_ALPHA,
            },
            None => FillStyle::color(self.config.background_color.clone()),
        }
    }

    /// Zeichnet Hintergrund und Stapel; mit `clip` nur den betroffenen Bereich.
    ///
    /// Liefert die Anzahl gezeichneter Teile.
    pub fn draw(&self, surface: &mut dyn Surface, clip: Option<Bbox>) -> usize {
        let clip = clip.map(|c| c.grown(1.0).quantized());
        surface.save();
        let backdrop = match clip {
            Some(region) => {
                surface.begin_path();
                surface.rect(&region);
                surface.clip();
                region
            }
            None => self.canvas_bbox(),
        };
        surface.fill_rect(&backdrop, &self.background_fill());

        let ctx = DrawContext {
            working_image: &self.working_image,
            background_color: &self.config.background_color,
        };
        let mut drawn = 0;
        for id in &self.drawing_stack {
            let Some(part) = self.part(*id) else {
                continue;
            };
            if part.is_hidden() || clip.is_some_and(|c| !part.intersects(&c)) {
                continue;
            }
            part.draw(surface, &ctx);
            drawn += 1;
        }
        surface.restore();
        drawn
    }

    /// Zeichnet alles seit dem letzten Aufruf Angefallene in einem Durchgang.
    pub fn redraw(&mut self, surface: &mut dyn Surface) -> usize {
        if std::mem::take(&mut self.full_redraw) {
            self.pending = None;
            return self.draw(surface, None);
        }
        match self.pending.take() {
            Some(region) => self.draw(surface, Some(region)),
            None => 0,
        }
    }

    pub fn invalidate(&mut self, region: Bbox) {
        self.pending = Some(match self.pending {
            Some(pending) => pending.unioned(&region),
            None => region,
        });
    }

    pub fn invalidate_all(&mut self) {
        self.full_redraw = true;
    }

    fn invalidate_part(&mut self, id: PartId) {
        if let Some(region) = self.part(id).map(|p| p.display_bbox()) {
            self.invalidate(region);
        }
    }

    // ----- Größenänderung -----

    /// Passt Bett, Teile und Positionen an eine neue Canvas-Größe an.
    ///
    /// Zeilen und Spalten bleiben erhalten; Verbindungen bleiben bestehen.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if width == self.canvas_width && height == self.canvas_height {
            return false;
        }
        let Some(source) = self.source_image.as_ref().filter(|_| self.is_prepared()) else {
            self.canvas_width = width;
            self.canvas_height = height;
            return true;
        };

        let mut details = self.details.clone();
        details.canvas_width = width;
        details.canvas_height = height;
        details.compute_sizes(true);
        let part_scale = details.bed_width / self.details.bed_width;
        if !(part_scale.is_finite() && part_scale > 0.0 && details.bed_height > 0.0) {
            debug!("Resize to {}x{} refused", width, height);
            return false;
        }
        let pos_scale_x = width / self.canvas_width / part_scale;
        let pos_scale_y = height / self.canvas_height / part_scale;

        let working = source.scaled_to(details.bed_width, details.bed_height);
        self.details = details;
        self.canvas_width = width;
        self.canvas_height = height;
        self.working_image = working.clone();

        let canvas = self.canvas_bbox();
        for id in self.drawing_stack.clone() {
            let Some(part) = self.part_mut(id) else {
                continue;
            };
            part.resize(part_scale, &working);
            let mut pos = part.display_pos();
            pos.x *= pos_scale_x;
            pos.y *= pos_scale_y;
            pos.confine(&canvas);
            part.set_display_pos(pos);
        }
        info!("Puzzle resized to {}x{} (scale {:.3})", width, height, part_scale);
        self.invalidate_all();
        true
    }

    // ----- Persistenz -----

    pub fn serialize(&self) -> PuzzleResult<PuzzleSnapshot> {
        if !self.is_prepared() {
            return Err(PuzzleError::NotPrepared);
        }
        Ok(PuzzleSnapshot {
            config: self.config.clone(),
            image_url: self.image_url.clone(),
            details: self.details.clone(),
            bed: self.bed.record(),
            preview: self.preview.record(),
            pieces: self.pieces.values().map(PuzzlePiece::record).collect(),
            composites: self.composites.iter().copied().collect(),
            drawing_stack: self.drawing_stack.iter().filter_map(PartId::piece).collect(),
            total_pieces: self.total_pieces,
            ids: self.ids.clone(),
        })
    }

    /// Baut ein Puzzle aus einem Snapshot wieder auf.
    ///
    /// Unbekannte IDs im Zeichenstapel oder in den Komposita werden
    /// übersprungen; Teile, die im Stapel fehlen, werden oben angefügt.
    pub fn deserialize(snapshot: PuzzleSnapshot, loader: &dyn ImageLoader) -> PuzzleResult<Self> {
        let PuzzleSnapshot {
            config,
            image_url,
            details,
            bed,
            preview,
            pieces: records,
            composites,
            drawing_stack,
            total_pieces,
            ids,
        } = snapshot;
        if image_url.is_empty() {
            return Err(PuzzleError::MissingImage);
        }
        let mut config = config.validated();
        let source_image = loader.decode(&image_url)?;

        let mut pieces = BTreeMap::new();
        for record in records {
            if pieces.contains_key(&record.id) {
                warn!("Duplicate piece {} in snapshot skipped", record.id);
                continue;
            }
            let piece = PuzzlePiece::from_record(record);
            pieces.insert(piece.id(), piece);
        }
        if pieces.is_empty() {
            return Err(PuzzleError::InvalidSnapshot("no pieces".to_string()));
        }
        SideRegistry::from_sides(pieces.values().flat_map(|p| p.source().sides()))
            .map_err(|e| PuzzleError::InvalidSnapshot(e.to_string()))?;

        let mut composite_ids = BTreeSet::new();
        for id in composites {
            if pieces.get(&id).is_some_and(|p| p.is_composite()) {
                composite_ids.insert(id);
            } else {
                warn!("Unknown composite {} in snapshot skipped", id);
            }
        }

        let mut stack = vec![PartId::Bed];
        let mut placed = BTreeSet::new();
        for id in drawing_stack {
            if pieces.contains_key(&id) && placed.insert(id) {
                stack.push(PartId::Piece(id));
            } else {
                warn!("Drawing stack entry {} has no piece, skipped", id);
            }
        }
        for id in pieces.keys() {
            if !placed.contains(id) {
                warn!("Piece {} missing from drawing stack, appended", id);
                stack.push(PartId::Piece(*id));
            }
        }
        stack.push(PartId::Preview);

        let seed = config.seed.unwrap_or_else(rand::random);
        config.seed = Some(seed);
        let total_pieces = if total_pieces > 0 {
            total_pieces
        } else {
            pieces.values().map(|p| p.members().len()).sum()
        };

        let mut puzzle = Puzzle::new(details.canvas_width, details.canvas_height);
        puzzle.background_pattern = puzzle.cached_or_load_pattern(&config.background_pattern, loader);
        puzzle.working_image = source_image.scaled_to(details.bed_width, details.bed_height);
        puzzle.source_image = Some(source_image);
        puzzle.bed = PuzzleBed::from_record(&bed);
        puzzle.preview = PuzzlePreview::from_record(&preview);
        puzzle.pieces = pieces;
        puzzle.composites = composite_ids;
        puzzle.drawing_stack = stack;
        puzzle.total_pieces = total_pieces;
        puzzle.ids = ids;
        puzzle.rng = SeedResource::from_seed(seed);
        puzzle.config = config;
        puzzle.image_url = image_url;
        puzzle.details = details;
        puzzle.state = if puzzle.is_solved() {
            PuzzleState::Solved
        } else {
            PuzzleState::Solving
        };
        info!(
            "Puzzle restored: {} active pieces, {} composites",
            puzzle.pieces.len(),
            puzzle.composites.len()
        );
        Ok(puzzle)
    }

    pub fn to_json(&self) -> PuzzleResult<String> {
        self.serialize()?.to_json()
    }

    pub fn from_json(json: &str, loader: &dyn ImageLoader) -> PuzzleResult<Self> {
        Self::deserialize(PuzzleSnapshot::from_json(json)?, loader)
    }
}

// ===================================================================================
// 3. Teile aus der Tesselation
// ===================================================================================

/// Setzt jede Kachel aus konkreten Seiten zusammen.
///
/// Eine Kante wird beim ersten Besuch als Seite angelegt, die zweite Kachel
/// erhält ihr Gegenstück. Randkanten bleiben gerade.
fn create_pieces(
    tesselation: &Tesselation,
    details: &PuzzleDetails,
    config: &PuzzleConfig,
    ids: &mut IdAllocator,
    rng: &mut SeedResource,
) -> MathResult<BTreeMap<PieceId, PuzzlePiece>> {
    let min_distance = (details.piece_width * 0.4)
        .min(details.piece_height * 0.4)
        .max(details.min_piece_size * 0.25);
    let randomizer = AttachmentRandomizer::new(config.attachment_style().stock())
        .with_min_distance(min_distance);
    let rotation = RotationSteps::new(config.num_rotate_steps);
    let offset = details.bed_offset();

    let mut registry = SideRegistry::new();
    let mut by_edge: BTreeMap<EdgeId, SideId> = BTreeMap::new();
    let mut pieces = BTreeMap::new();

    for tile in tesselation.tiles.values() {
        let mut sides = Vec::with_capacity(tile.edges.len());
        let mut has_edge = false;
        for r in &tile.edges {
            if let Some(&side_id) = by_edge.get(&r.edge_id) {
                sides.push(registry.complement(side_id)?);
                continue;
            }
            let edge = tesselation
                .edges
                .get(&r.edge_id)
                .ok_or(MathError::UnknownEdge {
                    tile: tile.id,
                    edge: r.edge_id,
                })?;
            let boundary = edge.is_boundary();
            has_edge |= boundary;
            let normalized = if boundary {
                Attachment::straight()
            } else {
                randomizer.randomize(edge.a, edge.b, rng)
            };
            let (a, b) = edge.endpoints(r.flip);
            let side = Side::new(ids.next_side(), a, b, normalized, boundary);
            by_edge.insert(r.edge_id, side.id);
            registry.register(side.clone())?;
            sides.push(side);
        }
        if sides.len() < 3 {
            warn!("Tile {} has only {} sides, skipped", tile.id, sides.len());
            continue;
        }
        let outline = Polygon::new(sides);
        let pos = outline.absolute_centroid().offsetted(offset.x, offset.y);
        let id = ids.next_piece();
        pieces.insert(id, PuzzlePiece::new(id, outline, has_edge, rotation, pos));
    }
    debug!(
        "Created {} pieces from {} sides (min tab distance {:.1})",
        pieces.len(),
        registry.len(),
        min_distance
    );
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::image::StaticImageLoader;
    use crate::render::{DrawOp, RecordingSurface};
    use approx::assert_relative_eq;

    fn loader() -> StaticImageLoader {
        StaticImageLoader::new()
            .with_image("square.png", 400, 400)
            .with_image("photo.jpg", 400, 300)
            .with_image("tile.png", 32, 32)
    }

    fn two_by_two(width: f64, height: f64, rotate_steps: u32) -> Puzzle {
        let mut puzzle = Puzzle::new(width, height);
        let config = PuzzleConfig::new()
            .with_num_pieces(4)
            .with_distortion(0.0)
            .with_rotate_steps(rotate_steps)
            .with_seed(7);
        puzzle
            .prepare_puzzle(config, "square.png", &loader())
            .unwrap();
        puzzle
    }

    fn solved_pos(puzzle: &Puzzle, id: PieceId) -> Point {
        let offset = puzzle.details().bed_offset();
        let piece = puzzle.piece(id).expect("active piece");
        piece.source().absolute_centroid().offsetted(offset.x, offset.y)
    }

    /// Verteilt die Teile so weit auseinander, dass nichts einrasten kann.
    fn scatter(puzzle: &mut Puzzle, spots: &[(f64, f64)]) {
        let ids: Vec<PieceId> = puzzle.pieces().map(PuzzlePiece::id).collect();
        for (id, (x, y)) in ids.into_iter().zip(spots) {
            assert!(puzzle.move_part(PartId::Piece(id), *x, *y));
        }
    }

    const CORNERS: [(f64, f64); 4] = [(100.0, 100.0), (700.0, 100.0), (100.0, 500.0), (700.0, 500.0)];

    /// Ein Teil, das mit `id` eine einrastbare Kante teilt
    fn neighbor_of(puzzle: &Puzzle, id: PieceId) -> PieceId {
        let piece = puzzle.piece(id).expect("piece");
        puzzle
            .pieces()
            .find(|other| {
                other.id() != id
                    && other.source().sides().iter().any(|s| {
                        s.attachable && piece.source().sides().iter().any(|t| t.is_mate_of(s))
                    })
            })
            .map(PuzzlePiece::id)
            .expect("neighbor")
    }

    fn place_solved(puzzle: &mut Puzzle, id: PieceId, dx: f64, dy: f64) {
        let pos = solved_pos(puzzle, id);
        assert!(puzzle.move_part(PartId::Piece(id), pos.x + dx, pos.y + dy));
    }

    fn permutations(items: &[PieceId]) -> Vec<Vec<PieceId>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_prepare_builds_stack_and_state() {
        let puzzle = two_by_two(800.0, 600.0, 1);
        assert_eq!(puzzle.state(), PuzzleState::Solving);
        assert_eq!(puzzle.num_pieces(), 4);
        assert_eq!(puzzle.total_pieces(), 4);
        let stack = puzzle.drawing_stack();
        assert_eq!(stack.len(), 6);
        assert_eq!(stack[0], PartId::Bed);
        assert_eq!(stack[5], PartId::Preview);
        assert!(puzzle.pieces().all(|p| p.is_edge()));
        assert_eq!(puzzle.config().seed, Some(7));
        // Teile starten an ihrer Zielposition
        for piece in puzzle.pieces() {
            let target = solved_pos(&puzzle, piece.id());
            assert_relative_eq!(piece.display_pos().x, target.x, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_same_seed_same_puzzle() {
        let a = two_by_two(800.0, 600.0, 1).serialize().unwrap();
        let b = two_by_two(800.0, 600.0, 1).serialize().unwrap();
        assert_eq!(a.pieces, b.pieces);
    }

    #[test]
    fn test_prepare_errors_keep_previous_state() {
        let mut puzzle = Puzzle::new(800.0, 600.0);
        assert!(matches!(
            puzzle.prepare_puzzle(PuzzleConfig::new(), "", &loader()),
            Err(PuzzleError::MissingImage)
        ));
        assert_eq!(puzzle.state(), PuzzleState::Uninitialized);
        assert!(matches!(puzzle.serialize(), Err(PuzzleError::NotPrepared)));

        let mut puzzle = two_by_two(800.0, 600.0, 1);
        let before = puzzle.serialize().unwrap();
        let result = puzzle.prepare_puzzle(PuzzleConfig::new(), "missing.png", &loader());
        assert!(matches!(result, Err(PuzzleError::ImageDecode { .. })));
        assert_eq!(puzzle.state(), PuzzleState::Solving);
        assert_eq!(puzzle.image_url(), "square.png");
        assert_eq!(puzzle.serialize().unwrap(), before);

        // Leere URL verwendet das vorige Bild
        let config = PuzzleConfig::new().with_num_pieces(9).with_seed(1);
        puzzle.prepare_puzzle(config, "", &loader()).unwrap();
        assert_eq!(puzzle.image_url(), "square.png");
        assert_eq!(puzzle.total_pieces(), 9);
    }

    #[test]
    fn test_snap_accepts_within_distance() {
        let mut puzzle = two_by_two(800.0, 600.0, 1);
        scatter(&mut puzzle, &CORNERS);
        let first = 1;
        let other = neighbor_of(&puzzle, first);
        place_solved(&mut puzzle, first, 0.0, 0.0);
        place_solved(&mut puzzle, other, 4.0, -3.0);
        assert!(puzzle.snap_piece(other));
        assert_eq!(puzzle.num_pieces(), 3);
        assert_eq!(puzzle.drawing_stack().len(), 5);
        let composite: Vec<&PuzzlePiece> = puzzle.composites().collect();
        assert_eq!(composite.len(), 1);
        let mut members = composite[0].members();
        members.sort();
        let mut expected = vec![first, other];
        expected.sort();
        assert_eq!(members, expected);
        assert!(!puzzle.is_solved());
    }

    #[test]
    fn test_snap_refused_beyond_distance() {
        let mut puzzle = two_by_two(800.0, 600.0, 1);
        scatter(&mut puzzle, &CORNERS);
        let other = neighbor_of(&puzzle, 1);
        place_solved(&mut puzzle, 1, 0.0, 0.0);
        place_solved(&mut puzzle, other, 25.0, 25.0);
        assert!(!puzzle.snap_piece(other));
        assert_eq!(puzzle.num_pieces(), 4);
        assert_eq!(puzzle.composites().count(), 0);
    }

    #[test]
    fn test_snap_refused_for_unequal_rotation() {
        let mut puzzle = two_by_two(800.0, 600.0, 4);
        scatter(&mut puzzle, &CORNERS);
        let other = neighbor_of(&puzzle, 1);
        place_solved(&mut puzzle, 1, 0.0, 0.0);
        assert!(puzzle.rotate_piece(other, 1));
        place_solved(&mut puzzle, other, 0.0, 0.0);
        assert!(!puzzle.snap_piece(other));

        assert!(puzzle.rotate_piece(other, -1));
        place_solved(&mut puzzle, other, 0.0, 0.0);
        assert!(puzzle.snap_piece(other));
    }

    /// Randseiten, die nach dem Einrasten auf dem Bettrand liegen
    fn sides_on_bed_edge(puzzle: &Puzzle, id: PieceId) -> (bool, bool) {
        let bed = puzzle.bed().bbox();
        let piece = puzzle.piece(id).expect("piece");
        let edges: Vec<Bbox> = piece
            .display()
            .sides()
            .iter()
            .filter(|s| s.edge)
            .map(|s| *s.bbox())
            .collect();
        let on_x = edges
            .iter()
            .any(|b| (b.tl.x - bed.tl.x).abs() < 1e-9 || (b.br.x - bed.br.x).abs() < 1e-9);
        let on_y = edges
            .iter()
            .any(|b| (b.tl.y - bed.tl.y).abs() < 1e-9 || (b.br.y - bed.br.y).abs() < 1e-9);
        (on_x, on_y)
    }

    #[test]
    fn test_bed_snap_requires_aligned_rotation() {
        // Fünf Schritte ergeben 72 Grad und damit keine Ausrichtung auf 45 Grad
        let mut puzzle = two_by_two(800.0, 600.0, 5);
        scatter(&mut puzzle, &CORNERS);
        let id = 1;
        let target = solved_pos(&puzzle, id);

        assert!(puzzle.rotate_piece(id, 1));
        assert_eq!(puzzle.piece(id).unwrap().angle_degrees(), 72);
        place_solved(&mut puzzle, id, 3.0, 3.0);
        let pos = puzzle.piece(id).unwrap().display_pos();
        assert_relative_eq!(pos.x, target.x + 3.0, epsilon = 1e-9);
        assert_relative_eq!(pos.y, target.y + 3.0, epsilon = 1e-9);
        assert!(!puzzle.snap_part_to_bed(id));

        assert!(puzzle.rotate_piece(id, -1));
        place_solved(&mut puzzle, id, 3.0, 3.0);
        let pos = puzzle.piece(id).unwrap().display_pos();
        assert!((pos.x - (target.x + 3.0)).abs() > 1e-9 || (pos.y - (target.y + 3.0)).abs() > 1e-9);
        assert_eq!(sides_on_bed_edge(&puzzle, id), (true, true));
    }

    #[test]
    fn test_bed_snap_ignores_distant_piece() {
        let mut puzzle = two_by_two(800.0, 600.0, 1);
        scatter(&mut puzzle, &CORNERS);
        let id = 1;
        let target = solved_pos(&puzzle, id);
        place_solved(&mut puzzle, id, 30.0, 30.0);
        let pos = puzzle.piece(id).unwrap().display_pos();
        assert_relative_eq!(pos.x, target.x + 30.0, epsilon = 1e-9);
        assert_relative_eq!(pos.y, target.y + 30.0, epsilon = 1e-9);
        assert!(!puzzle.snap_part_to_bed(id));
    }

    #[test]
    fn test_two_by_two_solves_in_any_order() {
        for order in permutations(&[1, 2, 3, 4]) {
            let mut puzzle = two_by_two(800.0, 600.0, 1);
            scatter(&mut puzzle, &CORNERS);
            for member in &order {
                let id = puzzle.piece_of(*member).expect("member is active");
                place_solved(&mut puzzle, id, 0.0, 0.0);
                puzzle.snap_piece(id);
            }
            assert_eq!(puzzle.num_pieces(), 1, "order {order:?}");
            let composite: Vec<&PuzzlePiece> = puzzle.composites().collect();
            assert_eq!(composite.len(), 1);
            assert_eq!(composite[0].members().len(), 4);
            assert!(puzzle.is_solved(), "order {order:?}");
            assert_eq!(puzzle.state(), PuzzleState::Solved);
            assert_eq!(puzzle.drawing_stack().len(), 3);
        }
    }

    #[test]
    fn test_shuffle_places_pieces_around_bed() {
        let mut puzzle = Puzzle::new(800.0, 600.0);
        let config = PuzzleConfig::new().with_num_pieces(50).with_seed(11);
        puzzle.prepare_puzzle(config, "photo.jpg", &loader()).unwrap();
        assert!(puzzle.shuffle());

        let details = puzzle.details().clone();
        let mut keep_out = puzzle.bed().bbox();
        keep_out.grow(details.piece_width / 2.0, details.piece_height / 2.0);
        let canvas = puzzle.canvas_bbox();
        for piece in puzzle.pieces() {
            let p = piece.display_pos();
            let outside = p.x < keep_out.tl.x
                || p.x > keep_out.br.x
                || p.y < keep_out.tl.y
                || p.y > keep_out.br.y;
            assert!(outside, "piece {} at {}", piece.id(), p);
            assert!(canvas.contains_point(p), "piece {} at {}", piece.id(), p);
        }
        let stack = puzzle.drawing_stack();
        assert_eq!(stack.first(), Some(&PartId::Bed));
        assert_eq!(stack.last(), Some(&PartId::Preview));
    }

    #[test]
    fn test_shuffle_randomizes_rotation() {
        let mut puzzle = two_by_two(800.0, 600.0, 4);
        assert!(puzzle.shuffle());
        assert!(puzzle.pieces().all(|p| p.angle_step() < 4));
    }

    #[test]
    fn test_shuffle_rotation_covers_every_step() {
        let mut seen = [0usize; 4];
        for seed in 0..64 {
            let mut puzzle = Puzzle::new(800.0, 600.0);
            let config = PuzzleConfig::new()
                .with_num_pieces(4)
                .with_distortion(0.0)
                .with_rotate_steps(4)
                .with_seed(seed);
            puzzle.prepare_puzzle(config, "square.png", &loader()).unwrap();
            assert!(puzzle.shuffle());
            for piece in puzzle.pieces() {
                seen[piece.angle_step() as usize] += 1;
            }
        }
        // 256 Ziehungen, je Schritt 64 erwartet
        for (step, count) in seen.iter().enumerate() {
            assert!((32..=96).contains(count), "step {step} drawn {count} times: {seen:?}");
        }
    }

    #[test]
    fn test_z_order_keeps_bed_and_preview() {
        let mut puzzle = two_by_two(800.0, 600.0, 1);
        let id = PartId::Piece(1);
        assert!(puzzle.send_top(id));
        let len = puzzle.drawing_stack().len();
        assert_eq!(puzzle.drawing_stack()[len - 2], id);
        assert!(!puzzle.send_top(id));

        assert!(puzzle.send_back(id));
        assert_eq!(puzzle.drawing_stack()[1], id);
        assert!(!puzzle.send_back(id));

        assert!(!puzzle.send_top(PartId::Bed));
        assert!(!puzzle.send_back(PartId::Preview));
        assert!(!puzzle.send_top(PartId::Piece(99)));

        puzzle.shuffle_z();
        assert_eq!(puzzle.drawing_stack()[0], PartId::Bed);
        assert_eq!(puzzle.drawing_stack()[len - 1], PartId::Preview);
        assert_eq!(puzzle.drawing_stack().len(), len);
    }

    #[test]
    fn test_part_under_point_and_preview_toggle() {
        let mut puzzle = two_by_two(800.0, 600.0, 1);
        let center = solved_pos(&puzzle, 1);
        assert_eq!(puzzle.part_under_point(center), Some(PartId::Piece(1)));
        assert_eq!(puzzle.part_under_point(Point::new(2.0, 2.0)), None);

        assert!(puzzle.toggle_preview(None));
        assert!(!puzzle.preview().is_hidden());
        assert!(!puzzle.toggle_preview(Some(true)));
        assert_eq!(puzzle.part_under_point(Point::new(400.0, 300.0)), Some(PartId::Preview));
        assert!(puzzle.toggle_preview(Some(false)));
        assert!(!puzzle.move_part(PartId::Bed, 10.0, 10.0));
    }

    #[test]
    fn test_visibility_spares_grabbed_piece() {
        let mut puzzle = two_by_two(800.0, 600.0, 1);
        scatter(&mut puzzle, &CORNERS);
        let other = neighbor_of(&puzzle, 1);
        place_solved(&mut puzzle, 1, 0.0, 0.0);
        place_solved(&mut puzzle, other, 0.0, 0.0);
        assert!(puzzle.snap_piece(other));
        let loose: Vec<PieceId> = puzzle
            .pieces()
            .filter(|p| !p.is_composite())
            .map(PuzzlePiece::id)
            .collect();
        assert_eq!(loose.len(), 2);

        // Nur Innenteile und Komposita zeigen: lose Randteile verschwinden
        let filter = Visibility::new(false, true, true);
        puzzle.set_visibility(filter, Some(PartId::Piece(loose[0])));
        assert!(!puzzle.piece(loose[0]).unwrap().is_hidden());
        assert!(puzzle.piece(loose[1]).unwrap().is_hidden());
        assert!(puzzle.composites().all(|p| !p.is_hidden()));
        let hidden_spot = puzzle.piece(loose[1]).unwrap().display_pos();
        assert_ne!(puzzle.part_under_point(hidden_spot), Some(PartId::Piece(loose[1])));
    }

    #[test]
    fn test_clipped_redraw_touches_only_dirty_area() {
        let mut puzzle = two_by_two(1600.0, 600.0, 1);
        let ids: Vec<PieceId> = puzzle.pieces().map(PuzzlePiece::id).collect();
        let spots = [(150.0, 300.0), (1450.0, 150.0), (1450.0, 300.0), (1450.0, 450.0)];
        for (id, (x, y)) in ids.iter().zip(spots) {
            puzzle.move_part(PartId::Piece(*id), x, y);
        }

        let mut surface = RecordingSurface::new();
        assert_eq!(puzzle.redraw(&mut surface), 5);
        assert!(surface.clip_rects().is_empty());
        surface.clear();
        assert_eq!(puzzle.redraw(&mut surface), 0);
        assert!(surface.ops.is_empty());

        let moved = ids[0];
        let before = puzzle.piece(moved).unwrap().display_bbox();
        assert!(puzzle.move_part(PartId::Piece(moved), 160.0, 300.0));
        let after = puzzle.piece(moved).unwrap().display_bbox();

        assert_eq!(puzzle.redraw(&mut surface), 1);
        assert_eq!(surface.images_drawn(), 1);
        assert!(surface.is_balanced());
        let clips = surface.clip_rects();
        assert_eq!(clips[0], before.unioned(&after).grown(1.0).quantized());
        let backdrop = surface.count(|op| matches!(op, DrawOp::Fill(_)));
        assert_eq!(backdrop, 1);
    }

    #[test]
    fn test_background_pattern() {
        let mut puzzle = two_by_two(800.0, 600.0, 1);
        assert!(puzzle.set_background("#202020", "nope.png", &loader()).is_err());
        assert_eq!(puzzle.config().background_color, "#797979");

        puzzle.set_background("#202020", "tile.png", &loader()).unwrap();
        let mut surface = RecordingSurface::new();
        puzzle.redraw(&mut surface);
        let pattern = surface.ops.iter().find_map(|op| match op {
            DrawOp::Fill(FillStyle::Pattern { base_color, alpha, .. }) => Some((base_color.clone(), *alpha)),
            _ => None,
        });
        assert_eq!(pattern, Some(("#202020".to_string(), PATTERN_ALPHA)));
    }

    #[test]
    fn test_resize_scales_everything_uniformly() {
        let mut puzzle = two_by_two(800.0, 600.0, 1);
        scatter(&mut puzzle, &CORNERS);
        let other = neighbor_of(&puzzle, 1);
        place_solved(&mut puzzle, 1, 0.0, 0.0);
        place_solved(&mut puzzle, other, 0.0, 0.0);
        assert!(puzzle.snap_piece(other));

        let bed = puzzle.bed().bbox();
        let grid = (puzzle.details().num_rows, puzzle.details().num_cols);
        let before: Vec<(PieceId, Point, f64, Vec<PieceId>)> = puzzle
            .pieces()
            .map(|p| (p.id(), p.display_pos(), p.source().bbox().width(), p.members()))
            .collect();

        assert!(puzzle.resize(1600.0, 1200.0));
        assert!(!puzzle.resize(1600.0, 1200.0));

        let resized = puzzle.bed().bbox();
        assert_relative_eq!(resized.width(), bed.width() * 2.0, epsilon = 1e-9);
        assert_relative_eq!(resized.height(), bed.height() * 2.0, epsilon = 1e-9);
        assert_relative_eq!(resized.center().x, 800.0, epsilon = 1e-9);
        assert_eq!((puzzle.details().num_rows, puzzle.details().num_cols), grid);
        assert_eq!(puzzle.composites().count(), 1);
        for (id, pos, width, members) in before {
            let piece = puzzle.piece(id).expect("piece survives resize");
            assert_relative_eq!(piece.display_pos().x, pos.x * 2.0, epsilon = 1e-6);
            assert_relative_eq!(piece.display_pos().y, pos.y * 2.0, epsilon = 1e-6);
            assert_relative_eq!(piece.source().bbox().width(), width * 2.0, epsilon = 0.05);
            assert_eq!(piece.members(), members);
        }
        assert_eq!(puzzle.working_image().width, puzzle.details().bed_width.round() as u32);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut puzzle = two_by_two(800.0, 600.0, 4);
        scatter(&mut puzzle, &CORNERS);
        let other = neighbor_of(&puzzle, 1);
        place_solved(&mut puzzle, 1, 0.0, 0.0);
        place_solved(&mut puzzle, other, 0.0, 0.0);
        assert!(puzzle.snap_piece(other));
        let loose = puzzle.pieces().find(|p| !p.is_composite()).map(PuzzlePiece::id);
        let loose = loose.expect("loose piece");
        assert!(puzzle.rotate_piece(loose, 3));
        assert!(puzzle.send_back(PartId::Piece(loose)));
        assert!(puzzle.toggle_preview(Some(true)));

        let json = puzzle.to_json().unwrap();
        assert!(json.contains("\"imageURL\""));
        assert!(json.contains("\"drawingStack\""));
        let restored = Puzzle::from_json(&json, &loader()).unwrap();

        assert_eq!(restored.drawing_stack(), puzzle.drawing_stack());
        assert_eq!(restored.config(), puzzle.config());
        assert_eq!(restored.state(), puzzle.state());
        assert!(!restored.preview().is_hidden());
        let original: Vec<PieceId> = puzzle.composites().map(PuzzlePiece::id).collect();
        let copy: Vec<PieceId> = restored.composites().map(PuzzlePiece::id).collect();
        assert_eq!(original, copy);
        for piece in puzzle.pieces() {
            let other = restored.piece(piece.id()).expect("piece restored");
            assert_eq!(other.angle_step(), piece.angle_step());
            assert_eq!(other.members(), piece.members());
            assert_relative_eq!(other.display_pos().x, piece.display_pos().x, epsilon = 1e-6);
            assert_relative_eq!(other.display_pos().y, piece.display_pos().y, epsilon = 1e-6);
        }
        assert_relative_eq!(restored.bed().bbox().tl.x, puzzle.bed().bbox().tl.x, epsilon = 1e-9);
    }

    #[test]
    fn test_restore_skips_unknown_ids() {
        let puzzle = two_by_two(800.0, 600.0, 1);
        let mut snapshot = puzzle.serialize().unwrap();
        let dropped = snapshot.drawing_stack.remove(0);
        snapshot.drawing_stack.push(999);
        snapshot.composites.push(998);

        let restored = Puzzle::deserialize(snapshot, &loader()).unwrap();
        let stack = restored.drawing_stack();
        assert_eq!(stack.len(), 6);
        assert!(!stack.contains(&PartId::Piece(999)));
        assert_eq!(stack[4], PartId::Piece(dropped));
        assert_eq!(restored.composites().count(), 0);
        assert_eq!(restored.state(), PuzzleState::Solving);
    }

    #[test]
    fn test_restore_rejects_duplicated_sides() {
        let puzzle = two_by_two(800.0, 600.0, 1);
        let mut snapshot = puzzle.serialize().unwrap();
        let mut copy = snapshot.pieces[0].clone();
        copy.id = 77;
        snapshot.pieces.push(copy);
        assert!(matches!(
            Puzzle::deserialize(snapshot, &loader()),
            Err(PuzzleError::InvalidSnapshot(_))
        ));
    }
}
