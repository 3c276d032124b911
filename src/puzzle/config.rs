// src/puzzle/config.rs

use crate::math::geometry::AttachmentStyle;
use crate::math::probability::SeedResource;
use crate::math::tesselation::Cut;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Einstellungen eines Puzzles, wie sie auch im Snapshot landen.
///
/// Werte außerhalb der erlaubten Bereiche werden von [`PuzzleConfig::validated`]
/// still geklemmt, unbekannte Namen fallen auf die Standardwerte zurück.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PuzzleConfig {
    pub background_color: String,
    pub background_pattern: String,
    pub cut: String,
    pub attachment: String,
    pub num_pieces: u32,
    pub min_piece_size: f64,
    pub distortion: f64,
    pub num_rotate_steps: u32,
    pub bed_to_canvas_ratio: f64,
    pub snap_distance: f64,
    /// Seed für Tesselation, Kanten und Shuffle; wird beim Vorbereiten festgelegt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            background_color: "#797979".to_string(),
            background_pattern: String::new(),
            cut: Cut::Square.name().to_string(),
            attachment: AttachmentStyle::Classic.name().to_string(),
            num_pieces: 80,
            min_piece_size: 40.0,
            distortion: 2.0,
            num_rotate_steps: 1,
            bed_to_canvas_ratio: 0.5,
            snap_distance: 9.0,
            seed: None,
        }
    }
}

impl PuzzleConfig {
    pub const MIN_PIECES: u32 = 4;
    pub const MAX_PIECES: u32 = 999;
    pub const MAX_DISTORTION: f64 = 9.0;
    pub const MAX_ROTATE_STEPS: u32 = 90;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_pieces(mut self, num_pieces: u32) -> Self {
        self.num_pieces = num_pieces;
        self
    }

    pub fn with_cut(mut self, cut: impl Into<String>) -> Self {
        self.cut = cut.into();
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = attachment.into();
        self
    }

    pub fn with_distortion(mut self, distortion: f64) -> Self {
        self.distortion = distortion;
        self
    }

    pub fn with_rotate_steps(mut self, steps: u32) -> Self {
        self.num_rotate_steps = steps;
        self
    }

    pub fn with_min_piece_size(mut self, size: f64) -> Self {
        self.min_piece_size = size;
        self
    }

    pub fn with_snap_distance(mut self, distance: f64) -> Self {
        self.snap_distance = distance;
        self
    }

    pub fn with_bed_to_canvas_ratio(mut self, ratio: f64) -> Self {
        self.bed_to_canvas_ratio = ratio;
        self
    }

    pub fn with_background(mut self, color: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.background_color = color.into();
        self.background_pattern = pattern.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Seed aus einer Zahl oder, falls keine, aus dem Hash des Textes.
    pub fn with_seed_phrase(self, phrase: &str) -> Self {
        let seed = phrase
            .trim()
            .parse::<u64>()
            .unwrap_or_else(|_| SeedResource::from_text(phrase).seed);
        self.with_seed(seed)
    }

    /// Klemmt alle Werte in ihre Bereiche und normalisiert die Namen.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        match Cut::from_name(&self.cut) {
            Some(cut) => self.cut = cut.name().to_string(),
            None => {
                warn!("Unknown cut '{}', using '{}'", self.cut, defaults.cut);
                self.cut = defaults.cut.clone();
            }
        }
        match AttachmentStyle::from_name(&self.attachment) {
            Some(style) => self.attachment = style.name().to_string(),
            None => {
                warn!(
                    "Unknown attachment '{}', using '{}'",
                    self.attachment, defaults.attachment
                );
                self.attachment = defaults.attachment.clone();
            }
        }
        self.num_pieces = self.num_pieces.clamp(Self::MIN_PIECES, Self::MAX_PIECES);
        self.distortion = clamp_or(self.distortion, 0.0, Self::MAX_DISTORTION, defaults.distortion);
        self.num_rotate_steps = self.num_rotate_steps.clamp(1, Self::MAX_ROTATE_STEPS);
        self.bed_to_canvas_ratio =
            clamp_or(self.bed_to_canvas_ratio, 0.05, 1.0, defaults.bed_to_canvas_ratio);
        self.snap_distance = clamp_or(self.snap_distance, 0.0, f64::MAX, defaults.snap_distance);
        self.min_piece_size = clamp_or(self.min_piece_size, 1.0, f64::MAX, defaults.min_piece_size);
        self
    }

    pub fn cut_style(&self) -> Cut {
        Cut::from_name(&self.cut).unwrap_or_default()
    }

    pub fn attachment_style(&self) -> AttachmentStyle {
        AttachmentStyle::from_name(&self.attachment).unwrap_or_default()
    }
}

/// NaN fällt auf den Standardwert zurück
fn clamp_or(value: f64, low: f64, high: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(low, high)
    }
}
