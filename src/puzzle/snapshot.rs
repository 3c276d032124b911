// src/puzzle/snapshot.rs

use super::board::IdAllocator;
use super::config::PuzzleConfig;
use super::details::PuzzleDetails;
use super::error::PuzzleResult;
use super::part::PieceId;
use super::piece::RotationSteps;
use crate::math::geometry::Polygon;
use crate::math::types::{Bbox, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedRecord {
    #[serde(default)]
    pub hidden: bool,
    /// Innere Fläche ohne Linienbreite
    pub bbox: Bbox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRecord {
    #[serde(default)]
    pub hidden: bool,
    pub bbox: Bbox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceRecord {
    pub id: PieceId,
    #[serde(default)]
    pub hidden: bool,
    pub edge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<Vec<PieceId>>,
    pub source_polygon: Polygon,
    #[serde(default)]
    pub angle_step: u32,
    #[serde(default)]
    pub num_rotate_steps: RotationSteps,
    pub display_pos: Point,
}

/// Vollständiger, serialisierbarer Zustand eines Puzzles.
///
/// Rasterbilder sind nicht enthalten; sie werden beim Wiederherstellen aus
/// `image_url` neu geladen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleSnapshot {
    pub config: PuzzleConfig,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub details: PuzzleDetails,
    pub bed: BedRecord,
    pub preview: PreviewRecord,
    pub pieces: Vec<PieceRecord>,
    /// IDs der zusammengesetzten Teile
    pub composites: Vec<PieceId>,
    /// Teile-IDs von unten nach oben
    pub drawing_stack: Vec<PieceId>,
    #[serde(default)]
    pub total_pieces: usize,
    #[serde(default)]
    pub ids: IdAllocator,
}

impl PuzzleSnapshot {
    pub fn to_json(&self) -> PuzzleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PuzzleResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::error::PuzzleError;

    #[test]
    fn test_piece_record_defaults() {
        let json = r#"{
            "id": 7,
            "edge": true,
            "sourcePolygon": { "sides": [] },
            "displayPos": { "x": 1.0, "y": 2.0 }
        }"#;
        let record: PieceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert!(!record.hidden);
        assert_eq!(record.angle_step, 0);
        assert_eq!(record.num_rotate_steps.count(), 1);
        assert!(record.composite.is_none());
    }

    #[test]
    fn test_garbage_is_a_snapshot_error() {
        assert!(matches!(
            PuzzleSnapshot::from_json("{ not json"),
            Err(PuzzleError::Snapshot(_))
        ));
    }
}
