// src/puzzle/details.rs

use super::config::PuzzleConfig;
use crate::math::tesselation::TesselationParams;
use crate::math::types::Point;
use crate::render::RasterImage;
use serde::{Deserialize, Serialize};

/// Mindestabstand zwischen Bett und Canvas-Rand
pub const BED_MARGIN: f64 = 24.0;

/// Abgeleitete Pixelgrößen von Canvas, Bild, Bett und Teilen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PuzzleDetails {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub image_width: f64,
    pub image_height: f64,
    pub num_pieces: u32,
    pub min_piece_size: f64,
    pub bed_to_canvas_ratio: f64,
    pub bed_width: f64,
    pub bed_height: f64,
    pub num_rows: usize,
    pub num_cols: usize,
    pub piece_width: f64,
    pub piece_height: f64,
}

impl PuzzleDetails {
    pub fn new(canvas_width: f64, canvas_height: f64, image: &RasterImage, config: &PuzzleConfig) -> Self {
        Self {
            canvas_width,
            canvas_height,
            image_width: image.width as f64,
            image_height: image.height as f64,
            num_pieces: config.num_pieces,
            min_piece_size: config.min_piece_size,
            bed_to_canvas_ratio: config.bed_to_canvas_ratio,
            ..Self::default()
        }
    }

    /// Bettgröße aus Canvasfläche und Bildseitenverhältnis, dann Zeilen und Spalten.
    ///
    /// Mit `preserve_grid` bleiben Zeilen und Spalten erhalten (Resize).
    pub fn compute_sizes(&mut self, preserve_grid: bool) -> &mut Self {
        let ratio = if self.bed_to_canvas_ratio > 0.0 {
            self.bed_to_canvas_ratio
        } else {
            0.5
        };
        let image_area = self.canvas_width * self.canvas_height * ratio;
        let image_ratio = if self.image_height > 0.0 {
            self.image_width / self.image_height
        } else {
            1.0
        };
        let bed_height = (image_area / image_ratio)
            .sqrt()
            .min(self.canvas_height - BED_MARGIN);
        let bed_width = (bed_height * image_ratio).min(self.canvas_width - BED_MARGIN);
        let bed_height = bed_width / image_ratio;

        if !preserve_grid {
            let n = (self.num_pieces as f64).sqrt();
            let min_piece = self.min_piece_size.max(1.0);
            self.num_cols = ((n * image_ratio.sqrt()).ceil().max(2.0))
                .min((bed_width / min_piece).ceil().max(2.0)) as usize;
            self.num_rows = ((n / image_ratio.sqrt()).ceil().max(2.0))
                .min((bed_height / min_piece).ceil().max(2.0)) as usize;
        }
        self.bed_width = bed_width;
        self.bed_height = bed_height;
        self.piece_width = bed_width / self.num_cols.max(1) as f64;
        self.piece_height = bed_height / self.num_rows.max(1) as f64;
        self
    }

    pub fn tesselation_params(&self, distortion: f64) -> TesselationParams {
        TesselationParams::new(self.bed_width, self.bed_height, self.num_rows, self.num_cols)
            .with_distortion(distortion)
    }

    /// Obere linke Ecke des zentrierten Betts im Canvas
    pub fn bed_offset(&self) -> Point {
        Point::new(
            (self.canvas_width - self.bed_width) / 2.0,
            (self.canvas_height - self.bed_height) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn details(cw: f64, ch: f64, iw: u32, ih: u32, pieces: u32) -> PuzzleDetails {
        let config = PuzzleConfig::new().with_num_pieces(pieces);
        let mut d = PuzzleDetails::new(cw, ch, &RasterImage::new("img", iw, ih), &config);
        d.compute_sizes(false);
        d
    }

    #[test]
    fn test_bed_keeps_image_aspect_ratio() {
        let d = details(800.0, 600.0, 400, 300, 80);
        assert_relative_eq!(d.bed_width / d.bed_height, 4.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(d.bed_width * d.bed_height, 800.0 * 600.0 * 0.5, epsilon = 1e-6);
        assert_eq!((d.num_rows, d.num_cols), (8, 11));
    }

    #[test]
    fn test_bed_respects_margin() {
        let mut d = details(400.0, 300.0, 100, 100, 16);
        d.bed_to_canvas_ratio = 1.0;
        d.compute_sizes(false);
        assert!(d.bed_height <= 300.0 - BED_MARGIN);
        assert_relative_eq!(d.bed_width, d.bed_height);
    }

    #[test]
    fn test_min_piece_size_limits_grid() {
        let mut d = details(800.0, 600.0, 400, 400, 999);
        d.min_piece_size = 100.0;
        d.compute_sizes(false);
        assert!(d.piece_width >= 100.0 * 0.8);
        assert!(d.num_cols >= 2 && d.num_rows >= 2);
    }

    #[test]
    fn test_preserve_grid_on_resize() {
        let mut d = details(800.0, 600.0, 400, 300, 50);
        let grid = (d.num_rows, d.num_cols);
        let bed = d.bed_width;
        d.canvas_width = 1600.0;
        d.canvas_height = 1200.0;
        d.compute_sizes(true);
        assert_eq!((d.num_rows, d.num_cols), grid);
        assert_relative_eq!(d.bed_width, bed * 2.0, epsilon = 1e-9);
        assert_relative_eq!(d.bed_offset().x, (1600.0 - d.bed_width) / 2.0);
    }
}
