// src/math/tesselation/hexagon.rs

use super::TesselationParams;
use crate::math::probability::SeedResource;
use crate::math::types::Point;

/// Saatpunkte auf einem versetzten Gitter (Ziegelverband).
///
/// Ungerade Zeilen sind um eine halbe Teilbreite verschoben und tragen einen
/// Saatpunkt mehr; die äußeren Punkte werden um eine Viertelbreite nach innen
/// gezogen, damit ihre Zellen nicht zu schmal werden.
pub fn create_seeds(params: &TesselationParams, rng: &mut SeedResource) -> Vec<Point> {
    let (pw, ph) = (params.piece_width, params.piece_height);
    let min_x = pw / 4.0;
    let max_x = params.bed_width - pw / 4.0;
    let mut seeds = Vec::with_capacity(params.num_rows * (params.num_cols + 1));
    for i in 0..params.num_rows {
        let y = ph / 2.0 + i as f64 * ph;
        let (count, shift) = if i % 2 == 0 {
            (params.num_cols, pw / 2.0)
        } else {
            (params.num_cols + 1, 0.0)
        };
        for j in 0..count {
            let x = (shift + j as f64 * pw).clamp(min_x, max_x);
            let mut seed = params.wobble(Point::new(x, y), rng);
            seed.x = seed.x.clamp(1.0, params.bed_width - 1.0);
            seed.y = seed.y.clamp(1.0, params.bed_height - 1.0);
            seeds.push(seed);
        }
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tesselation::Cut;

    #[test]
    fn test_odd_rows_are_offset() {
        let params = TesselationParams::new(400.0, 200.0, 2, 4);
        let seeds = create_seeds(&params, &mut SeedResource::from_seed(1));
        assert_eq!(seeds.len(), 4 + 5);
        assert_eq!(seeds[0], Point::new(50.0, 50.0));
        assert_eq!(seeds[4], Point::new(25.0, 150.0));
        assert_eq!(seeds[5], Point::new(100.0, 150.0));
        assert_eq!(seeds[8], Point::new(375.0, 150.0));
    }

    #[test]
    fn test_hexagon_tesselation_edge_multiplicity() {
        let params = TesselationParams::new(600.0, 400.0, 5, 6).with_distortion(3.0);
        let tess = Cut::Hexagon
            .tesselate(&params, &mut SeedResource::from_seed(11))
            .unwrap();
        assert!(tess.is_consistent());
        assert_eq!(tess.tiles.len(), 3 * 6 + 2 * 7);
        let interior = tess.edges.values().filter(|e| !e.is_boundary()).count();
        assert!(interior > tess.tiles.len());
    }
}
