// src/math/utils.rs

/// Mathematische Konstanten
pub mod constants {
    /// Raster, auf das transformierte Attachment-Koordinaten quantisiert werden.
    pub const EPSILON: f64 = 1.0 / 100.0;
    /// Toleranz beim Verschweißen von Voronoi-Eckpunkten
    pub const WELD_TOLERANCE: f64 = 1e-6;
}

/// Vergleichsfunktionen mit Toleranz
pub mod comparison {
    use super::constants::EPSILON;

    /// Prüft ob zwei Werte bis auf `EPSILON` gleich sind
    pub fn epsilon_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    /// Quantisiert auf das `EPSILON`-Raster
    pub fn epsilon_qz(a: f64) -> f64 {
        (a / EPSILON).round() * EPSILON
    }
}

/// Winkel-Hilfsfunktionen
pub mod angles {
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees.to_radians()
    }
}

/// Kubische Bezier-Auswertung
pub mod bezier {
    use crate::math::types::Point;

    pub fn cubic_point(p0: Point, c1: Point, c2: Point, p3: Point, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * p0.x + b * c1.x + c * c2.x + d * p3.x,
            a * p0.y + b * c1.y + c * c2.y + d * p3.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::comparison::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_epsilon_quantization() {
        assert_relative_eq!(epsilon_qz(1.23456), 1.23, epsilon = 1e-12);
        assert_relative_eq!(epsilon_qz(-0.004), 0.0, epsilon = 1e-12);
        assert!(epsilon_eq(0.1 + 0.2, 0.3));
    }

    #[test]
    fn test_cubic_endpoints() {
        use crate::math::types::Point;
        let p0 = Point::new(0.0, 0.0);
        let p3 = Point::new(3.0, 0.0);
        let start = bezier::cubic_point(p0, Point::new(1.0, 1.0), Point::new(2.0, 1.0), p3, 0.0);
        let end = bezier::cubic_point(p0, Point::new(1.0, 1.0), Point::new(2.0, 1.0), p3, 1.0);
        assert_eq!(start, p0);
        assert_eq!(end, p3);
    }
}
