// src/math/geometry/attachment.rs

use crate::math::probability::SeedResource;
use crate::math::types::{Bbox, Point};
use crate::math::utils::{bezier::cubic_point, comparison::epsilon_qz};
use crate::render::Surface;
use serde::{Deserialize, Serialize};

/// Seitenlänge des normierten Attachment-Raums
pub const NORMALIZED_SIZE: f64 = 1024.0;

/// Kubisches Segment `[cx1, cy1, cx2, cy2, x, y]`, relativ zum Startpunkt der Kante.
pub type Bezier = [f64; 6];

const CLASSIC: &[Bezier] = &[
    [0.0, 0.0, 448.0, -224.0, 448.0, -96.0],
    [448.0, -32.0, 384.0, -32.0, 384.0, 64.0],
    [384.0, 160.0, 448.0, 192.0, 512.0, 192.0],
    [576.0, 192.0, 640.0, 160.0, 640.0, 64.0],
    [640.0, -32.0, 576.0, -32.0, 576.0, -96.0],
    [576.0, -224.0, 1024.0, 0.0, 1024.0, 0.0],
];

const STRAIGHT: &[Bezier] = &[[0.0, 0.0, 1024.0, 0.0, 1024.0, 0.0]];

const TENON: &[Bezier] = &[
    [0.0, 0.0, 224.0, 0.0, 224.0, 0.0],
    [224.0, 0.0, 224.0, 192.0, 224.0, 192.0],
    [224.0, 192.0, 416.0, 192.0, 416.0, 192.0],
    [416.0, 192.0, 416.0, 0.0, 416.0, 0.0],
    [416.0, 0.0, 608.0, 0.0, 608.0, 0.0],
    [608.0, 0.0, 608.0, 192.0, 608.0, 192.0],
    [608.0, 192.0, 800.0, 192.0, 800.0, 192.0],
    [800.0, 192.0, 800.0, 0.0, 800.0, 0.0],
    [800.0, 0.0, 1024.0, 0.0, 1024.0, 0.0],
];

const WAVE: &[Bezier] = &[
    [128.0, 128.0, 192.0, -96.0, 320.0, 0.0],
    [352.0, 32.0, 224.0, 96.0, 256.0, 128.0],
    [448.0, 224.0, 576.0, -224.0, 768.0, -128.0],
    [800.0, -96.0, 672.0, -32.0, 704.0, 0.0],
    [832.0, 96.0, 896.0, -128.0, 1024.0, 0.0],
];

/// Eingebaute Kantenformen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentStyle {
    #[default]
    Classic,
    Straight,
    Tenon,
    Wave,
}

impl AttachmentStyle {
    pub const ALL: [AttachmentStyle; 4] = [
        AttachmentStyle::Classic,
        AttachmentStyle::Straight,
        AttachmentStyle::Tenon,
        AttachmentStyle::Wave,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttachmentStyle::Classic => "classic",
            AttachmentStyle::Straight => "straight",
            AttachmentStyle::Tenon => "tenon",
            AttachmentStyle::Wave => "wave",
        }
    }

    /// Normierte Kurve dieses Stils
    pub fn stock(&self) -> Attachment {
        let beziers = match self {
            AttachmentStyle::Classic => CLASSIC,
            AttachmentStyle::Straight => STRAIGHT,
            AttachmentStyle::Tenon => TENON,
            AttachmentStyle::Wave => WAVE,
        };
        Attachment::new(beziers.to_vec(), true)
    }
}

/// Kurvenzug entlang einer Kante.
///
/// Normiert liegt er im 1024er-Raum von (0,0) nach (1024,0); nach
/// [`Attachment::transform`] sind die Koordinaten relativ zum Startpunkt der
/// konkreten Kante. Ein leerer Kurvenzug wird als gerade Linie gezeichnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub beziers: Vec<Bezier>,
    pub attachable: bool,
}

impl Default for Attachment {
    fn default() -> Self {
        Self::straight()
    }
}

impl Attachment {
    pub fn new(beziers: Vec<Bezier>, attachable: bool) -> Self {
        Self {
            beziers,
            attachable,
        }
    }

    pub fn straight() -> Self {
        AttachmentStyle::Straight.stock()
    }

    /// Gerade Kante, die niemals einrasten darf
    pub fn unattachable() -> Self {
        Self {
            attachable: false,
            ..Self::straight()
        }
    }

    /// Spiegelkurve: von B nach A gezeichnet deckt sie sich mit dem Original.
    pub fn complement(&self) -> Self {
        let mut beziers = self.beziers.clone();
        let (mut x, mut y) = (NORMALIZED_SIZE, 0.0);
        for b in beziers.iter_mut() {
            let (nx, ny) = (b[4], b[5]);
            b[4] = x;
            b[5] = y;
            x = NORMALIZED_SIZE - b[0];
            y = -b[1];
            b[0] = NORMALIZED_SIZE - b[2];
            b[1] = -b[3];
            b[2] = x;
            b[3] = y;
            x = NORMALIZED_SIZE - nx;
            y = -ny;
        }
        beziers.reverse();
        Self {
            beziers,
            attachable: self.attachable,
        }
    }

    /// Skaliert und rotiert die normierte Kurve auf die Kante `a -> b`.
    ///
    /// Alle Koordinaten werden auf das Epsilon-Raster quantisiert, damit
    /// gespiegelte Kontrollpunkte benachbarter Teile exakt übereinstimmen.
    pub fn transform(&self, a: Point, b: Point) -> Self {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let scale = (dx * dx + dy * dy).sqrt() / NORMALIZED_SIZE;
        let angle = dy.atan2(dx);
        let (sin, cos) = angle.sin_cos();
        let apply = |x: f64, y: f64| {
            let (x, y) = (x * scale, y * scale);
            (epsilon_qz(x * cos - y * sin), epsilon_qz(x * sin + y * cos))
        };
        let beziers = self
            .beziers
            .iter()
            .map(|bz| {
                let (cx1, cy1) = apply(bz[0], bz[1]);
                let (cx2, cy2) = apply(bz[2], bz[3]);
                let (x, y) = apply(bz[4], bz[5]);
                [cx1, cy1, cx2, cy2, x, y]
            })
            .collect();
        Self {
            beziers,
            attachable: self.attachable,
        }
    }

    /// Kontrollpunkt-Hülle relativ zum Startpunkt (inklusive Ursprung)
    pub fn bbox(&self) -> Bbox {
        let mut bbox = Bbox::from_points(Point::ZERO, Point::ZERO);
        for b in &self.beziers {
            bbox.union_point(Point::new(b[0], b[1]))
                .union_point(Point::new(b[2], b[3]))
                .union_point(Point::new(b[4], b[5]));
        }
        bbox
    }

    /// Hängt die Kurve an den aktuellen Pfad an; der Pfad steht bereits auf `a`.
    pub fn trace(&self, surface: &mut dyn Surface, a: Point, b: Point) {
        if self.beziers.is_empty() {
            surface.line_to(b);
            return;
        }
        for bz in &self.beziers {
            surface.bezier_curve_to(
                a.offsetted(bz[0], bz[1]),
                a.offsetted(bz[2], bz[3]),
                a.offsetted(bz[4], bz[5]),
            );
        }
    }

    /// Polylinie der Kurve ab `a` (ohne den Startpunkt selbst)
    pub fn flatten(&self, a: Point, b: Point, steps: usize, out: &mut Vec<Point>) {
        if self.beziers.is_empty() {
            out.push(b);
            return;
        }
        let steps = steps.max(1);
        let mut start = a;
        for bz in &self.beziers {
            let c1 = a.offsetted(bz[0], bz[1]);
            let c2 = a.offsetted(bz[2], bz[3]);
            let end = a.offsetted(bz[4], bz[5]);
            for i in 1..=steps {
                out.push(cubic_point(start, c1, c2, end, i as f64 / steps as f64));
            }
            start = end;
        }
    }
}

/// Wählt für jede Kante die normierte Kurve oder deren Komplement.
#[derive(Debug, Clone)]
pub struct AttachmentRandomizer {
    normalized: Attachment,
    min_distance: f64,
}

impl AttachmentRandomizer {
    pub const DEFAULT_MIN_DISTANCE: f64 = 20.0;

    pub fn new(normalized: Attachment) -> Self {
        Self {
            normalized,
            min_distance: Self::DEFAULT_MIN_DISTANCE,
        }
    }

    pub fn with_min_distance(mut self, min_distance: f64) -> Self {
        self.min_distance = min_distance;
        self
    }

    /// Zu kurze Kanten bleiben gerade und nicht einrastbar.
    pub fn randomize(&self, a: Point, b: Point, rng: &mut SeedResource) -> Attachment {
        if a.distance(b) < self.min_distance {
            return Attachment::unattachable();
        }
        if rng.next_f64() >= 0.5 {
            self.normalized.complement()
        } else {
            self.normalized.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_complement_is_involution_for_all_styles() {
        for style in AttachmentStyle::ALL {
            let a = style.stock();
            assert_eq!(a.complement().complement(), a, "style {}", style.name());
        }
    }

    #[test]
    fn test_complement_ends_at_far_corner() {
        let c = AttachmentStyle::Classic.stock().complement();
        let last = c.beziers.last().copied().unwrap_or_default();
        assert_relative_eq!(last[4], 1024.0);
        assert_relative_eq!(last[5], 0.0);
        // Lasche zeigt nach der Spiegelung auf die andere Seite
        let tip = c.beziers[2];
        assert_relative_eq!(tip[5], -192.0);
    }

    #[test]
    fn test_transform_maps_end_to_edge_end_and_quantizes() {
        let a = Point::new(10.0, 10.0);
        let b = Point::new(10.0, 110.0);
        let t = AttachmentStyle::Wave.stock().transform(a, b);
        let last = t.beziers.last().copied().unwrap_or_default();
        assert_relative_eq!(last[4], 0.0, epsilon = 1e-9);
        assert_relative_eq!(last[5], 100.0, epsilon = 1e-9);
        for bz in &t.beziers {
            for v in bz {
                let steps = v * 100.0;
                assert_relative_eq!(steps, steps.round(), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_randomizer_short_edge_is_unattachable() {
        let r = AttachmentRandomizer::new(AttachmentStyle::Classic.stock());
        let mut rng = SeedResource::from_seed(1);
        let a = r.randomize(Point::new(0.0, 0.0), Point::new(5.0, 0.0), &mut rng);
        assert!(!a.attachable);
        assert_eq!(a.beziers, Attachment::straight().beziers);
    }

    #[test]
    fn test_randomizer_picks_stock_or_complement() {
        let stock = AttachmentStyle::Classic.stock();
        let r = AttachmentRandomizer::new(stock.clone());
        let mut rng = SeedResource::from_seed(99);
        let mut seen = (false, false);
        for _ in 0..64 {
            let a = r.randomize(Point::new(0.0, 0.0), Point::new(100.0, 0.0), &mut rng);
            assert!(a.attachable);
            if a == stock {
                seen.0 = true;
            } else {
                assert_eq!(a, stock.complement());
                seen.1 = true;
            }
        }
        assert!(seen.0 && seen.1);
    }

    #[test]
    fn test_style_lookup_by_name() {
        assert_eq!(AttachmentStyle::from_name("Wave"), Some(AttachmentStyle::Wave));
        assert_eq!(AttachmentStyle::from_name("zigzag"), None);
    }
}
