// src/puzzle/visibility.rs
use serde::{Deserialize, Serialize};

/// Anzeige-Filter für Teile: Randteile, Innenteile, zusammengesetzte Teile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    pub show_edges: bool,
    pub show_nonedges: bool,
    pub show_composites: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            show_edges: true,
            show_nonedges: true,
            show_composites: true,
        }
    }
}

impl Visibility {
    pub fn new(show_edges: bool, show_nonedges: bool, show_composites: bool) -> Self {
        Self {
            show_edges,
            show_nonedges,
            show_composites,
        }
    }

    /// Schalterstellung als Bitmaske `e ne c`
    pub fn bits(&self) -> u8 {
        (u8::from(self.show_edges) << 2)
            | (u8::from(self.show_nonedges) << 1)
            | u8::from(self.show_composites)
    }

    /// Ob ein Teil mit diesen Eigenschaften ausgeblendet wird.
    pub fn hides(&self, edge: bool, composite: bool) -> bool {
        match self.bits() {
            0b111 => false,
            0b011 => edge && !composite,
            0b101 => !edge && !composite,
            0b001 => !composite,
            0b110 => composite,
            0b010 => edge || composite,
            0b100 => !edge || composite,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_shown_hides_nothing() {
        let v = Visibility::default();
        for (edge, composite) in [(false, false), (true, false), (false, true), (true, true)] {
            assert!(!v.hides(edge, composite));
        }
        assert!(Visibility::new(false, false, false).hides(false, false));
    }

    #[test]
    fn test_truth_table_rows() {
        // nur Innenteile und Komposita
        let v = Visibility::new(false, true, true);
        assert!(v.hides(true, false));
        assert!(!v.hides(true, true));
        assert!(!v.hides(false, false));

        // nur Randteile, keine Komposita
        let v = Visibility::new(true, false, false);
        assert!(v.hides(false, false));
        assert!(v.hides(true, true));
        assert!(!v.hides(true, false));

        // nur Komposita
        let v = Visibility::new(false, false, true);
        assert!(v.hides(true, false));
        assert!(!v.hides(false, true));

        // keine Komposita
        let v = Visibility::new(true, true, false);
        assert!(v.hides(false, true));
        assert!(!v.hides(true, false));
    }
}
