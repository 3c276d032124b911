// src/math/geometry/mod.rs

// Kantenkurven, Seiten und Umrisse der Puzzleteile
pub mod attachment;
pub mod polygon;
pub mod side;

pub use self::attachment::{Attachment, AttachmentRandomizer, AttachmentStyle, Bezier};
pub use self::polygon::Polygon;
pub use self::side::{Side, SideId, SideRegistry};
