//! Domain model (IDs, diagnostic locations).

pub mod ids;
pub mod location;

pub use ids::{ClosureId, EventId, Id, IdMarker};
pub use location::Location;
