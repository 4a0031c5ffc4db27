//! Vertices, planes and classified triangles, the surface elements octrees store.

pub mod plane;
pub mod polygon;
pub mod vertex;

pub use plane::{Plane, PolygonSplit, SplitKind};
pub use polygon::{Polygon, PolygonId, PolygonState};
pub use vertex::{Attribute, AttributeKind, Vertex};
