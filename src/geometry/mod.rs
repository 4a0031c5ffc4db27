//! Geometric primitives and predicates shared by the octree and the CSG engine.

pub mod aabb;
pub mod ray;
pub mod tri_tri;
pub mod triangle;

pub use aabb::AabbExt;
pub use ray::Ray;
pub use triangle::Triangle;
