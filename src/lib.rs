//! **Constructive Solid Geometry (CSG)** on closed triangle meshes, accelerated by
//! octrees: *union*, *subtract* and *intersect* over [`Octree`]s of triangles.
//!
//! Each operand is split along the other's surface, every piece that lies near
//! the other solid is classified inside or outside it (by casting a ray through
//! its octree, or optionally by a winding number), and a per-operation rule
//! table keeps the pieces that bound the result.
//!
//! ```no_run
//! use octree_csg::{CsgOps, Octree};
//!
//! let cube = Octree::cube(2.0);
//! let sphere = Octree::sphere(1.2, 24, 12).translate(1.0, 1.0, 1.0)?;
//! let carved = cube.difference(&sphere)?;
//! let bytes = carved.encode()?;
//! # Ok::<(), octree_csg::CsgError>(())
//! ```
//!
//! # Features
//! #### Default
//! - **parallel**: a rayon [`WorkerPool`](csg::dispatch::WorkerPool) for
//!   dispatched operations
//!
//! Without it, dispatched operations run on the calling thread or through a
//! caller-provided [`Dispatcher`](csg::dispatch::Dispatcher).

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod config;
pub mod csg;
pub mod errors;
pub mod float_types;
pub mod geometry;
pub mod mesh;
pub mod octree;
pub mod shapes;
pub mod traits;

pub use config::{CsgOptions, OctreeSettings, WorkerPoolConfig};
pub use csg::array::{intersect_array, subtract_array, union_array};
pub use csg::operation::{CsgOperation, Operand, OperationKind, operation};
pub use csg::{BooleanOp, intersect, subtract, union};
pub use errors::{CsgError, DecodeError};
pub use mesh::{Polygon, PolygonState, Vertex};
pub use octree::Octree;
pub use traits::CsgOps;
