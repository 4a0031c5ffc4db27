//! Tunables for octree construction, boolean operations and the worker pool.
//!
//! Every setting has a default; [`CsgOptions::from_env`] lets a deployment
//! override them through `OCTREE_CSG_*` environment variables. Values that fail
//! to parse are ignored in favour of the default.

use std::str::FromStr;
use std::time::Duration;

/// Octree subdivision limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctreeSettings {
    /// A node with more polygons than this is split into eight octants.
    pub polygons_per_tree: usize,
    /// Nodes at this depth are never split, whatever their polygon count.
    pub max_level: usize,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        Self {
            polygons_per_tree: 100,
            max_level: 16,
        }
    }
}

/// Options shared by every boolean operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsgOptions {
    /// Subdivision limits for result octrees.
    pub octree: OctreeSettings,
    /// Classify polygons with a winding number over the other solid's
    /// triangles instead of casting rays through its octree.
    pub use_winding_number: bool,
    /// Build the result octree before returning it.
    pub build_result: bool,
    /// Operands per worker job in dispatched array operations.
    pub batch_size: usize,
    /// Run dispatched work on the calling thread when the worker pool fails to start.
    pub sync_fallback: bool,
}

impl Default for CsgOptions {
    fn default() -> Self {
        Self {
            octree: OctreeSettings::default(),
            use_winding_number: false,
            build_result: true,
            batch_size: 100,
            sync_fallback: true,
        }
    }
}

impl CsgOptions {
    /// Defaults overridden by `OCTREE_CSG_POLYGONS_PER_TREE`, `OCTREE_CSG_MAX_LEVEL`,
    /// `OCTREE_CSG_WINDING_NUMBER`, `OCTREE_CSG_BATCH_SIZE` and
    /// `OCTREE_CSG_SYNC_FALLBACK`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            octree: OctreeSettings {
                polygons_per_tree: env_or(
                    "OCTREE_CSG_POLYGONS_PER_TREE",
                    defaults.octree.polygons_per_tree,
                )
                .max(1),
                max_level: env_or("OCTREE_CSG_MAX_LEVEL", defaults.octree.max_level),
            },
            use_winding_number: env_or("OCTREE_CSG_WINDING_NUMBER", defaults.use_winding_number),
            build_result: defaults.build_result,
            batch_size: env_or("OCTREE_CSG_BATCH_SIZE", defaults.batch_size).max(1),
            sync_fallback: env_or("OCTREE_CSG_SYNC_FALLBACK", defaults.sync_fallback),
        }
    }

    /// Same options with the winding-number classifier switched on or off.
    pub const fn with_winding_number(mut self, enabled: bool) -> Self {
        self.use_winding_number = enabled;
        self
    }

    /// Same options with a different dispatch batch size (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of worker threads; `0` lets rayon pick.
    pub threads: usize,
    /// How long every worker gets to report that it started.
    pub startup_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            startup_timeout: Duration::from_secs(5),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
