// Re-export parry for the float size used throughout the crate
pub use parry3d_f64 as parry3d;

// Our Real scalar type:
pub type Real = f64;

/// Plane-side tolerance.
///
/// Used when classifying vertices against a splitting plane, when padding
/// octant boxes, as the jitter distance of the coplanar inside probes and as
/// the distance tolerance of the segment crossing test.
pub const EPSILON: Real = 1e-5;

/// Smallest ray parameter accepted as a hit, also the Möller–Trumbore
/// parallel-ray determinant threshold.
///
/// Kept well below [`EPSILON`] so a probe jittered by exactly `EPSILON` off a
/// face still registers that face.
pub const RAY_EPSILON: Real = 1e-9;

/// Archimedes' constant (π)
pub const PI: Real = core::f64::consts::PI;

/// The full circle constant (τ)
pub const TAU: Real = core::f64::consts::TAU;
