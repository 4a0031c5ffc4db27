use crate::config::CsgOptions;
use crate::errors::CsgError;
use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::octree::Octree;
use nalgebra::{Matrix4, Rotation3, Translation3, Vector3};

/// Boolean operations + transformations on borrowed solids.
///
/// The free functions in [`crate::csg`] consume their operands; these
/// clone first and leave `self` untouched.
pub trait CsgOps: Sized + Clone {
    fn union(&self, other: &Self) -> Result<Self, CsgError>;
    fn difference(&self, other: &Self) -> Result<Self, CsgError>;
    fn intersection(&self, other: &Self) -> Result<Self, CsgError>;
    fn inverse(&self) -> Self;
    fn transform(&self, matrix: &Matrix4<Real>) -> Result<Self, CsgError>;
    /// `None` for an empty solid.
    fn bounding_box(&self) -> Option<Aabb>;

    /// Returns a new Self translated by vector.
    fn translate_vector(&self, vector: Vector3<Real>) -> Result<Self, CsgError> {
        self.transform(&Translation3::from(vector).to_homogeneous())
    }

    /// Returns a new Self translated by x, y, and z.
    fn translate(&self, x: Real, y: Real, z: Real) -> Result<Self, CsgError> {
        self.translate_vector(Vector3::new(x, y, z))
    }

    /// Translated so that its bounding-box center is at the origin.
    fn center(&self) -> Result<Self, CsgError> {
        let Some(aabb) = self.bounding_box() else {
            return Ok(self.clone());
        };
        let center = aabb.center();
        self.translate(-center.x, -center.y, -center.z)
    }

    /// Translated so that its lowest point sits at z=0.
    fn float(&self) -> Result<Self, CsgError> {
        let Some(aabb) = self.bounding_box() else {
            return Ok(self.clone());
        };
        self.translate(0.0, 0.0, -aabb.mins.z)
    }

    /// Rotates by x_deg, y_deg, z_deg (applied x, then y, then z).
    fn rotate(&self, x_deg: Real, y_deg: Real, z_deg: Real) -> Result<Self, CsgError> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), x_deg.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), y_deg.to_radians());
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), z_deg.to_radians());
        self.transform(&(rz * ry * rx).to_homogeneous())
    }

    /// Scales by sx, sy, sz; a zero factor fails with [`CsgError::NonInvertibleMatrix`].
    fn scale(&self, sx: Real, sy: Real, sz: Real) -> Result<Self, CsgError> {
        self.transform(&Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)))
    }
}

impl CsgOps for Octree {
    fn union(&self, other: &Self) -> Result<Self, CsgError> {
        CsgOptions::default().union(self.clone(), other.clone())
    }

    fn difference(&self, other: &Self) -> Result<Self, CsgError> {
        CsgOptions::default().subtract(self.clone(), other.clone())
    }

    fn intersection(&self, other: &Self) -> Result<Self, CsgError> {
        CsgOptions::default().intersect(self.clone(), other.clone())
    }

    fn inverse(&self) -> Self {
        let mut inverted = self.clone();
        inverted.invert();
        inverted
    }

    fn transform(&self, matrix: &Matrix4<Real>) -> Result<Self, CsgError> {
        let mut moved = self.clone();
        moved.apply_matrix(matrix)?;
        Ok(moved)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Octree::bounding_box(self)
    }
}
