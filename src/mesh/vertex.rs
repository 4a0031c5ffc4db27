//! Struct and functions for working with `Vertex`s from which `Polygon`s are composed.

use crate::float_types::Real;
use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};

/// Kind of an extra per-vertex attribute, with its component count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
}

impl AttributeKind {
    /// Number of scalar components.
    pub const fn len(self) -> usize {
        match self {
            AttributeKind::Scalar => 1,
            AttributeKind::Vec2 => 2,
            AttributeKind::Vec3 => 3,
            AttributeKind::Vec4 => 4,
        }
    }

    /// Rebuild an attribute of this kind from `self.len()` components.
    pub fn from_components(self, c: &[Real]) -> Option<Attribute> {
        if c.len() != self.len() {
            return None;
        }
        Some(match self {
            AttributeKind::Scalar => Attribute::Scalar(c[0]),
            AttributeKind::Vec2 => Attribute::Vec2(Vector2::new(c[0], c[1])),
            AttributeKind::Vec3 => Attribute::Vec3(Vector3::new(c[0], c[1], c[2])),
            AttributeKind::Vec4 => Attribute::Vec4(Vector4::new(c[0], c[1], c[2], c[3])),
        })
    }
}

/// Extra per-vertex data (uvs, colors, weights…) carried through splits.
///
/// The engine never interprets attributes; it only interpolates them when a
/// vertex is created on a splitting plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attribute {
    Scalar(Real),
    Vec2(Vector2<Real>),
    Vec3(Vector3<Real>),
    Vec4(Vector4<Real>),
}

impl Attribute {
    pub const fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Scalar(_) => AttributeKind::Scalar,
            Attribute::Vec2(_) => AttributeKind::Vec2,
            Attribute::Vec3(_) => AttributeKind::Vec3,
            Attribute::Vec4(_) => AttributeKind::Vec4,
        }
    }

    /// Components in storage order.
    pub fn components(&self) -> &[Real] {
        match self {
            Attribute::Scalar(s) => std::slice::from_ref(s),
            Attribute::Vec2(v) => v.as_slice(),
            Attribute::Vec3(v) => v.as_slice(),
            Attribute::Vec4(v) => v.as_slice(),
        }
    }

    /// Linear interpolation towards `other`; mismatched kinds keep `self`.
    pub fn lerp(&self, other: &Attribute, t: Real) -> Attribute {
        match (self, other) {
            (Attribute::Scalar(a), Attribute::Scalar(b)) => Attribute::Scalar(a + (b - a) * t),
            (Attribute::Vec2(a), Attribute::Vec2(b)) => Attribute::Vec2(a.lerp(b, t)),
            (Attribute::Vec3(a), Attribute::Vec3(b)) => Attribute::Vec3(a.lerp(b, t)),
            (Attribute::Vec4(a), Attribute::Vec4(b)) => Attribute::Vec4(a.lerp(b, t)),
            _ => *self,
        }
    }
}

/// A vertex of a polygon, holding position, normal and optional attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
    pub attributes: Vec<Attribute>,
}

impl Vertex {
    /// Create a new [`Vertex`] without extra attributes.
    ///
    /// * `pos`    – the position in model space
    /// * `normal` – (optionally non‑unit) normal, copied verbatim
    ///
    /// Non-finite components are replaced by zero.
    pub fn new(mut pos: Point3<Real>, mut normal: Vector3<Real>) -> Self {
        for c in pos.coords.iter_mut().chain(normal.iter_mut()) {
            if !c.is_finite() {
                *c = 0.0;
            }
        }
        Vertex {
            pos,
            normal,
            attributes: Vec::new(),
        }
    }

    /// Attach extra attributes.
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Flip vertex normal
    pub fn flip(&mut self) {
        self.normal = -self.normal;
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`).
    ///
    /// Position, normal and every attribute present on both vertices are
    /// interpolated; attributes are paired by position in the list.
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        let pos = self.pos + (other.pos - self.pos) * t;
        let normal = self.normal + (other.normal - self.normal) * t;
        let attributes = self
            .attributes
            .iter()
            .zip(&other.attributes)
            .map(|(a, b)| a.lerp(b, t))
            .collect();
        Vertex {
            pos,
            normal,
            attributes,
        }
    }

    /// Apply `matrix` to the position and its inverse transpose to the normal.
    pub fn transform(&mut self, matrix: &Matrix4<Real>, normal_matrix: &Matrix4<Real>) {
        self.pos = matrix.transform_point(&self.pos);
        let normal = normal_matrix.transform_vector(&self.normal);
        self.normal = normal.try_normalize(Real::EPSILON).unwrap_or(normal);
    }

    pub fn distance_to(&self, other: &Vertex) -> Real {
        (self.pos - other.pos).norm()
    }
}
