//! Cutting planes.

use crate::float_types::{EPSILON, Real};
use nalgebra::{Point3, Vector3};

// Point classification constants
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// An infinite plane `n·p = w`.
///
/// `normal` is unit length for every plane built through [`Plane::from_normal`]
/// or [`Plane::from_point_normal`], except when the supplied normal has zero
/// length. Such a plane is [degenerate](Plane::is_degenerate) and intersects
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal vector of the plane
    pub normal: Vector3<Real>,
    /// Signed distance from the origin along `normal`
    pub w: Real,
}

impl Plane {
    /// Create a plane from a normal and a signed distance along the normalized normal.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        let normal = normal.try_normalize(EPSILON).unwrap_or_else(Vector3::zeros);
        Plane { normal, w }
    }

    /// Create the plane through `point` with the given normal direction.
    pub fn from_point_normal(point: &Point3<Real>, normal: Vector3<Real>) -> Self {
        let normal = normal.try_normalize(EPSILON).unwrap_or_else(Vector3::zeros);
        Plane {
            normal,
            w: normal.dot(&point.coords),
        }
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn offset(&self) -> Real {
        self.w
    }

    /// A plane with a zero-length normal has no sides and cuts nothing.
    pub fn is_degenerate(&self) -> bool {
        self.normal.norm_squared() < EPSILON * EPSILON
    }

    /// `dot(point, normal) - w`; positive in front of the plane.
    #[inline]
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify `point` as [`FRONT`], [`BACK`] or [`COPLANAR`] within `epsilon`.
    pub fn orient_point(&self, point: &Point3<Real>, epsilon: Real) -> i8 {
        let distance = self.signed_distance(point);
        if distance > epsilon {
            FRONT
        } else if distance < -epsilon {
            BACK
        } else {
            COPLANAR
        }
    }
}
