//! The slice basis: a fixed orthonormal frame on the cutting plane and the
//! 3D <-> 2D mappings derived from it.
//!
//! # 2D convention
//!
//! Slice-space `x` runs along [`SliceBasis::axis_u`]. Slice-space `y` runs
//! along **minus** [`SliceBasis::axis_v`], so that 2D `y` grows downwards like
//! screen coordinates while `axis_v` points towards world up. The forward
//! mapping ([`SliceBasis::to_plane_space`]) and the reverse mapping
//! ([`SliceBasis::from_plane_space`]) both apply this flip, so they are exact
//! inverses for points on the plane.

use crate::float_types::{EPSILON, Real};
use crate::mesh::intersect::Segment;
use crate::mesh::plane::Plane;
use crate::sketch::Segment2;
use nalgebra::{Point2, Point3, Vector2, Vector3};

/// Where the plane normal comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalSource {
    /// Use this vector (for example the camera's lateral axis) as the normal.
    Explicit(Vector3<Real>),
    /// Use the lateral axis `forward × up`.
    Lateral,
}

/// Which fixed direction the tangent axes are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TangentReference {
    /// `axis_v` is world up projected onto the plane.
    #[default]
    WorldUp,
    /// `axis_v` is the view forward direction projected onto the plane.
    ViewForward,
}

/// Options controlling [`SliceBasis::capture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasisMode {
    /// Remove the vertical component of the normal so the slice is plumb.
    pub force_vertical: bool,
    pub reference: TangentReference,
}

impl Default for BasisMode {
    fn default() -> Self {
        BasisMode {
            force_vertical: true,
            reference: TangentReference::WorldUp,
        }
    }
}

/// Aim state owned by the camera/movement side, sampled to build a basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimState {
    /// Point the plane must pass through (usually the player position).
    pub origin: Point3<Real>,
    /// View forward direction.
    pub forward: Vector3<Real>,
    pub normal_source: NormalSource,
}

impl AimState {
    pub fn capture(&self, mode: BasisMode, world_up: Vector3<Real>) -> SliceBasis {
        SliceBasis::capture(self.origin, self.forward, self.normal_source, mode, world_up)
    }
}

/// Orthonormal frame `(axis_u, axis_v, normal)` anchored at `origin`.
///
/// The frame is right-handed: `axis_u × axis_v = normal`. Fields are private;
/// once captured a basis cannot be modified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceBasis {
    origin: Point3<Real>,
    normal: Vector3<Real>,
    axis_u: Vector3<Real>,
    axis_v: Vector3<Real>,
}

/// A unit vector perpendicular to the unit vector `v`.
fn any_perpendicular(v: &Vector3<Real>) -> Vector3<Real> {
    let abs = v.abs();
    let axis = if abs.x <= abs.y && abs.x <= abs.z {
        Vector3::x()
    } else if abs.y <= abs.z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    v.cross(&axis).normalize()
}

impl SliceBasis {
    /// Derive a basis from aim state.
    ///
    /// The normal is taken from `normal_source`, flattened to horizontal if
    /// `mode.force_vertical` is set, and normalized. When that leaves nothing
    /// (a zero vector, or a vertical normal in force-vertical mode) the
    /// lateral axis of `forward` is used instead, and failing that any
    /// horizontal direction. The tangent axes are then
    /// `axis_u = reference × normal` and `axis_v = normal × axis_u`, with the
    /// same kind of fallback when the reference is parallel to the normal.
    pub fn capture(
        origin_hint: Point3<Real>,
        forward: Vector3<Real>,
        normal_source: NormalSource,
        mode: BasisMode,
        world_up: Vector3<Real>,
    ) -> Self {
        let up = world_up.try_normalize(EPSILON).unwrap_or_else(Vector3::y);

        let raw = match normal_source {
            NormalSource::Explicit(n) => n,
            NormalSource::Lateral => forward.cross(&up),
        };
        let raw = if mode.force_vertical {
            raw - up * raw.dot(&up)
        } else {
            raw
        };

        let normal = raw.try_normalize(EPSILON).unwrap_or_else(|| {
            log::debug!("capture: normal source {normal_source:?} is degenerate, using a fallback");
            forward
                .cross(&up)
                .try_normalize(EPSILON)
                .unwrap_or_else(|| any_perpendicular(&up))
        });

        let reference = match mode.reference {
            TangentReference::WorldUp => up,
            TangentReference::ViewForward => forward.try_normalize(EPSILON).unwrap_or(up),
        };
        let axis_u = reference
            .cross(&normal)
            .try_normalize(EPSILON)
            .or_else(|| up.cross(&normal).try_normalize(EPSILON))
            .unwrap_or_else(|| any_perpendicular(&normal));
        let axis_v = normal.cross(&axis_u).normalize();

        SliceBasis {
            origin: origin_hint,
            normal,
            axis_u,
            axis_v,
        }
    }

    /// Build a basis from explicit axes, or `None` if they are not
    /// orthonormal and right-handed within `epsilon`.
    pub fn from_axes(
        origin: Point3<Real>,
        axis_u: Vector3<Real>,
        axis_v: Vector3<Real>,
        epsilon: Real,
    ) -> Option<Self> {
        let basis = SliceBasis {
            origin,
            normal: axis_u.cross(&axis_v),
            axis_u,
            axis_v,
        };
        basis.is_orthonormal(epsilon).then_some(basis)
    }

    pub const fn origin(&self) -> Point3<Real> {
        self.origin
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn axis_u(&self) -> Vector3<Real> {
        self.axis_u
    }

    pub const fn axis_v(&self) -> Vector3<Real> {
        self.axis_v
    }

    /// `true` if all three axes are unit length, mutually orthogonal, and
    /// `axis_u × axis_v = normal`, each within `epsilon`.
    pub fn is_orthonormal(&self, epsilon: Real) -> bool {
        let unit = |v: &Vector3<Real>| (v.norm() - 1.0).abs() <= epsilon;
        unit(&self.normal)
            && unit(&self.axis_u)
            && unit(&self.axis_v)
            && self.axis_u.dot(&self.axis_v).abs() <= epsilon
            && self.axis_u.dot(&self.normal).abs() <= epsilon
            && self.axis_v.dot(&self.normal).abs() <= epsilon
            && (self.axis_u.cross(&self.axis_v) - self.normal).norm() <= epsilon
    }

    /// The cutting plane through `origin` with this basis' normal.
    pub fn plane(&self) -> Plane {
        Plane::from_point_normal(&self.origin, self.normal)
    }

    pub fn signed_distance(&self, p: &Point3<Real>) -> Real {
        self.normal.dot(&(p - self.origin))
    }

    /// The point on the plane closest to `p`.
    pub fn nearest_point_on_plane(&self, p: &Point3<Real>) -> Point3<Real> {
        p - self.normal * self.signed_distance(p)
    }

    /// World point -> slice-space point. The normal component is dropped.
    pub fn to_plane_space(&self, p: &Point3<Real>) -> Point2<Real> {
        Point2::from(self.to_plane_vector(&(p - self.origin)))
    }

    /// Slice-space point -> world point on the plane.
    pub fn from_plane_space(&self, q: &Point2<Real>) -> Point3<Real> {
        self.origin + self.from_plane_vector(&q.coords)
    }

    /// World direction -> slice-space direction.
    pub fn to_plane_vector(&self, d: &Vector3<Real>) -> Vector2<Real> {
        Vector2::new(d.dot(&self.axis_u), -d.dot(&self.axis_v))
    }

    /// Slice-space direction -> world direction in the plane.
    pub fn from_plane_vector(&self, d: &Vector2<Real>) -> Vector3<Real> {
        self.axis_u * d.x + self.axis_v * (-d.y)
    }

    /// Project 3D segments into slice space.
    pub fn project_segments(&self, segments: &[Segment]) -> Vec<Segment2> {
        segments
            .iter()
            .map(|s| [self.to_plane_space(&s.start), self.to_plane_space(&s.end)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn world_up_basis_for_x_normal() {
        let basis = SliceBasis::capture(
            Point3::origin(),
            Vector3::z(),
            NormalSource::Explicit(Vector3::x()),
            BasisMode::default(),
            Vector3::y(),
        );
        assert_relative_eq!(basis.normal(), Vector3::x());
        assert_relative_eq!(basis.axis_u(), -Vector3::z());
        assert_relative_eq!(basis.axis_v(), Vector3::y());
        assert!(basis.is_orthonormal(1e-12));
    }

    #[test]
    fn force_vertical_removes_tilt() {
        let basis = SliceBasis::capture(
            Point3::origin(),
            Vector3::z(),
            NormalSource::Explicit(Vector3::new(1.0, 0.7, 0.0)),
            BasisMode::default(),
            Vector3::y(),
        );
        assert_relative_eq!(basis.normal(), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(basis.axis_v(), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn vertical_normal_falls_back_to_lateral() {
        let basis = SliceBasis::capture(
            Point3::origin(),
            Vector3::new(0.0, 0.0, -1.0),
            NormalSource::Explicit(Vector3::y()),
            BasisMode::default(),
            Vector3::y(),
        );
        // forward (0,0,-1) x up (0,1,0) = (1,0,0)
        assert_relative_eq!(basis.normal(), Vector3::x(), epsilon = 1e-12);
        assert!(basis.is_orthonormal(1e-12));
    }

    #[test]
    fn everything_degenerate_still_orthonormal() {
        let basis = SliceBasis::capture(
            Point3::new(1.0, 2.0, 3.0),
            Vector3::zeros(),
            NormalSource::Lateral,
            BasisMode::default(),
            Vector3::zeros(),
        );
        assert!(basis.is_orthonormal(1e-12));
        assert!(basis.normal().dot(&Vector3::y()).abs() < 1e-12);
    }

    #[test]
    fn view_forward_parallel_to_normal_falls_back() {
        let mode = BasisMode {
            force_vertical: false,
            reference: TangentReference::ViewForward,
        };
        let basis = SliceBasis::capture(
            Point3::origin(),
            Vector3::x(),
            NormalSource::Explicit(Vector3::x()),
            mode,
            Vector3::y(),
        );
        assert!(basis.is_orthonormal(1e-12));
        assert_relative_eq!(basis.axis_v(), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn screen_y_points_down() {
        let basis = SliceBasis::capture(
            Point3::origin(),
            Vector3::z(),
            NormalSource::Explicit(Vector3::x()),
            BasisMode::default(),
            Vector3::y(),
        );
        let above = basis.to_plane_space(&Point3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(above, Point2::new(0.0, -2.0));
    }

    #[test]
    fn from_axes_rejects_skewed_frames() {
        assert!(
            SliceBasis::from_axes(Point3::origin(), Vector3::x(), Vector3::y(), 1e-12).is_some()
        );
        assert!(
            SliceBasis::from_axes(
                Point3::origin(),
                Vector3::x(),
                Vector3::new(1.0, 1.0, 0.0),
                1e-12
            )
            .is_none()
        );
    }
}
