//! Test support library
//! Provides shared fixtures for the integration tests.
#![allow(dead_code)]

use crosscut::{
    AimState, BasisMode, NormalSource, SliceBasis, TriangleMesh,
    float_types::Real,
    session::{Freezable, GroundHit, Placeable},
    sketch::Segment2,
};
use nalgebra::{Point2, Point3, UnitQuaternion, Vector3};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Unit cube centred on the origin.
pub fn unit_cube() -> TriangleMesh {
    TriangleMesh::cube(1.0)
}

/// A closed box of edge 4 with a box-shaped cavity of edge 2 in the middle.
pub fn hollow_box() -> TriangleMesh {
    TriangleMesh::merged([&TriangleMesh::cube(4.0), &TriangleMesh::cube(2.0)])
}

/// A hollow box with a solid block floating in its cavity.
pub fn box_with_island() -> TriangleMesh {
    TriangleMesh::merged([
        &TriangleMesh::cube(6.0),
        &TriangleMesh::cube(4.0),
        &TriangleMesh::cube(2.0),
    ])
}

/// Basis through `origin` with the plane normal along +X and world up +Y.
pub fn x_basis(origin: Point3<Real>) -> SliceBasis {
    x_aim(origin).capture(BasisMode::default(), Vector3::y())
}

pub fn x_aim(origin: Point3<Real>) -> AimState {
    AimState {
        origin,
        forward: Vector3::z(),
        normal_source: NormalSource::Explicit(Vector3::x()),
    }
}

pub fn seg(a: (Real, Real), b: (Real, Real)) -> Segment2 {
    [Point2::new(a.0, a.1), Point2::new(b.0, b.1)]
}

/// Axis-aligned square from `min` to `max` as four segments.
pub fn square_segments(min: Real, max: Real) -> Vec<Segment2> {
    vec![
        seg((min, min), (max, min)),
        seg((max, min), (max, max)),
        seg((max, max), (min, max)),
        seg((min, max), (min, min)),
    ]
}

/// Ground probe that never finds anything.
pub fn no_ground(_: &Point3<Real>, _: Real, _: Real) -> Option<GroundHit> {
    None
}

/// Player double recording every call made through the capability traits.
#[derive(Debug, Clone)]
pub struct TestPlayer {
    pub position: Point3<Real>,
    pub orientation: UnitQuaternion<Real>,
    pub frozen: bool,
    pub freezes: usize,
    pub placements: Vec<Point3<Real>>,
}

impl TestPlayer {
    pub fn at(position: Point3<Real>) -> Self {
        TestPlayer {
            position,
            orientation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5),
            frozen: false,
            freezes: 0,
            placements: Vec::new(),
        }
    }
}

impl Freezable for TestPlayer {
    fn freeze(&mut self) {
        self.frozen = true;
        self.freezes += 1;
    }

    fn unfreeze(&mut self) {
        self.frozen = false;
    }
}

impl Placeable for TestPlayer {
    fn position(&self) -> Point3<Real> {
        self.position
    }

    fn orientation(&self) -> UnitQuaternion<Real> {
        self.orientation
    }

    fn place(&mut self, position: Point3<Real>, orientation: UnitQuaternion<Real>) {
        self.position = position;
        self.orientation = orientation;
        self.placements.push(position);
    }
}
