//! Plane/mesh intersection: one raw line segment per triangle crossing.
//!
//! Every triangle is tested independently against the plane. An edge whose
//! endpoints lie strictly on opposite sides contributes the interpolated point
//! `a + t (b - a)` with `t = da / (da - db)`; a vertex within `epsilon` of the
//! plane contributes itself. A triangle yielding exactly two distinct points
//! produces one [`Segment`].
//!
//! Special cases:
//! - triangles lying entirely in the plane are skipped, since their outline is
//!   already produced by the neighbouring triangles that cross it;
//! - an edge lying in the plane is emitted once even if both triangles sharing
//!   it report it;
//! - segments shorter than `epsilon` are discarded.

use crate::float_types::Real;
use crate::mesh::TriangleMesh;
use crate::mesh::plane::{COPLANAR, Plane, SPANNING};
use hashbrown::HashSet;
use nalgebra::Point3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A piece of the cross-section boundary, both ends on the cutting plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point3<Real>,
    pub end: Point3<Real>,
}

impl Segment {
    pub const fn new(start: Point3<Real>, end: Point3<Real>) -> Self {
        Segment { start, end }
    }

    pub fn length(&self) -> Real {
        (self.end - self.start).norm()
    }
}

/// What a single triangle contributes.
enum Crossing {
    None,
    /// Regular crossing, or a vertex on the plane plus a crossing.
    Segment(Segment),
    /// Two vertices on the plane, the third off it.
    OnPlaneEdge(Segment),
}

type QuantizedPoint = (i64, i64, i64);

fn quantize(p: &Point3<Real>, epsilon: Real) -> QuantizedPoint {
    (
        (p.x / epsilon).round() as i64,
        (p.y / epsilon).round() as i64,
        (p.z / epsilon).round() as i64,
    )
}

/// Undirected key of an on-plane edge.
fn edge_key(segment: &Segment, epsilon: Real) -> (QuantizedPoint, QuantizedPoint) {
    let a = quantize(&segment.start, epsilon);
    let b = quantize(&segment.end, epsilon);
    if a <= b { (a, b) } else { (b, a) }
}

fn intersect_triangle(tri: &[Point3<Real>; 3], plane: &Plane, epsilon: Real) -> Crossing {
    let sides = tri.map(|v| plane.orient_point(&v, epsilon));
    let on_plane = sides.map(|side| side == COPLANAR);

    match on_plane.iter().filter(|&&on| on).count() {
        3 => return Crossing::None,
        2 => {
            let mut on = tri.iter().zip(on_plane).filter(|(_, on)| *on).map(|(v, _)| *v);
            return match (on.next(), on.next()) {
                (Some(a), Some(b)) if (b - a).norm() > epsilon => {
                    Crossing::OnPlaneEdge(Segment::new(a, b))
                },
                _ => Crossing::None,
            };
        },
        _ => {},
    }

    let mut points: Vec<Point3<Real>> = Vec::with_capacity(2);
    for i in 0..3 {
        let j = (i + 1) % 3;
        let (a, b) = (tri[i], tri[j]);

        if on_plane[i] {
            points.push(a);
        } else if sides[i] | sides[j] == SPANNING {
            let (da, db) = (plane.signed_distance(&a), plane.signed_distance(&b));
            let t = da / (da - db);
            points.push(a + (b - a) * t);
        }
    }

    match points.as_slice() {
        [a, b] if (b - a).norm() > epsilon => Crossing::Segment(Segment::new(*a, *b)),
        _ => Crossing::None,
    }
}

/// `true` if the whole box lies strictly on one side of the plane.
fn misses_bounds(mesh: &TriangleMesh, plane: &Plane, epsilon: Real) -> bool {
    let (min, max) = mesh
        .bounding_box()
        .vertices()
        .iter()
        .map(|corner| plane.signed_distance(corner))
        .fold((Real::MAX, Real::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)));
    min > epsilon || max < -epsilon
}

/// Intersect every triangle of `mesh` with `plane`.
///
/// Returns an empty list for an empty mesh, a degenerate plane, or a plane
/// that misses the mesh's bounding box. Segment order follows triangle order,
/// so repeated queries with the same inputs give identical output.
pub fn intersect_plane(mesh: &TriangleMesh, plane: &Plane, epsilon: Real) -> Vec<Segment> {
    if mesh.is_empty() {
        log::debug!("intersect_plane: mesh has no triangles");
        return Vec::new();
    }
    if plane.is_degenerate() {
        log::debug!("intersect_plane: plane normal has zero length");
        return Vec::new();
    }
    if misses_bounds(mesh, plane, epsilon) {
        log::trace!("intersect_plane: plane misses the mesh bounds");
        return Vec::new();
    }

    let triangles: Vec<[Point3<Real>; 3]> = mesh.triangles().collect();

    #[cfg(feature = "parallel")]
    let crossings: Vec<Crossing> = triangles
        .par_iter()
        .map(|tri| intersect_triangle(tri, plane, epsilon))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let crossings: Vec<Crossing> = triangles
        .iter()
        .map(|tri| intersect_triangle(tri, plane, epsilon))
        .collect();

    let mut seen_edges = HashSet::new();
    let mut segments = Vec::new();
    for crossing in crossings {
        match crossing {
            Crossing::None => {},
            Crossing::Segment(segment) => segments.push(segment),
            Crossing::OnPlaneEdge(segment) => {
                if seen_edges.insert(edge_key(&segment, epsilon)) {
                    segments.push(segment);
                }
            },
        }
    }

    log::trace!(
        "intersect_plane: {} triangles -> {} segments",
        triangles.len(),
        segments.len()
    );
    segments
}

impl TriangleMesh {
    /// See [`intersect_plane`].
    pub fn intersect_plane(&self, plane: &Plane, epsilon: Real) -> Vec<Segment> {
        intersect_plane(self, plane, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::EPSILON;
    use nalgebra::Vector3;

    fn tri(a: [Real; 3], b: [Real; 3], c: [Real; 3]) -> [Point3<Real>; 3] {
        [Point3::from(a), Point3::from(b), Point3::from(c)]
    }

    #[test]
    fn crossing_triangle_gives_one_segment() {
        let plane = Plane::from_normal(Vector3::z(), 0.0);
        let t = tri([0.0, 0.0, -1.0], [2.0, 0.0, 1.0], [0.0, 2.0, 1.0]);
        let Crossing::Segment(seg) = intersect_triangle(&t, &plane, EPSILON) else {
            panic!("expected a segment");
        };
        assert!(plane.signed_distance(&seg.start).abs() < 1e-12);
        assert!(plane.signed_distance(&seg.end).abs() < 1e-12);
        assert_eq!(seg.start, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(seg.end, Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn vertex_on_plane_plus_crossing() {
        let plane = Plane::from_normal(Vector3::z(), 0.0);
        let t = tri([0.0, 0.0, 0.0], [2.0, 0.0, 1.0], [2.0, 2.0, -1.0]);
        let Crossing::Segment(seg) = intersect_triangle(&t, &plane, EPSILON) else {
            panic!("expected a segment");
        };
        assert_eq!(seg.start, Point3::origin());
        assert_eq!(seg.end, Point3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn vertex_within_epsilon_snaps_onto_plane() {
        let plane = Plane::from_normal(Vector3::z(), 0.0);
        // the first vertex is 0.01 in front: on the plane for epsilon 0.1,
        // an ordinary front vertex for the default epsilon
        let t = tri([0.0, 0.0, 0.01], [2.0, 0.0, 1.0], [2.0, 2.0, -1.0]);
        let Crossing::Segment(seg) = intersect_triangle(&t, &plane, 0.1) else {
            panic!("expected a segment");
        };
        assert_eq!(seg.start, Point3::new(0.0, 0.0, 0.01));
        assert_eq!(seg.end, Point3::new(2.0, 1.0, 0.0));

        let Crossing::Segment(seg) = intersect_triangle(&t, &plane, EPSILON) else {
            panic!("expected a segment");
        };
        assert!(plane.signed_distance(&seg.start).abs() < 1e-12);
        assert!(plane.signed_distance(&seg.end).abs() < 1e-12);
    }

    #[test]
    fn touching_vertex_contributes_nothing() {
        let plane = Plane::from_normal(Vector3::z(), 0.0);
        let t = tri([0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]);
        assert!(matches!(intersect_triangle(&t, &plane, EPSILON), Crossing::None));
    }

    #[test]
    fn coplanar_triangle_is_skipped() {
        let plane = Plane::from_normal(Vector3::z(), 0.0);
        let t = tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!(matches!(intersect_triangle(&t, &plane, EPSILON), Crossing::None));
    }

    #[test]
    fn shared_on_plane_edge_is_emitted_once() {
        let plane = Plane::from_normal(Vector3::z(), 0.0);
        let mesh = TriangleMesh::from_triangles(&[
            tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.0, 1.0]),
            tri([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.5, 0.0, -1.0]),
        ]);
        let segments = mesh.intersect_plane(&plane, EPSILON);
        assert_eq!(segments.len(), 1);
        assert!((segments[0].length() - 1.0).abs() < 1e-12);
    }
}
