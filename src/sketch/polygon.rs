//! Closed 2D loops and the solid polygons built from them.

use crate::float_types::Real;
use geo::{Coord, LineString, Orient, Polygon as GeoPolygon, orient::Direction};
use nalgebra::{Point2, Vector2};

/// Where a point lies relative to a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    Outside,
    /// Within the boundary band of the loop.
    Boundary,
}

/// A closed polygon ring. The last point implicitly connects to the first.
///
/// Loops built through [`Loop::from_points`] carry no consecutive points closer
/// than the cleanup epsilon and no three consecutive collinear points.
#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    points: Vec<Point2<Real>>,
}

impl Loop {
    /// Wrap `points` as-is, without any cleanup.
    pub const fn new(points: Vec<Point2<Real>>) -> Self {
        Loop { points }
    }

    /// Clean up `points` and build a loop, or `None` if fewer than three
    /// points survive.
    ///
    /// Cleanup drops a closing duplicate of the first point, consecutive
    /// points within `epsilon` of each other, points within `epsilon` of the
    /// line through their neighbours, and zero-width spikes.
    pub fn from_points(points: Vec<Point2<Real>>, epsilon: Real) -> Option<Self> {
        let points = simplify(points, epsilon);
        (points.len() >= 3).then_some(Loop { points })
    }

    pub fn points(&self) -> &[Point2<Real>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the closed ring's edges, including last -> first.
    pub fn edges(&self) -> impl Iterator<Item = (Point2<Real>, Point2<Real>)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Shoelace area, positive for counter-clockwise loops.
    pub fn signed_area(&self) -> Real {
        self.edges()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<Real>()
            * 0.5
    }

    pub fn area(&self) -> Real {
        self.signed_area().abs()
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Reverse the loop if it winds clockwise.
    pub fn make_ccw(&mut self) {
        if self.signed_area() < 0.0 {
            self.reverse();
        }
    }

    /// Reverse the loop if it winds counter-clockwise.
    pub fn make_cw(&mut self) {
        if self.signed_area() > 0.0 {
            self.reverse();
        }
    }

    /// Area centroid. Falls back to the vertex average for zero-area loops.
    pub fn centroid(&self) -> Point2<Real> {
        let area = self.signed_area();
        if area.abs() <= Real::EPSILON || self.points.is_empty() {
            return self.vertex_average();
        }

        let (cx, cy) = self.edges().fold((0.0, 0.0), |(cx, cy), (a, b)| {
            let cross = a.x * b.y - b.x * a.y;
            (cx + (a.x + b.x) * cross, cy + (a.y + b.y) * cross)
        });
        Point2::new(cx / (6.0 * area), cy / (6.0 * area))
    }

    fn vertex_average(&self) -> Point2<Real> {
        if self.points.is_empty() {
            return Point2::origin();
        }
        let sum = self
            .points
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords);
        Point2::from(sum / self.points.len() as Real)
    }

    /// Even-odd containment with a half-open edge rule: an edge counts when
    /// exactly one of its endpoints lies strictly above `p`, so a crossing
    /// through a shared vertex is counted once.
    pub fn contains_point(&self, p: &Point2<Real>) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Shortest distance from `p` to the loop's boundary.
    pub fn distance_to_boundary(&self, p: &Point2<Real>) -> Real {
        self.edges()
            .map(|(a, b)| distance_to_segment(p, &a, &b))
            .fold(Real::MAX, Real::min)
    }

    /// [`contains_point`](Self::contains_point), with points within `epsilon`
    /// of the boundary reported as [`PointLocation::Boundary`].
    pub fn locate_point(&self, p: &Point2<Real>, epsilon: Real) -> PointLocation {
        if self.distance_to_boundary(p) <= epsilon {
            PointLocation::Boundary
        } else if self.contains_point(p) {
            PointLocation::Inside
        } else {
            PointLocation::Outside
        }
    }

    /// A point strictly inside the loop.
    ///
    /// This is the centroid when the centroid is inside (always true for
    /// convex loops). Otherwise a horizontal scanline through the centroid is
    /// cut against the loop and the middle of the widest interior interval is
    /// returned.
    pub fn interior_point(&self) -> Point2<Real> {
        let centroid = self.centroid();
        if self.contains_point(&centroid) && self.distance_to_boundary(&centroid) > 0.0 {
            return centroid;
        }

        let (min_y, max_y) = self
            .points
            .iter()
            .fold((Real::MAX, Real::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));

        [centroid.y, (min_y + max_y) * 0.5]
            .into_iter()
            .find_map(|y| self.widest_span_midpoint(y))
            .unwrap_or(centroid)
    }

    fn widest_span_midpoint(&self, y: Real) -> Option<Point2<Real>> {
        let mut xs: Vec<Real> = self
            .edges()
            .filter(|(a, b)| (a.y > y) != (b.y > y))
            .map(|(a, b)| a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y))
            .collect();
        xs.sort_by(|a, b| a.total_cmp(b));

        xs.chunks_exact(2)
            .map(|span| (span[1] - span[0], (span[0] + span[1]) * 0.5))
            .filter(|(width, _)| *width > 0.0)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, x)| Point2::new(x, y))
    }

    /// Closed `geo` ring (first point repeated at the end).
    pub fn to_line_string(&self) -> LineString<Real> {
        let mut coords: Vec<Coord<Real>> = self
            .points
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
        LineString::new(coords)
    }

    /// Build a cleaned loop from a `geo` ring.
    pub fn from_line_string(ring: &LineString<Real>, epsilon: Real) -> Option<Self> {
        let points = ring.0.iter().map(|c| Point2::new(c.x, c.y)).collect();
        Loop::from_points(points, epsilon)
    }
}

/// Distance from `p` to the segment `a..b`.
fn distance_to_segment(p: &Point2<Real>, a: &Point2<Real>, b: &Point2<Real>) -> Real {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= Real::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

fn simplify(points: Vec<Point2<Real>>, epsilon: Real) -> Vec<Point2<Real>> {
    let mut pts: Vec<Point2<Real>> = Vec::with_capacity(points.len());
    for p in points {
        if pts.last().is_none_or(|q| (p - q).norm() > epsilon) {
            pts.push(p);
        }
    }
    while pts.len() > 1 && (pts[0] - pts[pts.len() - 1]).norm() <= epsilon {
        pts.pop();
    }

    let mut changed = true;
    while changed && pts.len() >= 3 {
        changed = false;
        let mut i = 0;
        while i < pts.len() && pts.len() >= 3 {
            let n = pts.len();
            let (prev, cur, next) = (pts[(i + n - 1) % n], pts[i], pts[(i + 1) % n]);
            if is_redundant(&prev, &cur, &next, epsilon) {
                pts.remove(i);
                changed = true;
            } else {
                i += 1;
            }
        }
    }
    pts
}

/// `b` adds nothing to the ring `a -> b -> c`: it sits on the line `a..c`, or
/// `a` and `c` coincide (a spike or a duplicate).
fn is_redundant(a: &Point2<Real>, b: &Point2<Real>, c: &Point2<Real>, epsilon: Real) -> bool {
    let ac = c - a;
    let len = ac.norm();
    if len <= epsilon {
        return true;
    }
    (ac.perp(&(b - a)).abs() / len) <= epsilon
}

/// One contiguous filled region: an outer boundary (counter-clockwise) and
/// the cavities cut out of it (clockwise).
#[derive(Debug, Clone, PartialEq)]
pub struct SolidPolygon {
    pub exterior: Loop,
    pub holes: Vec<Loop>,
}

impl SolidPolygon {
    /// Build a solid, normalizing ring orientation.
    pub fn new(mut exterior: Loop, mut holes: Vec<Loop>) -> Self {
        exterior.make_ccw();
        for hole in &mut holes {
            hole.make_cw();
        }
        SolidPolygon { exterior, holes }
    }

    /// Filled area: exterior minus holes.
    pub fn area(&self) -> Real {
        self.exterior.area() - self.holes.iter().map(Loop::area).sum::<Real>()
    }

    pub fn contains_point(&self, p: &Point2<Real>) -> bool {
        self.exterior.contains_point(p) && !self.holes.iter().any(|h| h.contains_point(p))
    }

    pub fn to_geo(&self) -> GeoPolygon<Real> {
        GeoPolygon::new(
            self.exterior.to_line_string(),
            self.holes.iter().map(Loop::to_line_string).collect(),
        )
    }

    /// Convert a `geo` polygon, dropping rings that collapse under cleanup.
    /// Returns `None` if the exterior collapses.
    ///
    /// Rings are oriented by geo first (exterior CCW, interiors CW), whatever
    /// winding the input carries.
    pub fn from_geo(polygon: &GeoPolygon<Real>, epsilon: Real) -> Option<Self> {
        let oriented = polygon.orient(Direction::Default);
        let exterior = Loop::from_line_string(oriented.exterior(), epsilon)?;
        let holes = oriented
            .interiors()
            .iter()
            .filter_map(|ring| Loop::from_line_string(ring, epsilon))
            .collect();
        Some(SolidPolygon { exterior, holes })
    }
}
