//! Stitching unordered 2D segments into closed loops.
//!
//! Segment endpoints are snapped to a grid of size `epsilon` so that points
//! computed independently by neighbouring triangles (and differing only by
//! floating point noise) share a key. Walks then follow the adjacency index.
//!
//! This is a heuristic, not a planar-graph reconstruction. At a junction where
//! more than two segments meet, the walk always takes the first unused incident
//! segment in input order. The result is deterministic but not necessarily the
//! geometrically canonical decomposition of a non-manifold cross-section.

use crate::float_types::Real;
use crate::sketch::polygon::Loop;
use hashbrown::HashMap;
use nalgebra::Point2;

/// A 2D segment in slice space.
pub type Segment2 = [Point2<Real>; 2];

/// Default hard cap on the number of points one walk may collect.
pub const MAX_LOOP_POINTS: usize = 100_000;

type CellKey = (i64, i64);

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Quantized point -> indices of the segments touching it.
struct SegmentIndex<'a> {
    segments: &'a [Segment2],
    cells: HashMap<CellKey, Vec<usize>>,
    epsilon: Real,
}

impl<'a> SegmentIndex<'a> {
    fn new(segments: &'a [Segment2], epsilon: Real, used: &[bool]) -> Self {
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (idx, [a, b]) in segments.iter().enumerate() {
            if used[idx] {
                continue;
            }
            cells.entry(key(a, epsilon)).or_default().push(idx);
            cells.entry(key(b, epsilon)).or_default().push(idx);
        }
        SegmentIndex {
            segments,
            cells,
            epsilon,
        }
    }

    /// First unused segment touching `p` and its far endpoint.
    ///
    /// The cell of `p` is searched first, in insertion order. If it has
    /// nothing left, the eight surrounding cells are searched for a segment
    /// whose endpoint lies within `epsilon` of `p`, and the lowest index wins.
    fn next_unused(&self, p: &Point2<Real>, used: &[bool]) -> Option<(usize, Point2<Real>)> {
        let (kx, ky) = key(p, self.epsilon);

        let exact = self
            .cells
            .get(&(kx, ky))
            .and_then(|list| list.iter().copied().find(|&idx| !used[idx]));

        let idx = exact.or_else(|| {
            NEIGHBOURS
                .iter()
                .filter_map(|(dx, dy)| self.cells.get(&(kx + dx, ky + dy)))
                .flatten()
                .copied()
                .filter(|&idx| !used[idx] && self.near_distance(idx, p) <= self.epsilon)
                .min()
        })?;

        Some((idx, self.far_endpoint(idx, p)))
    }

    fn near_distance(&self, idx: usize, p: &Point2<Real>) -> Real {
        let [a, b] = &self.segments[idx];
        (a - p).norm().min((b - p).norm())
    }

    fn far_endpoint(&self, idx: usize, p: &Point2<Real>) -> Point2<Real> {
        let [a, b] = self.segments[idx];
        if (a - p).norm_squared() <= (b - p).norm_squared() {
            b
        } else {
            a
        }
    }
}

fn key(p: &Point2<Real>, epsilon: Real) -> CellKey {
    ((p.x / epsilon).round() as i64, (p.y / epsilon).round() as i64)
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    /// Came back to its start.
    Closed,
    /// No unused segment touches the tail.
    DeadEnd,
    /// Stopped at the point cap.
    Capped,
}

/// Stitches segments into loops. See the module documentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopAssembler {
    epsilon: Real,
    max_points: usize,
}

impl LoopAssembler {
    pub const fn new(epsilon: Real) -> Self {
        LoopAssembler {
            epsilon,
            max_points: MAX_LOOP_POINTS,
        }
    }

    /// Override the per-walk point cap.
    pub const fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    fn same_point(&self, p: &Point2<Real>, q: &Point2<Real>) -> bool {
        (p - q).norm() <= self.epsilon || key(p, self.epsilon) == key(q, self.epsilon)
    }

    /// Assemble closed loops from `segments`.
    ///
    /// Each unused segment starts a walk that follows incident segments from
    /// its second endpoint until it returns to the first. A walk that dead
    /// ends is first extended backwards from its start, then force-closed.
    /// A walk that reaches the point cap is force-closed where it stopped.
    /// Loops with fewer than three distinct points after cleanup are dropped.
    pub fn assemble(&self, segments: &[Segment2]) -> Vec<Loop> {
        let mut used: Vec<bool> = segments
            .iter()
            .map(|[a, b]| self.same_point(a, b))
            .collect();
        let index = SegmentIndex::new(segments, self.epsilon, &used);

        let mut loops = Vec::new();
        for start in 0..segments.len() {
            if used[start] {
                continue;
            }
            used[start] = true;

            let [a, b] = segments[start];
            let mut chain = vec![a, b];
            let walk = self.extend(&mut chain, Some(a), &index, &mut used);

            if walk != Walk::Closed {
                if walk == Walk::DeadEnd {
                    chain.reverse();
                    self.extend(&mut chain, None, &index, &mut used);
                }
                log::debug!(
                    "assemble: force-closing open chain of {} points starting at ({}, {})",
                    chain.len(),
                    chain[0].x,
                    chain[0].y
                );
            }

            match Loop::from_points(chain, self.epsilon) {
                Some(lp) => loops.push(lp),
                None => log::debug!("assemble: discarding walk from segment {start} (< 3 points)"),
            }
        }

        log::trace!(
            "assemble: {} segments -> {} loops",
            segments.len(),
            loops.len()
        );
        loops
    }

    /// Extend `chain` at its tail. On [`Walk::Closed`] the walk came back to
    /// `target` and the duplicated closing point has been removed.
    fn extend(
        &self,
        chain: &mut Vec<Point2<Real>>,
        target: Option<Point2<Real>>,
        index: &SegmentIndex,
        used: &mut [bool],
    ) -> Walk {
        loop {
            let Some(current) = chain.last().copied() else {
                return Walk::DeadEnd;
            };

            if let Some(target) = target {
                if chain.len() > 2 && self.same_point(&current, &target) {
                    chain.pop();
                    return Walk::Closed;
                }
            }

            if chain.len() >= self.max_points {
                log::warn!(
                    "assemble: walk hit the cap of {} points, stopping",
                    self.max_points
                );
                return Walk::Capped;
            }

            let Some((idx, far)) = index.next_unused(&current, used) else {
                return Walk::DeadEnd;
            };
            used[idx] = true;
            chain.push(far);
        }
    }
}

/// [`LoopAssembler::assemble`] with the default point cap.
pub fn assemble_loops(segments: &[Segment2], epsilon: Real) -> Vec<Loop> {
    LoopAssembler::new(epsilon).assemble(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(a: (Real, Real), b: (Real, Real)) -> Segment2 {
        [Point2::new(a.0, a.1), Point2::new(b.0, b.1)]
    }

    #[test]
    fn stitches_shuffled_and_flipped_segments() {
        let segments = vec![
            seg((0.0, 0.0), (1.0, 0.0)),
            seg((1.0, 1.0), (0.0, 1.0)),
            seg((1.0, 1.0), (1.0, 0.0)),
            seg((0.0, 0.0), (0.0, 1.0)),
        ];
        let loops = assemble_loops(&segments, 1e-6);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
        assert!((loops[0].area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tolerates_near_misses() {
        let segments = vec![
            seg((0.0, 0.0), (1.0, 0.0)),
            seg((1.0 + 3e-7, 0.0), (0.5, 1.0)),
            seg((0.5, 1.0 - 2e-7), (0.0, 1e-7)),
        ];
        let loops = assemble_loops(&segments, 1e-6);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 3);
    }

    #[test]
    fn separate_loops_stay_separate() {
        let segments = vec![
            seg((0.0, 0.0), (1.0, 0.0)),
            seg((5.0, 5.0), (6.0, 5.0)),
            seg((1.0, 0.0), (0.0, 1.0)),
            seg((6.0, 5.0), (5.0, 6.0)),
            seg((0.0, 1.0), (0.0, 0.0)),
            seg((5.0, 6.0), (5.0, 5.0)),
        ];
        let loops = assemble_loops(&segments, 1e-6);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].points()[0], Point2::new(0.0, 0.0));
        assert_eq!(loops[1].points()[0], Point2::new(5.0, 5.0));
    }

    #[test]
    fn open_chain_is_force_closed() {
        // start in the middle of the chain so the backward extension is needed
        let segments = vec![
            seg((1.0, 0.0), (1.0, 1.0)),
            seg((0.0, 0.0), (1.0, 0.0)),
            seg((1.0, 1.0), (0.0, 1.0)),
        ];
        let loops = assemble_loops(&segments, 1e-6);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
    }

    #[test]
    fn short_pieces_are_discarded() {
        let segments = vec![seg((0.0, 0.0), (1.0, 0.0)), seg((1.0, 0.0), (2.0, 0.0))];
        assert!(assemble_loops(&segments, 1e-6).is_empty());
        assert!(assemble_loops(&[], 1e-6).is_empty());
    }

    #[test]
    fn point_cap_stops_walk() {
        // open parabola: without the cap the walk would run to its end
        let segments: Vec<Segment2> = (0..4)
            .map(|i| {
                let a = i as Real;
                seg((a, (a * a) * 0.1), (a + 1.0, ((a + 1.0) * (a + 1.0)) * 0.1))
            })
            .collect();
        let assembler = LoopAssembler::new(1e-6).with_max_points(4);

        let mut used = vec![false; segments.len()];
        let index = SegmentIndex::new(&segments, 1e-6, &used);
        used[0] = true;
        let mut chain = segments[0].to_vec();
        let walk = assembler.extend(&mut chain, Some(segments[0][0]), &index, &mut used);
        assert_eq!(walk, Walk::Capped);
        assert_eq!(chain.len(), 4);
        assert_eq!(used, vec![true, true, true, false]);

        // the capped walk is closed as is; the leftover segment alone is too short
        let loops = assembler.assemble(&segments);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
        assert!((loops[0].points()[3] - Point2::new(3.0, 0.9)).norm() < 1e-12);
    }
}
