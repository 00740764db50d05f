//! Classifying loops as outer boundaries or holes and cutting holes out.
//!
//! 1. Every loop is made counter-clockwise; loops below the area epsilon are
//!    dropped.
//! 2. Loops are sorted by area, largest first (stable, so ties keep input
//!    order).
//! 3. A containment forest is built: a loop's parent is the smallest
//!    earlier-sorted loop containing its interior sample point. Loops at even
//!    depth are outer boundaries, loops at odd depth are holes of their parent.
//!    Islands inside holes therefore become outer boundaries of their own.
//! 4. Each outer boundary has its holes subtracted with a polygon difference.
//!    If nothing survives, the outer boundary is emitted unmodified.
//!
//! Containment on a boundary and near-equal areas are resolved in favour of
//! the earlier-sorted loop being the container, with a warning.

use crate::config::SliceConfig;
use crate::float_types::Real;
use crate::sketch::polygon::{Loop, PointLocation, SolidPolygon};
use geo::{BooleanOps, MultiPolygon, Polygon as GeoPolygon};

/// Turns loops into solid polygons. See the module documentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonResolver {
    pub point_in_poly_epsilon: Real,
    pub area_epsilon: Real,
    pub ambiguity_epsilon: Real,
    pub cleanup_epsilon: Real,
}

impl PolygonResolver {
    pub fn new(config: &SliceConfig) -> Self {
        PolygonResolver {
            point_in_poly_epsilon: config.point_in_poly_epsilon,
            area_epsilon: config.area_epsilon,
            ambiguity_epsilon: config.ambiguity_epsilon,
            cleanup_epsilon: config.quantization_epsilon,
        }
    }

    /// Normalize, sort, classify and subtract.
    pub fn resolve(&self, loops: Vec<Loop>) -> Vec<SolidPolygon> {
        let mut candidates: Vec<Loop> = loops
            .into_iter()
            .filter_map(|mut lp| {
                if lp.area() < self.area_epsilon {
                    log::debug!("resolve: dropping degenerate loop (area {})", lp.area());
                    return None;
                }
                lp.make_ccw();
                Some(lp)
            })
            .collect();
        candidates.sort_by(|a, b| b.area().total_cmp(&a.area()));

        let parents = self.containment_forest(&candidates);
        let depths = depths(&parents);

        let mut solids = Vec::new();
        for (outer_idx, outer) in candidates.iter().enumerate() {
            if depths[outer_idx] % 2 != 0 {
                continue;
            }
            let holes: Vec<&Loop> = parents
                .iter()
                .enumerate()
                .filter(|(_, parent)| **parent == Some(outer_idx))
                .map(|(hole_idx, _)| &candidates[hole_idx])
                .collect();
            solids.extend(self.subtract_holes(outer, &holes));
        }

        log::trace!(
            "resolve: {} loops -> {} solids",
            candidates.len(),
            solids.len()
        );
        solids
    }

    /// `parents[i]` is the index of the innermost loop containing loop `i`.
    fn containment_forest(&self, sorted: &[Loop]) -> Vec<Option<usize>> {
        let mut parents = vec![None; sorted.len()];

        for (i, candidate) in sorted.iter().enumerate() {
            let sample = candidate.interior_point();
            let area = candidate.area();

            for j in (0..i).rev() {
                let location = sorted[j].locate_point(&sample, self.point_in_poly_epsilon);
                if location == PointLocation::Outside {
                    continue;
                }

                if location == PointLocation::Boundary {
                    log::warn!(
                        "resolve: sample of loop {i} lies on the boundary of loop {j}, treating as contained"
                    );
                }
                let container_area = sorted[j].area();
                if container_area - area <= self.ambiguity_epsilon * container_area {
                    log::warn!(
                        "resolve: loops {j} and {i} have near-equal areas ({container_area} vs {area}), \
                         keeping {j} as the container"
                    );
                }
                parents[i] = Some(j);
                break;
            }
        }
        parents
    }

    fn subtract_holes(&self, outer: &Loop, holes: &[&Loop]) -> Vec<SolidPolygon> {
        if holes.is_empty() {
            return vec![SolidPolygon::new(outer.clone(), Vec::new())];
        }

        let mut acc = MultiPolygon::new(vec![GeoPolygon::new(outer.to_line_string(), vec![])]);
        for hole in holes {
            let cutter = MultiPolygon::new(vec![GeoPolygon::new(hole.to_line_string(), vec![])]);
            acc = acc.difference(&cutter);
        }

        let pieces: Vec<SolidPolygon> = acc
            .0
            .iter()
            .filter_map(|polygon| SolidPolygon::from_geo(polygon, self.cleanup_epsilon))
            .filter(|solid| solid.area() >= self.area_epsilon)
            .collect();

        if pieces.is_empty() {
            log::warn!(
                "resolve: subtracting {} hole(s) left nothing of an outer loop with area {}, keeping it unmodified",
                holes.len(),
                outer.area()
            );
            return vec![SolidPolygon::new(outer.clone(), Vec::new())];
        }
        pieces
    }
}

/// Nesting depth of every node; parents always precede their children.
fn depths(parents: &[Option<usize>]) -> Vec<usize> {
    let mut depths = vec![0; parents.len()];
    for (i, parent) in parents.iter().enumerate() {
        if let Some(p) = parent {
            depths[i] = depths[*p] + 1;
        }
    }
    depths
}

/// [`PolygonResolver::resolve`] configured from `config`.
pub fn resolve(loops: Vec<Loop>, config: &SliceConfig) -> Vec<SolidPolygon> {
    PolygonResolver::new(config).resolve(loops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn square(min: Real, max: Real) -> Loop {
        Loop::new(vec![
            Point2::new(min, min),
            Point2::new(max, min),
            Point2::new(max, max),
            Point2::new(min, max),
        ])
    }

    #[test]
    fn depths_follow_parents() {
        assert_eq!(depths(&[None, Some(0), Some(1), None]), vec![0, 1, 2, 0]);
    }

    #[test]
    fn clockwise_loop_is_normalized() {
        let mut lp = square(0.0, 2.0);
        lp.reverse();
        let solids = resolve(vec![lp], &SliceConfig::default());
        assert_eq!(solids.len(), 1);
        assert!(solids[0].exterior.is_ccw());
        assert_eq!(solids[0].area(), 4.0);
    }

    #[test]
    fn degenerate_loops_are_dropped() {
        let sliver = Loop::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ]);
        assert!(resolve(vec![sliver], &SliceConfig::default()).is_empty());
    }

    #[test]
    fn forest_nests_three_levels() {
        let resolver = PolygonResolver::new(&SliceConfig::default());
        let sorted = vec![square(0.0, 10.0), square(2.0, 8.0), square(4.0, 6.0)];
        assert_eq!(
            resolver.containment_forest(&sorted),
            vec![None, Some(0), Some(1)]
        );
    }
}
