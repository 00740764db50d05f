//! Mapping a 2D displacement back into the 3D world.
//!
//! The same [`SliceBasis`] that projected the world into slice space is used
//! for the reverse step, so a displacement measured in 2D lands on the exact
//! world position it corresponds to on the cutting plane.

use crate::basis::SliceBasis;
use crate::config::SliceConfig;
use crate::float_types::Real;
use crate::session::probe::GroundProbe;
use nalgebra::{Point3, Vector2, Vector3};

/// Zero every component of `delta` whose magnitude is below `deadzone`.
pub fn apply_deadzone(delta: Vector2<Real>, deadzone: Real) -> Vector2<Real> {
    delta.map(|c| if c.abs() < deadzone { 0.0 } else { c })
}

/// How the final position was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceResolution {
    /// A walkable surface was found at `surface`; the position sits a
    /// clearance above it.
    Grounded {
        surface: Point3<Real>,
        normal: Vector3<Real>,
    },
    /// No usable surface in range; the position is the raw target lifted by
    /// the safety margin.
    Fallback,
}

/// Result of [`ReturnMapper::map_return`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedReturn {
    /// Where the player should be placed.
    pub position: Point3<Real>,
    /// World displacement along the plane, after the deadzone.
    pub delta_3d: Vector3<Real>,
    /// Raw target on the plane before surface resolution.
    pub target: Point3<Real>,
    pub surface: SurfaceResolution,
}

/// Deadzone, inverse projection and ground snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnMapper {
    pub deadzone: Real,
    pub search_up: Real,
    pub search_down: Real,
    pub clearance: Real,
    pub safety_lift: Real,
    pub min_walkable_cos: Real,
    pub up: Vector3<Real>,
}

impl ReturnMapper {
    pub fn new(config: &SliceConfig) -> Self {
        ReturnMapper {
            deadzone: config.deadzone,
            search_up: config.probe_search_up,
            search_down: config.probe_search_down,
            clearance: config.ground_clearance,
            safety_lift: config.safety_lift,
            min_walkable_cos: config.min_walkable_cos(),
            up: config.up(),
        }
    }

    /// Map `delta_2d` (slice-space units, screen `y` down) back into the world.
    ///
    /// The displacement is applied from the point on the plane nearest
    /// `current_world_pos`. A miss from `probe`, or a hit steeper than the
    /// walkable slope, falls back to the raw target plus the safety lift;
    /// this never fails.
    pub fn map_return<P>(
        &self,
        delta_2d: Vector2<Real>,
        basis: &SliceBasis,
        current_world_pos: &Point3<Real>,
        probe: &P,
    ) -> MappedReturn
    where
        P: GroundProbe + ?Sized,
    {
        let delta = apply_deadzone(delta_2d, self.deadzone);
        let delta_3d = basis.from_plane_vector(&delta);
        let anchor = basis.nearest_point_on_plane(current_world_pos);
        let target = anchor + delta_3d;

        let hit = probe.probe(&target, self.search_up, self.search_down);
        let walkable = hit.filter(|hit| {
            let cos = hit.normal.dot(&self.up);
            if cos < self.min_walkable_cos {
                log::warn!(
                    "map_return: surface at {} is too steep (cos {cos} < {}), ignoring it",
                    hit.position,
                    self.min_walkable_cos
                );
                return false;
            }
            true
        });

        match walkable {
            Some(hit) => MappedReturn {
                position: hit.position + self.up * self.clearance,
                delta_3d,
                target,
                surface: SurfaceResolution::Grounded {
                    surface: hit.position,
                    normal: hit.normal,
                },
            },
            None => {
                if hit.is_none() {
                    log::warn!(
                        "map_return: no surface within [-{}, +{}] of {target}, using a safety lift",
                        self.search_down,
                        self.search_up
                    );
                }
                MappedReturn {
                    position: target + self.up * self.safety_lift,
                    delta_3d,
                    target,
                    surface: SurfaceResolution::Fallback,
                }
            },
        }
    }
}

/// [`ReturnMapper::map_return`] configured from `config`.
pub fn map_return<P>(
    delta_2d: Vector2<Real>,
    basis: &SliceBasis,
    current_world_pos: &Point3<Real>,
    probe: &P,
    config: &SliceConfig,
) -> MappedReturn
where
    P: GroundProbe + ?Sized,
{
    ReturnMapper::new(config).map_return(delta_2d, basis, current_world_pos, probe)
}
