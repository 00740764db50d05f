//! Tolerances and thresholds shared by every stage of the slice pipeline.

use crate::errors::{Result, SliceError};
use crate::float_types::{EPSILON, Real, tolerance};
use nalgebra::Vector3;

/// Slicing parameters.
///
/// All lengths are in world units except [`deadzone`](Self::deadzone), which is
/// measured in 2D slice-space units (the "pixels" of the 2D level).
#[derive(Debug, Clone, PartialEq)]
pub struct SliceConfig {
    /// Signed distance below which a vertex counts as lying on the plane.
    pub plane_epsilon: Real,
    /// Grid size used to merge near-duplicate loop vertices.
    pub quantization_epsilon: Real,
    /// Width of the boundary band in point-in-polygon tests.
    pub point_in_poly_epsilon: Real,
    /// Loops and polygon pieces with a smaller absolute area are discarded.
    pub area_epsilon: Real,
    /// Relative area difference under which two loops are "near-equal".
    pub ambiguity_epsilon: Real,
    /// Hard cap on the number of points a single loop walk may collect.
    pub max_loop_points: usize,
    /// Per-component displacement threshold applied on return.
    pub deadzone: Real,
    /// How far above the return target the ground probe may look.
    pub probe_search_up: Real,
    /// How far below the return target the ground probe may look.
    pub probe_search_down: Real,
    /// Height above a found surface the player is placed at.
    pub ground_clearance: Real,
    /// Lift applied to the raw target when no surface is found.
    pub safety_lift: Real,
    /// Steepest surface (in degrees from horizontal) still considered walkable.
    pub max_walkable_slope_deg: Real,
    /// World "up" axis.
    pub world_up: Vector3<Real>,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            plane_epsilon: EPSILON,
            quantization_epsilon: tolerance(),
            point_in_poly_epsilon: tolerance() * 0.1,
            area_epsilon: EPSILON,
            ambiguity_epsilon: 1e-6,
            max_loop_points: 100_000,
            deadzone: 6.0,
            probe_search_up: 2.0,
            probe_search_down: 8.0,
            ground_clearance: 0.05,
            safety_lift: 0.5,
            max_walkable_slope_deg: 60.0,
            world_up: Vector3::y(),
        }
    }
}

impl SliceConfig {
    /// Check that every threshold is finite and non-negative and that the
    /// up axis can be normalized.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("plane_epsilon", self.plane_epsilon),
            ("point_in_poly_epsilon", self.point_in_poly_epsilon),
            ("area_epsilon", self.area_epsilon),
            ("ambiguity_epsilon", self.ambiguity_epsilon),
            ("deadzone", self.deadzone),
            ("probe_search_up", self.probe_search_up),
            ("probe_search_down", self.probe_search_down),
            ("ground_clearance", self.ground_clearance),
            ("safety_lift", self.safety_lift),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SliceError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }

        if !self.quantization_epsilon.is_finite() || self.quantization_epsilon <= 0.0 {
            return Err(SliceError::InvalidConfig(format!(
                "quantization_epsilon must be finite and positive, got {}",
                self.quantization_epsilon
            )));
        }

        if !(0.0..=90.0).contains(&self.max_walkable_slope_deg) {
            return Err(SliceError::InvalidConfig(format!(
                "max_walkable_slope_deg must lie in [0, 90], got {}",
                self.max_walkable_slope_deg
            )));
        }

        if self.max_loop_points < 3 {
            return Err(SliceError::InvalidConfig(format!(
                "max_loop_points must be at least 3, got {}",
                self.max_loop_points
            )));
        }

        let up_len = self.world_up.norm();
        if !up_len.is_finite() || up_len < EPSILON {
            return Err(SliceError::InvalidConfig(
                "world_up must be a finite, non-zero vector".to_string(),
            ));
        }

        Ok(())
    }

    /// The normalized world up axis, or +Y if `world_up` is degenerate.
    pub fn up(&self) -> Vector3<Real> {
        self.world_up
            .try_normalize(EPSILON)
            .unwrap_or_else(Vector3::y)
    }

    /// Cosine of [`max_walkable_slope_deg`](Self::max_walkable_slope_deg):
    /// a surface normal whose dot product with [`up`](Self::up) falls below
    /// this is too steep to stand on.
    pub fn min_walkable_cos(&self) -> Real {
        self.max_walkable_slope_deg.to_radians().cos()
    }
}
