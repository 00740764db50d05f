//! Ground probing: the only spatial query the return path depends on.

use crate::errors::Result;
use crate::float_types::{
    EPSILON, Real,
    parry3d::{
        query::{Ray, RayCast},
        shape::TriMesh,
    },
};
use crate::mesh::TriangleMesh;
use nalgebra::{Point3, Vector3};

/// How far above a hit the parity test samples to decide whether the hit is
/// a top surface.
const SURFACE_SKIN: Real = 1e-4;

/// A surface found by a [`GroundProbe`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub position: Point3<Real>,
    /// Surface normal, facing the probe.
    pub normal: Vector3<Real>,
}

/// Finds the surface a returning player should stand on.
///
/// `probe` looks for the nearest surface within `search_up` above and
/// `search_down` below `origin`. It is a synchronous query; callers treat it as
/// an oracle and never look at the scene themselves.
pub trait GroundProbe {
    fn probe(&self, origin: &Point3<Real>, search_up: Real, search_down: Real) -> Option<GroundHit>;
}

impl<F> GroundProbe for F
where
    F: Fn(&Point3<Real>, Real, Real) -> Option<GroundHit>,
{
    fn probe(&self, origin: &Point3<Real>, search_up: Real, search_down: Real) -> Option<GroundHit> {
        self(origin, search_up, search_down)
    }
}

/// [`GroundProbe`] casting rays against static scene triangles with parry.
pub struct TriMeshGroundProbe {
    trimesh: TriMesh,
    up: Vector3<Real>,
}

impl TriMeshGroundProbe {
    /// ## Errors
    /// If the mesh has no triangles.
    pub fn new(mesh: &TriangleMesh, up: Vector3<Real>) -> Result<Self> {
        Ok(TriMeshGroundProbe {
            trimesh: mesh.to_trimesh()?,
            up: up.try_normalize(EPSILON).unwrap_or_else(Vector3::y),
        })
    }

    /// Probe against several meshes at once.
    pub fn from_meshes<'a, I>(meshes: I, up: Vector3<Real>) -> Result<Self>
    where
        I: IntoIterator<Item = &'a TriangleMesh>,
    {
        Self::new(&TriangleMesh::merged(meshes), up)
    }

    /// Every crossing of `ray` with the scene within `max_distance`, nearest
    /// first. A hit on an edge shared by two triangles counts once.
    fn crossings(&self, ray: &Ray, max_distance: Real) -> Vec<(Real, Vector3<Real>)> {
        let mut hits: Vec<(Real, Vector3<Real>)> = self
            .trimesh
            .triangles()
            .filter_map(|triangle| triangle.cast_local_ray_and_get_normal(ray, max_distance, true))
            .map(|hit| (hit.time_of_impact, hit.normal))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.dedup_by(|a, b| (a.0 - b.0).abs() < EPSILON);
        hits
    }

    /// Parity test: `point` is inside the scene if a ray from it crosses the
    /// surface an odd number of times.
    fn is_inside(&self, point: &Point3<Real>) -> bool {
        let ray = Ray::new(*point, Vector3::new(1.0, 1.0, 1.0));
        self.crossings(&ray, Real::MAX).len() % 2 == 1
    }

    /// Nearest surface along `direction` that has open space right above it.
    ///
    /// Hits whose upper side is solid (the underside of a slab seen from
    /// inside it, or a floor buried in another mesh) are skipped. Returns the
    /// distance to the hit with the hit itself; the normal points up.
    fn nearest_top(
        &self,
        origin: &Point3<Real>,
        direction: Vector3<Real>,
        max_distance: Real,
    ) -> Option<(Real, GroundHit)> {
        let ray = Ray::new(*origin, direction);
        self.crossings(&ray, max_distance).into_iter().find_map(|(toi, normal)| {
            let position = ray.point_at(toi);
            if self.is_inside(&(position + self.up * SURFACE_SKIN)) {
                log::trace!("probe: skipping the underside of solid geometry at {position}");
                return None;
            }
            let normal = if normal.dot(&self.up) < 0.0 { -normal } else { normal };
            Some((toi, GroundHit { position, normal }))
        })
    }
}

impl GroundProbe for TriMeshGroundProbe {
    /// Cast down and up from `origin` and keep the nearer top surface; a tie
    /// goes to the one below.
    fn probe(&self, origin: &Point3<Real>, search_up: Real, search_down: Real) -> Option<GroundHit> {
        let below = self.nearest_top(origin, -self.up, search_down);
        let above = self.nearest_top(origin, self.up, search_up);
        [below, above]
            .into_iter()
            .flatten()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, hit)| hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn floor() -> TriangleMesh {
        // 10 x 1 x 10 slab whose top face sits at y = 0
        TriangleMesh::cuboid(10.0, 1.0, 10.0).translated(Vector3::new(0.0, -0.5, 0.0))
    }

    #[test]
    fn finds_floor_below() {
        let probe = TriMeshGroundProbe::new(&floor(), Vector3::y()).unwrap();
        let hit = probe.probe(&Point3::new(1.0, 3.0, 1.0), 2.0, 8.0).unwrap();
        assert_relative_eq!(hit.position, Point3::new(1.0, 0.0, 1.0), epsilon = 1e-9);
        assert_relative_eq!(hit.normal, Vector3::y(), epsilon = 1e-9);
    }

    #[test]
    fn finds_floor_above_buried_target() {
        let probe = TriMeshGroundProbe::new(&floor(), Vector3::y()).unwrap();
        // target under the slab with a short downward window
        let hit = probe.probe(&Point3::new(0.0, -1.5, 0.0), 2.0, 0.1).unwrap();
        assert_relative_eq!(hit.position.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn target_inside_slab_snaps_to_its_top() {
        let ground = TriMeshGroundProbe::new(&floor(), Vector3::y()).unwrap();
        // just below the top face; the bottom face is nearer the downward window
        let hit = ground.probe(&Point3::new(0.0, -0.01, 0.0), 2.0, 8.0).unwrap();
        assert_relative_eq!(hit.position, Point3::new(0.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(hit.normal, Vector3::y(), epsilon = 1e-9);
    }

    #[test]
    fn nearest_of_two_floors_wins() {
        let upper = floor().translated(Vector3::new(0.0, 3.0, 0.0));
        let ground = TriMeshGroundProbe::from_meshes([&floor(), &upper], Vector3::y()).unwrap();
        // 0.5 above the lower floor, 1.5 below the upper one
        let hit = ground.probe(&Point3::new(0.0, 0.5, 0.0), 2.0, 8.0).unwrap();
        assert_relative_eq!(hit.position.y, 0.0, epsilon = 1e-9);
        // inside the upper slab: its top is nearer than the lower floor
        let hit = ground.probe(&Point3::new(0.0, 2.7, 0.0), 2.0, 8.0).unwrap();
        assert_relative_eq!(hit.position.y, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn misses_outside_window() {
        let probe = TriMeshGroundProbe::new(&floor(), Vector3::y()).unwrap();
        assert!(probe.probe(&Point3::new(0.0, 20.0, 0.0), 2.0, 8.0).is_none());
        assert!(probe.probe(&Point3::new(50.0, 1.0, 0.0), 2.0, 8.0).is_none());
    }

    #[test]
    fn closures_are_probes() {
        let flat = |origin: &Point3<Real>, _: Real, _: Real| {
            Some(GroundHit {
                position: Point3::new(origin.x, 0.0, origin.z),
                normal: Vector3::y(),
            })
        };
        let hit = flat.probe(&Point3::new(2.0, 5.0, 3.0), 1.0, 1.0).unwrap();
        assert_eq!(hit.position, Point3::new(2.0, 0.0, 3.0));
    }
}
