//! The full slice pipeline: intersect, project, assemble, resolve.

use crate::basis::SliceBasis;
use crate::config::SliceConfig;
use crate::errors::Result;
use crate::float_types::Real;
use crate::mesh::TriangleMesh;
use crate::mesh::intersect::intersect_plane;
use crate::sketch::{LoopAssembler, PolygonResolver, SolidPolygon};
use geo::MultiPolygon;
use nalgebra::Point2;

/// Counts collected while slicing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceStats {
    pub meshes: usize,
    pub triangles: usize,
    pub segments: usize,
    pub loops: usize,
    pub polygons: usize,
}

/// The 2D cross-section of a scene, in the slice space of the basis that
/// produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossSection {
    pub polygons: Vec<SolidPolygon>,
    pub stats: SliceStats,
}

impl CrossSection {
    /// `true` if the plane passed through no solid geometry.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Total filled area.
    pub fn area(&self) -> Real {
        self.polygons.iter().map(SolidPolygon::area).sum()
    }

    pub fn contains_point(&self, p: &Point2<Real>) -> bool {
        self.polygons.iter().any(|polygon| polygon.contains_point(p))
    }

    pub fn to_multi_polygon(&self) -> MultiPolygon<Real> {
        MultiPolygon::new(self.polygons.iter().map(SolidPolygon::to_geo).collect())
    }
}

/// Slice every mesh in `meshes` with the plane of `basis`.
///
/// Segments from all meshes are assembled together, so touching meshes merge
/// into one outline. Degenerate input gives an empty [`CrossSection`], never
/// an error.
///
/// ## Errors
/// If `config` fails [`SliceConfig::validate`].
pub fn slice_meshes<'a, I>(meshes: I, basis: &SliceBasis, config: &SliceConfig) -> Result<CrossSection>
where
    I: IntoIterator<Item = &'a TriangleMesh>,
{
    config.validate()?;

    let plane = basis.plane();
    let mut stats = SliceStats::default();
    let mut segments = Vec::new();
    for mesh in meshes {
        stats.meshes += 1;
        stats.triangles += mesh.triangle_count();
        segments.extend(intersect_plane(mesh, &plane, config.plane_epsilon));
    }
    stats.segments = segments.len();

    let projected = basis.project_segments(&segments);
    let loops = LoopAssembler::new(config.quantization_epsilon)
        .with_max_points(config.max_loop_points)
        .assemble(&projected);
    stats.loops = loops.len();

    let polygons = PolygonResolver::new(config).resolve(loops);
    stats.polygons = polygons.len();

    log::debug!(
        "slice: {} meshes, {} triangles, {} segments, {} loops, {} polygons",
        stats.meshes,
        stats.triangles,
        stats.segments,
        stats.loops,
        stats.polygons
    );
    Ok(CrossSection { polygons, stats })
}

/// [`slice_meshes`] for a single mesh.
pub fn slice_mesh(mesh: &TriangleMesh, basis: &SliceBasis, config: &SliceConfig) -> Result<CrossSection> {
    slice_meshes([mesh], basis, config)
}
