//! `TriangleMesh`, the immutable triangle soup the slicer cuts through.

use crate::errors::{Result, SliceError};
use crate::float_types::{
    Real,
    parry3d::{bounding_volume::Aabb, shape::TriMesh},
};
use nalgebra::{Point3, Vector3};
use std::sync::OnceLock;

pub mod intersect;
pub mod plane;

/// Indexed triangle mesh.
///
/// The slicer only ever borrows a mesh for the duration of one query; nothing
/// in this crate keeps a reference past the call.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    /// Vertex positions
    pub vertices: Vec<Point3<Real>>,

    /// Triangles as triples of indices into `vertices`
    pub indices: Vec<[u32; 3]>,

    /// Lazily calculated AABB that spans `vertices`.
    bounding_box: OnceLock<Aabb>,
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::empty()
    }
}

impl TriangleMesh {
    /// A mesh without triangles. Slicing it yields nothing.
    pub const fn empty() -> Self {
        TriangleMesh {
            vertices: Vec::new(),
            indices: Vec::new(),
            bounding_box: OnceLock::new(),
        }
    }

    /// Build a mesh, checking that every index refers to an existing vertex
    /// and every coordinate is finite.
    pub fn new(vertices: Vec<Point3<Real>>, indices: Vec<[u32; 3]>) -> Result<Self> {
        for (index, v) in vertices.iter().enumerate() {
            if let Some(value) = v.coords.iter().copied().find(|c| !c.is_finite()) {
                return Err(SliceError::InvalidCoordinate { index, value });
            }
        }

        let len = vertices.len();
        if let Some(&index) = indices.iter().flatten().find(|&&i| i as usize >= len) {
            return Err(SliceError::IndexOutOfRange {
                index: index as usize,
                len,
            });
        }

        Ok(TriangleMesh {
            vertices,
            indices,
            bounding_box: OnceLock::new(),
        })
    }

    /// Build an unshared mesh from explicit triangles.
    pub fn from_triangles(triangles: &[[Point3<Real>; 3]]) -> Self {
        let vertices: Vec<Point3<Real>> = triangles.iter().flatten().copied().collect();
        let indices = (0..triangles.len() as u32)
            .map(|t| [3 * t, 3 * t + 1, 3 * t + 2])
            .collect();
        TriangleMesh {
            vertices,
            indices,
            bounding_box: OnceLock::new(),
        }
    }

    /// Axis-aligned box centred on the origin with outward-facing,
    /// counter-clockwise triangles (8 vertices, 12 triangles).
    pub fn cuboid(width: Real, height: Real, depth: Real) -> Self {
        let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);
        let vertices = vec![
            Point3::new(-hx, -hy, -hz),
            Point3::new(hx, -hy, -hz),
            Point3::new(hx, hy, -hz),
            Point3::new(-hx, hy, -hz),
            Point3::new(-hx, -hy, hz),
            Point3::new(hx, -hy, hz),
            Point3::new(hx, hy, hz),
            Point3::new(-hx, hy, hz),
        ];
        let indices = vec![
            // -Z
            [0, 2, 1],
            [0, 3, 2],
            // +Z
            [4, 5, 6],
            [4, 6, 7],
            // -Y
            [0, 1, 5],
            [0, 5, 4],
            // +Y
            [2, 3, 7],
            [2, 7, 6],
            // -X
            [0, 4, 7],
            [0, 7, 3],
            // +X
            [1, 2, 6],
            [1, 6, 5],
        ];
        TriangleMesh {
            vertices,
            indices,
            bounding_box: OnceLock::new(),
        }
    }

    /// Cube of edge `size` centred on the origin.
    pub fn cube(size: Real) -> Self {
        Self::cuboid(size, size, size)
    }

    /// A copy of this mesh moved by `offset`.
    pub fn translated(&self, offset: Vector3<Real>) -> Self {
        TriangleMesh {
            vertices: self.vertices.iter().map(|v| v + offset).collect(),
            indices: self.indices.clone(),
            bounding_box: OnceLock::new(),
        }
    }

    /// Concatenate several meshes into one.
    pub fn merged<'a, I>(meshes: I) -> Self
    where
        I: IntoIterator<Item = &'a TriangleMesh>,
    {
        let mut out = TriangleMesh::empty();
        for mesh in meshes {
            let base = out.vertices.len() as u32;
            out.vertices.extend_from_slice(&mesh.vertices);
            out.indices
                .extend(mesh.indices.iter().map(|[a, b, c]| [a + base, b + base, c + base]));
        }
        out
    }

    /// `true` if there is no triangle to cut.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() || self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Iterate over triangles as vertex position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<Real>; 3]> + '_ {
        self.indices.iter().map(move |&[a, b, c]| {
            [
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            ]
        })
    }

    /// Returns a [`parry3d::bounding_volume::Aabb`] spanning all vertices.
    /// An empty mesh yields a zero-sized box at the origin.
    pub fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut iter = self.vertices.iter();
            let Some(first) = iter.next() else {
                return Aabb::new(Point3::origin(), Point3::origin());
            };

            let (mut mins, mut maxs) = (*first, *first);
            for v in iter {
                for axis in 0..3 {
                    mins[axis] = mins[axis].min(v[axis]);
                    maxs[axis] = maxs[axis].max(v[axis]);
                }
            }
            Aabb::new(mins, maxs)
        })
    }

    /// Convert to a parry [`TriMesh`] for ray queries.
    ///
    /// ## Errors
    /// If parry rejects the triangle data.
    pub fn to_trimesh(&self) -> Result<TriMesh> {
        Ok(TriMesh::new(self.vertices.clone(), self.indices.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_bad_index() {
        let err = TriangleMesh::new(vec![Point3::origin(); 3], vec![[0, 1, 3]]).unwrap_err();
        assert!(matches!(err, SliceError::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn new_rejects_nan() {
        let err = TriangleMesh::new(
            vec![Point3::new(0.0, Real::NAN, 0.0)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, SliceError::InvalidCoordinate { index: 0, .. }));
    }

    #[test]
    fn cube_bounds() {
        let cube = TriangleMesh::cube(2.0);
        assert_eq!(cube.triangle_count(), 12);
        let bb = cube.bounding_box();
        assert_eq!(bb.mins, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(bb.maxs, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn cube_faces_point_outward() {
        let cube = TriangleMesh::cube(1.0);
        for [a, b, c] in cube.triangles() {
            let normal = (b - a).cross(&(c - a));
            let centre = (a.coords + b.coords + c.coords) / 3.0;
            assert!(normal.dot(&centre) > 0.0);
        }
    }

    #[test]
    fn merged_offsets_indices() {
        let a = TriangleMesh::cube(1.0);
        let b = a.translated(Vector3::new(5.0, 0.0, 0.0));
        let merged = TriangleMesh::merged([&a, &b]);
        assert_eq!(merged.vertices.len(), 16);
        assert_eq!(merged.triangle_count(), 24);
        assert_eq!(merged.indices[12], [8, 10, 9]);
        assert_eq!(merged.bounding_box().maxs.x, 5.5);
    }

    #[test]
    fn cube_converts_to_trimesh() {
        assert!(TriangleMesh::empty().is_empty());
        let trimesh = TriangleMesh::cube(1.0).to_trimesh().unwrap();
        assert_eq!(trimesh.indices().len(), 12);
    }
}
