use crate::errors::{Result, SliceError};
use crate::float_types::Real;
use crate::mesh::TriangleMesh;
use nalgebra::{Point3, Vector3};
use std::io::{Cursor, Read, Seek};
use stl_io::{Normal, Triangle, Vertex};

impl TriangleMesh {
    /// Read an ASCII or binary STL into an indexed mesh.
    ///
    /// Vertices shared between facets are merged by `stl_io`.
    ///
    /// ```rust
    /// # use crosscut::mesh::TriangleMesh;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let bytes = TriangleMesh::cube(1.0).to_stl_binary()?;
    /// let mesh = TriangleMesh::from_stl(&mut std::io::Cursor::new(bytes))?;
    /// assert_eq!(mesh.triangle_count(), 12);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_stl<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let stl = stl_io::read_stl(reader)?;

        #[allow(clippy::unnecessary_cast)]
        let vertices = stl
            .vertices
            .iter()
            .map(|v| Point3::new(v[0] as Real, v[1] as Real, v[2] as Real))
            .collect();

        let mut indices = Vec::with_capacity(stl.faces.len());
        for face in &stl.faces {
            let mut tri = [0u32; 3];
            for (slot, &idx) in tri.iter_mut().zip(face.vertices.iter()) {
                *slot = u32::try_from(idx).map_err(|_| SliceError::IndexOutOfRange {
                    index: idx,
                    len: stl.vertices.len(),
                })?;
            }
            indices.push(tri);
        }

        log::debug!(
            "from_stl: {} vertices, {} triangles",
            stl.vertices.len(),
            indices.len()
        );
        TriangleMesh::new(vertices, indices)
    }

    /// Export as a binary STL. Facet normals are computed from the winding.
    #[allow(clippy::unnecessary_cast)]
    pub fn to_stl_binary(&self) -> Result<Vec<u8>> {
        let triangles: Vec<Triangle> = self
            .triangles()
            .map(|[a, b, c]| {
                let n = (b - a).cross(&(c - a)).try_normalize(0.0).unwrap_or_else(Vector3::zeros);
                Triangle {
                    normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: [a, b, c].map(|p| Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
                }
            })
            .collect();

        let mut cursor = Cursor::new(Vec::new());
        stl_io::write_stl(&mut cursor, triangles.iter())?;
        Ok(cursor.into_inner())
    }
}
