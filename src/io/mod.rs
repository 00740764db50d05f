//! Mesh import and export.
//!
//! Formats are behind cargo features; with a feature disabled the matching
//! methods on [`TriangleMesh`](crate::mesh::TriangleMesh) do not exist.

#[cfg(feature = "stl-io")]
mod stl;
