//! Plane **cross-sections** of triangle meshes, turned into solid 2D polygons
//! that a player can inhabit, and mapped back into the 3D world afterwards.
//!
//! The pipeline for one slice:
//!
//! 1. [`SliceBasis::capture`] fixes an orthonormal frame on the cutting plane
//!    from aim state.
//! 2. [`mesh::intersect::intersect_plane`] cuts every triangle into raw 3D
//!    segments.
//! 3. The segments are projected into slice space and stitched into closed
//!    loops by [`sketch::LoopAssembler`].
//! 4. [`sketch::PolygonResolver`] classifies loops as outer boundaries or
//!    holes and cuts the holes out.
//! 5. On exit, [`session::ReturnMapper`] maps the 2D displacement back through
//!    the *same* basis and snaps the result onto the ground.
//!
//! [`slicer::slice_meshes`] runs steps 2 to 4 and
//! [`session::SliceController`] drives the whole session.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` import/export
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon to intersect triangles in parallel

#![forbid(unsafe_code)]
#![warn(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod basis;
pub mod config;
pub mod errors;
pub mod float_types;
pub mod io;
pub mod mesh;
pub mod session;
pub mod sketch;
pub mod slicer;

#[cfg(any(
    all(feature = "f64", feature = "f32"),
    not(any(feature = "f64", feature = "f32"))
))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use basis::{AimState, BasisMode, NormalSource, SliceBasis, TangentReference};
pub use config::SliceConfig;
pub use errors::{Result, SliceError};
pub use mesh::{TriangleMesh, intersect::Segment, plane::Plane};
pub use session::{GroundHit, GroundProbe, MappedReturn, SliceController, SliceSession};
pub use sketch::{Loop, SolidPolygon};
pub use slicer::{CrossSection, SliceStats, slice_mesh, slice_meshes};
