//! 2D side of the pipeline: loops, solid polygons, and the stages that build
//! them from raw segments.

pub mod assemble;
pub mod polygon;
pub mod resolve;

pub use assemble::{LoopAssembler, Segment2, assemble_loops};
pub use polygon::{Loop, PointLocation, SolidPolygon};
pub use resolve::{PolygonResolver, resolve};
