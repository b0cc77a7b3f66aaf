//! Planar graph model and cell partitioning.
//!
//! The editable point/edge set with its non-crossing invariant, and the
//! constrained-Delaunay partition into interior and exterior cells derived
//! from it after every topology change.

mod planar;
mod triangulate;

pub use planar::PlanarGraph;
pub use triangulate::{CellPartition, FRAME_EXTENT, frame_corners, triangulate};
