//! Spatial indexing for hover hit-testing.
//!
//! R*-trees over the planar graph's points and edge segments, rebuilt
//! wholesale after topology changes.

mod rtree;

pub use rtree::{PointTarget, SegmentTarget, SpatialIndex};
