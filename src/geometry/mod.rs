//! 2D geometric primitives.
//!
//! Stateless helpers over `[f32; 2]` device coordinates, shared by edge
//! validation, hover hit-testing, and cell classification.

mod primitives;

pub use primitives::{
    EPSILON, dist, dist_sq, point_on_segment, segment_point_distance_sq, segments_intersect,
};
