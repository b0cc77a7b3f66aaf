//! R-tree based spatial index using the rstar crate.
//!
//! Backs the editor's hover queries:
//! - nearest point within the selection radius
//! - nearest edge segment within the selection radius
//!
//! Point hits take priority over edge hits; the controller queries points
//! first and only falls back to segments. Both trees are rebuilt together,
//! since any topology change invalidates positional edge indices anyway.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::geometry;

/// A graph point in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointTarget {
    /// Index into the graph's point list.
    pub index: u32,
    /// Position in device coordinates.
    pub pos: [f32; 2],
}

impl RTreeObject for PointTarget {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for PointTarget {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        geometry::dist_sq(self.pos, *point)
    }
}

/// A graph edge segment in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTarget {
    /// Position of the edge in the graph's edge list.
    pub index: u32,
    /// First endpoint.
    pub a: [f32; 2],
    /// Second endpoint.
    pub b: [f32; 2],
}

impl RTreeObject for SegmentTarget {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.a[0].min(self.b[0]), self.a[1].min(self.b[1])],
            [self.a[0].max(self.b[0]), self.a[1].max(self.b[1])],
        )
    }
}

impl PointDistance for SegmentTarget {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        geometry::segment_point_distance_sq(self.a, self.b, *point)
    }
}

/// Spatial index over a planar graph's points and edges.
pub struct SpatialIndex {
    points: RTree<PointTarget>,
    segments: RTree<SegmentTarget>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self {
            points: RTree::new(),
            segments: RTree::new(),
        }
    }

    /// Rebuild both trees from the graph's current topology.
    ///
    /// Bulk loading beats incremental inserts for wholesale updates. Edges
    /// with out-of-range endpoints are skipped.
    pub fn rebuild(&mut self, points: &[[f32; 2]], edges: &[[u32; 2]]) {
        let point_targets: Vec<_> = points
            .iter()
            .enumerate()
            .map(|(i, &pos)| PointTarget {
                index: i as u32,
                pos,
            })
            .collect();

        let segment_targets: Vec<_> = edges
            .iter()
            .enumerate()
            .filter_map(|(k, e)| {
                let a = *points.get(e[0] as usize)?;
                let b = *points.get(e[1] as usize)?;
                Some(SegmentTarget {
                    index: k as u32,
                    a,
                    b,
                })
            })
            .collect();

        self.points = RTree::bulk_load(point_targets);
        self.segments = RTree::bulk_load(segment_targets);
    }

    /// Find the nearest point within a maximum distance.
    pub fn nearest_point_within(&self, pos: [f32; 2], max_distance: f32) -> Option<u32> {
        let max_distance_sq = max_distance * max_distance;
        self.points
            .nearest_neighbor(&pos)
            .filter(|target| target.distance_2(&pos) <= max_distance_sq)
            .map(|target| target.index)
    }

    /// Find the nearest edge segment within a maximum distance.
    pub fn nearest_edge_within(&self, pos: [f32; 2], max_distance: f32) -> Option<u32> {
        let max_distance_sq = max_distance * max_distance;
        self.segments
            .nearest_neighbor(&pos)
            .filter(|target| target.distance_2(&pos) <= max_distance_sq)
            .map(|target| target.index)
    }

    /// Clear both trees.
    pub fn clear(&mut self) {
        self.points = RTree::new();
        self.segments = RTree::new();
    }

    /// Number of indexed points.
    pub fn point_count(&self) -> usize {
        self.points.size()
    }

    /// Number of indexed segments.
    pub fn segment_count(&self) -> usize {
        self.segments.size()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> SpatialIndex {
        let points = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]];
        let edges = [[0u32, 1], [1, 2]];
        let mut index = SpatialIndex::new();
        index.rebuild(&points, &edges);
        index
    }

    #[test]
    fn test_nearest_point_within() {
        let index = sample_index();

        assert_eq!(index.nearest_point_within([-0.45, -0.5], 0.1), Some(0));
        assert_eq!(index.nearest_point_within([0.02, 0.48], 0.05), Some(2));

        // Nothing close to the middle of the canvas
        assert_eq!(index.nearest_point_within([0.0, 0.0], 0.05), None);
    }

    #[test]
    fn test_nearest_edge_within() {
        let index = sample_index();

        // Just above the bottom edge midpoint
        assert_eq!(index.nearest_edge_within([0.0, -0.48], 0.05), Some(0));

        // Far from both edges
        assert_eq!(index.nearest_edge_within([-0.9, 0.9], 0.05), None);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut index = sample_index();
        index.rebuild(&[[0.9, 0.9]], &[]);

        assert_eq!(index.point_count(), 1);
        assert_eq!(index.segment_count(), 0);
        assert_eq!(index.nearest_point_within([0.9, 0.9], 0.01), Some(0));
        assert_eq!(index.nearest_point_within([-0.5, -0.5], 0.1), None);
    }

    #[test]
    fn test_rebuild_skips_dangling_edges() {
        let mut index = SpatialIndex::new();
        index.rebuild(&[[0.0, 0.0]], &[[0, 9]]);
        assert_eq!(index.segment_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut index = sample_index();
        index.clear();
        assert_eq!(index.point_count(), 0);
        assert_eq!(index.nearest_point_within([-0.5, -0.5], 1.0), None);
    }
}
