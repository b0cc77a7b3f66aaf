//! PlanarGraph - the editable point/edge set.
//!
//! Owns the points and user-drawn boundary edges, enforces the non-crossing
//! invariant on insertion, and re-indexes on deletion. Points are addressed
//! by dense index; removing point i shifts every higher index down by one.
//! Edges are addressed by their position in the edge list.
//!
//! Mutations mark the spatial index dirty; hover queries rebuild it lazily.

use crate::geometry;
use crate::spatial::SpatialIndex;

/// The editable planar graph.
pub struct PlanarGraph {
    /// Point positions in device coordinates.
    points: Vec<[f32; 2]>,
    /// Unordered endpoint index pairs.
    edges: Vec<[u32; 2]>,
    /// Hover hit-testing index.
    spatial: SpatialIndex,
    /// Whether the spatial index needs rebuilding.
    spatial_dirty: bool,
}

impl PlanarGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            edges: Vec::new(),
            spatial: SpatialIndex::new(),
            spatial_dirty: false,
        }
    }

    // =========================================================================
    // Point Operations
    // =========================================================================

    /// Append a point. Always succeeds and returns the new index.
    pub fn add_point(&mut self, p: [f32; 2]) -> usize {
        self.points.push(p);
        self.spatial_dirty = true;
        self.points.len() - 1
    }

    /// Remove point `i`, every edge referencing it, and shift higher point
    /// indices down.
    ///
    /// The survivor edge list is built in full before any state is replaced,
    /// so callers observe either the complete post-state or, for an
    /// out-of-range index, no change at all.
    pub fn remove_point(&mut self, i: usize) -> bool {
        if i >= self.points.len() {
            return false;
        }
        let removed = i as u32;
        let shift = |v: u32| if v > removed { v - 1 } else { v };

        let survivors: Vec<[u32; 2]> = self
            .edges
            .iter()
            .filter(|e| e[0] != removed && e[1] != removed)
            .map(|e| [shift(e[0]), shift(e[1])])
            .collect();

        self.points.remove(i);
        self.edges = survivors;
        self.spatial_dirty = true;
        true
    }

    /// Get the number of points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Whether the segment between points `i` and `j` may become an edge.
    ///
    /// Rejects candidates that duplicate an existing edge, cross any edge
    /// they do not share an endpoint with, or pass through a third point
    /// within tolerance. O(E + P) per candidate.
    pub fn is_valid_edge(&self, i: usize, j: usize) -> bool {
        if i == j || i >= self.points.len() || j >= self.points.len() {
            return false;
        }
        let (ei, ej) = (i as u32, j as u32);
        let a = self.points[i];
        let b = self.points[j];

        for e in &self.edges {
            if (e[0] == ei && e[1] == ej) || (e[0] == ej && e[1] == ei) {
                return false;
            }
            if e[0] == ei || e[0] == ej || e[1] == ei || e[1] == ej {
                continue;
            }
            let p = self.points[e[0] as usize];
            let q = self.points[e[1] as usize];
            if geometry::segments_intersect(a, b, p, q) {
                return false;
            }
        }

        for (k, &p) in self.points.iter().enumerate() {
            if k == i || k == j {
                continue;
            }
            if geometry::point_on_segment(a, b, p, geometry::EPSILON) {
                return false;
            }
        }
        true
    }

    /// Insert edge (i, j) if valid.
    ///
    /// Invalid candidates are rejected with no state change.
    pub fn add_edge(&mut self, i: usize, j: usize) -> bool {
        if !self.is_valid_edge(i, j) {
            return false;
        }
        self.edges.push([i as u32, j as u32]);
        self.spatial_dirty = true;
        true
    }

    /// Remove edge `k` by position. No re-indexing is needed.
    pub fn remove_edge(&mut self, k: usize) -> bool {
        if k >= self.edges.len() {
            return false;
        }
        self.edges.remove(k);
        self.spatial_dirty = true;
        true
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // =========================================================================
    // Hover Queries
    // =========================================================================

    /// Nearest point within `radius` of `pos`, if any.
    pub fn nearest_point_within(&mut self, pos: [f32; 2], radius: f32) -> Option<usize> {
        self.refresh_spatial();
        self.spatial
            .nearest_point_within(pos, radius)
            .map(|i| i as usize)
    }

    /// Nearest edge within `radius` of `pos`, by point-to-segment distance.
    pub fn nearest_edge_within(&mut self, pos: [f32; 2], radius: f32) -> Option<usize> {
        self.refresh_spatial();
        self.spatial
            .nearest_edge_within(pos, radius)
            .map(|k| k as usize)
    }

    fn refresh_spatial(&mut self) {
        if self.spatial_dirty {
            self.spatial.rebuild(&self.points, &self.edges);
            self.spatial_dirty = false;
        }
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    /// Point positions slice.
    pub fn points(&self) -> &[[f32; 2]] {
        &self.points
    }

    /// Edge endpoint pairs slice.
    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }
}

impl Default for PlanarGraph {
    fn default() -> Self {
        Self::new()
    }
}
