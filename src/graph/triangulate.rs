//! Constrained Delaunay cell partition.
//!
//! Wraps spade's constrained triangulation: the user points plus four frame
//! corners are triangulated with the user edges as constraints, then faces
//! are classified interior or exterior by region flood fill. Faces touching
//! the triangulation boundary are exterior, a region delimited by
//! constraint edges shares one label, and crossing a constraint edge flips
//! it. The partition is derived data, recomputed wholesale after any
//! topology change.

use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};

/// Half-extent of the bounding frame, in device units.
///
/// Device space is [-1, 1]; the frame sits well outside the canvas so the
/// exterior partition is bounded by it rather than by the convex hull of
/// the user points.
pub const FRAME_EXTENT: f32 = 4.0;

/// The four frame corner positions, indexed after the user points.
pub fn frame_corners() -> [[f32; 2]; 4] {
    [
        [-FRAME_EXTENT, -FRAME_EXTENT],
        [FRAME_EXTENT, -FRAME_EXTENT],
        [FRAME_EXTENT, FRAME_EXTENT],
        [-FRAME_EXTENT, FRAME_EXTENT],
    ]
}

/// Triangulation result split into interior and exterior cells.
///
/// Interior cells reference user points only and feed the simulation and
/// the export. Exterior cells may reference frame corner slots
/// `points.len()..points.len() + 4` and are overlay-only.
#[derive(Debug, Default, Clone)]
pub struct CellPartition {
    /// Triangles enclosed by user-drawn boundary loops.
    pub interior: Vec<[u32; 3]>,
    /// Everything else, out to the bounding frame.
    pub exterior: Vec<[u32; 3]>,
}

impl CellPartition {
    /// Interior cell triples as a flat index list.
    pub fn interior_flat(&self) -> &[u32] {
        self.interior.as_flattened()
    }

    /// Exterior cell triples as a flat index list.
    pub fn exterior_flat(&self) -> &[u32] {
        self.exterior.as_flattened()
    }
}

#[inline]
fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Triangulate `points` with `edges` as constraints and partition the result.
///
/// Degenerate input never fails: fewer than three points, duplicate points,
/// or collinear configurations simply yield smaller (possibly empty) cell
/// sets. Unrepresentable coordinates and unconstrainable edges are skipped.
pub fn triangulate(points: &[[f32; 2]], edges: &[[u32; 2]]) -> CellPartition {
    if points.len() < 3 {
        return CellPartition::default();
    }

    let mut cdt: ConstrainedDelaunayTriangulation<Point2<f32>> =
        ConstrainedDelaunayTriangulation::new();

    // Insert user points, then the frame corners. spade collapses exact
    // duplicates onto the first insertion, so remember which augmented
    // index owns each spade vertex.
    let mut handles: Vec<Option<FixedVertexHandle>> = Vec::with_capacity(points.len() + 4);
    let mut owner: Vec<u32> = Vec::with_capacity(points.len() + 4);
    for (i, p) in points.iter().chain(frame_corners().iter()).enumerate() {
        match cdt.insert(Point2::new(p[0], p[1])) {
            Ok(handle) => {
                if handle.index() == owner.len() {
                    owner.push(i as u32);
                }
                handles.push(Some(handle));
            }
            Err(_) => handles.push(None),
        }
    }

    let mut constraints: HashSet<(usize, usize)> = HashSet::new();
    for e in edges {
        let (Some(&Some(a)), Some(&Some(b))) =
            (handles.get(e[0] as usize), handles.get(e[1] as usize))
        else {
            continue;
        };
        if a != b && cdt.can_add_constraint(a, b) {
            cdt.add_constraint(a, b);
            constraints.insert(pair_key(a.index(), b.index()));
        }
    }

    // Faces as spade vertex index triples, plus the undirected-edge-to-face
    // adjacency needed for the flood fill.
    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(cdt.num_inner_faces());
    for face in cdt.inner_faces() {
        let vs = face.vertices();
        faces.push([
            vs[0].fix().index(),
            vs[1].fix().index(),
            vs[2].fix().index(),
        ]);
    }
    let mut edge_faces: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (f, vs) in faces.iter().enumerate() {
        for j in 0..3 {
            edge_faces
                .entry(pair_key(vs[j], vs[(j + 1) % 3]))
                .or_default()
                .push(f);
        }
    }

    // Region flood fill, seeded at the triangulation boundary. Each region
    // (faces connected without crossing a constraint) gets one label;
    // crossing a constraint edge flips it. First assignment wins, so a
    // region that leaks around the end of an open edge chain stays
    // exterior.
    let mut enclosed: Vec<Option<bool>> = vec![None; faces.len()];
    let mut regions: VecDeque<(usize, bool)> = VecDeque::new();
    for (pair, adjacent) in &edge_faces {
        if adjacent.len() == 1 {
            regions.push_back((adjacent[0], constraints.contains(pair)));
        }
    }
    while let Some((seed, label)) = regions.pop_front() {
        if enclosed[seed].is_some() {
            continue;
        }
        enclosed[seed] = Some(label);
        let mut stack = vec![seed];
        while let Some(f) = stack.pop() {
            let vs = faces[f];
            for j in 0..3 {
                let pair = pair_key(vs[j], vs[(j + 1) % 3]);
                let crossing = constraints.contains(&pair);
                for &g in &edge_faces[&pair] {
                    if g == f || enclosed[g].is_some() {
                        continue;
                    }
                    if crossing {
                        regions.push_back((g, !label));
                    } else {
                        enclosed[g] = Some(label);
                        stack.push(g);
                    }
                }
            }
        }
    }

    let user_count = points.len() as u32;
    let mut partition = CellPartition::default();
    for (f, vs) in faces.iter().enumerate() {
        let cell = [owner[vs[0]], owner[vs[1]], owner[vs[2]]];
        let all_user = cell.iter().all(|&v| v < user_count);
        if enclosed[f] == Some(true) && all_user {
            partition.interior.push(cell);
        } else {
            partition.exterior.push(cell);
        }
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(cell: [u32; 3]) -> [u32; 3] {
        let mut c = cell;
        c.sort_unstable();
        c
    }

    #[test]
    fn test_boundary_triangle_partition() {
        let points = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]];
        let edges = [[0u32, 1], [1, 2], [2, 0]];
        let partition = triangulate(&points, &edges);

        assert_eq!(partition.interior.len(), 1);
        assert_eq!(normalized(partition.interior[0]), [0, 1, 2]);
        assert!(!partition.exterior.is_empty());
    }

    #[test]
    fn test_interior_cells_reference_user_points_only() {
        let points = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]];
        let edges = [[0u32, 1], [1, 2], [2, 0]];
        let partition = triangulate(&points, &edges);

        for cell in &partition.interior {
            for &v in cell {
                assert!((v as usize) < points.len());
            }
        }
        // The exterior reaches the frame
        assert!(
            partition
                .exterior
                .iter()
                .any(|cell| cell.iter().any(|&v| v as usize >= points.len()))
        );
    }

    #[test]
    fn test_too_few_points_yields_empty_partition() {
        assert!(triangulate(&[], &[]).interior.is_empty());
        assert!(triangulate(&[[0.0, 0.0]], &[]).exterior.is_empty());
        let two = [[0.0, 0.0], [0.5, 0.5]];
        let partition = triangulate(&two, &[[0, 1]]);
        assert!(partition.interior.is_empty());
        assert!(partition.exterior.is_empty());
    }

    #[test]
    fn test_no_edges_means_no_interior() {
        let points = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]];
        let partition = triangulate(&points, &[]);

        assert!(partition.interior.is_empty());
        assert!(!partition.exterior.is_empty());
    }

    #[test]
    fn test_open_boundary_has_no_interior() {
        let points = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]];
        // Two sides of the triangle, not closed: the would-be inside leaks
        // around the gap and stays exterior
        let partition = triangulate(&points, &[[0, 1], [1, 2]]);
        assert!(partition.interior.is_empty());
    }

    #[test]
    fn test_square_boundary_two_interior_cells() {
        let points = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];
        let edges = [[0u32, 1], [1, 2], [2, 3], [3, 0]];
        let partition = triangulate(&points, &edges);

        assert_eq!(partition.interior.len(), 2);
        for cell in &partition.interior {
            for &v in cell {
                assert!((v as usize) < points.len());
            }
        }
    }

    #[test]
    fn test_interior_subdivided_by_chord() {
        let points = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];
        // Closed square plus a diagonal chord: both halves stay interior
        let edges = [[0u32, 1], [1, 2], [2, 3], [3, 0], [0, 2]];
        let partition = triangulate(&points, &edges);
        assert_eq!(partition.interior.len(), 2);
    }

    #[test]
    fn test_collinear_points_do_not_crash() {
        let points = [[-0.5, 0.0], [0.0, 0.0], [0.5, 0.0]];
        let partition = triangulate(&points, &[]);
        // Collinear user points still triangulate against the frame
        assert!(partition.interior.is_empty());
    }

    #[test]
    fn test_duplicate_points_do_not_crash() {
        let points = [[0.0, 0.0], [0.0, 0.0], [0.5, 0.0], [0.0, 0.5]];
        let partition = triangulate(&points, &[]);
        for cell in partition.interior.iter().chain(partition.exterior.iter()) {
            for &v in cell {
                assert!((v as usize) < points.len() + 4);
            }
        }
    }

    #[test]
    fn test_dangling_edge_indices_are_skipped() {
        let points = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]];
        let partition = triangulate(&points, &[[0, 42]]);
        assert!(partition.interior.is_empty());
        assert!(!partition.exterior.is_empty());
    }
}
