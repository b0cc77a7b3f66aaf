//! SoftBody - mass-spring simulation over a triangulated mesh.
//!
//! State is a snapshot: it owns copies of the creation-time positions and
//! never aliases editor memory. Each tick integrates every point
//! (semi-implicit Verlet with damping and a restoring pull toward the rest
//! position), then runs full relaxation passes over the link list. Links
//! are the deduplicated undirected 1-skeleton of the cells, each carrying
//! the rest length measured at creation.

use crate::geometry;

/// Bruise intensity deposited by a punch at full weight.
const BRUISE_GAIN: f32 = 0.1;

/// Per-tick simulation parameters.
///
/// Owned by the caller and read on every step, so the control panel can
/// change them between ticks.
#[derive(Debug, Clone, Copy)]
pub struct SimParams {
    /// Velocity retention per tick, 0..1.
    pub damping: f32,
    /// Full constraint-relaxation passes per tick. Zero is valid: only
    /// integration and the restoring force run.
    pub solve_steps: u32,
    /// Pull toward the rest position per tick, 0..1.
    pub restore: f32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            damping: 0.99,
            solve_steps: 4,
            restore: 0.01,
        }
    }
}

/// A distance constraint between two point indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    /// First endpoint (the smaller index).
    pub s: u32,
    /// Second endpoint.
    pub t: u32,
    /// Rest length, fixed at creation.
    pub rest: f32,
}

/// Simulation state over a frozen (points, cells) snapshot.
pub struct SoftBody {
    /// Current positions.
    curr: Vec<[f32; 2]>,
    /// Positions one tick ago; the difference is the Verlet velocity.
    prev: Vec<[f32; 2]>,
    /// Anchor positions for the restoring force.
    rest: Vec<[f32; 2]>,
    /// Force accumulator, consumed and zeroed by the next step.
    forces: Vec<[f32; 2]>,
    /// Accumulated punch damage in [0, 1], for the renderer.
    bruise: Vec<f32>,
    /// Points held at their rest position (boundary conditions).
    pinned: Vec<bool>,
    /// Structural springs.
    links: Vec<Link>,
    /// Mesh topology, kept for rendering; the solve never reads it.
    cells: Vec<[u32; 3]>,
}

impl SoftBody {
    /// Snapshot `points` and derive links from the cell 1-skeleton.
    pub fn new(points: &[[f32; 2]], cells: &[[u32; 3]]) -> Self {
        Self {
            curr: points.to_vec(),
            prev: points.to_vec(),
            rest: points.to_vec(),
            forces: vec![[0.0; 2]; points.len()],
            bruise: vec![0.0; points.len()],
            pinned: vec![false; points.len()],
            links: build_links(points, cells),
            cells: cells.to_vec(),
        }
    }

    /// Advance one tick: integrate, then relax constraints, then re-assert
    /// pinned points.
    pub fn step(&mut self, params: &SimParams) {
        // Every point integrates before any constraint pass runs, so solve
        // order cannot leak into the integration.
        for i in 0..self.curr.len() {
            for k in 0..2 {
                let x = self.curr[i][k];
                let v = x - self.prev[i][k];
                self.curr[i][k] = x
                    + params.damping * v
                    + self.forces[i][k]
                    + params.restore * (self.rest[i][k] - x);
                self.prev[i][k] = x;
                self.forces[i][k] = 0.0;
            }
        }

        // Symmetric half-correction relaxation. Full passes over the link
        // list; the result depends on link order and is only approximately
        // converged after finitely many passes.
        for _ in 0..params.solve_steps {
            for link in &self.links {
                let (s, t) = (link.s as usize, link.t as usize);
                let dx = self.curr[s][0] - self.curr[t][0];
                let dy = self.curr[s][1] - self.curr[t][1];
                let ls = (dx * dx + dy * dy).sqrt();
                if ls == 0.0 {
                    continue;
                }
                let f = 0.5 * (link.rest - ls) / ls;
                self.curr[s][0] += f * dx;
                self.curr[s][1] += f * dy;
                self.curr[t][0] -= f * dx;
                self.curr[t][1] -= f * dy;
            }
        }

        for i in 0..self.curr.len() {
            if self.pinned[i] {
                self.curr[i] = self.rest[i];
                self.prev[i] = self.rest[i];
            }
        }
    }

    /// Add a Gaussian-weighted impulse around `origin`.
    ///
    /// Every point's accumulator receives `force * exp(-d^2 / radius^2)`,
    /// consumed by the next step's integrate phase; punches between ticks
    /// add up. Each punch also deposits bruise intensity proportional to
    /// its weight. A non-positive radius contributes nothing.
    pub fn punch(&mut self, origin: [f32; 2], force: [f32; 2], radius: f32) {
        let r_sq = radius * radius;
        if r_sq <= 0.0 {
            return;
        }
        for i in 0..self.curr.len() {
            let w = (-geometry::dist_sq(self.curr[i], origin) / r_sq).exp();
            self.forces[i][0] += w * force[0];
            self.forces[i][1] += w * force[1];
            self.bruise[i] = (self.bruise[i] + BRUISE_GAIN * w).min(1.0);
        }
    }

    /// Hold point `i` at its rest position. Out of range is a no-op.
    pub fn pin(&mut self, i: usize) {
        if let Some(p) = self.pinned.get_mut(i) {
            *p = true;
        }
    }

    /// Release a pinned point.
    pub fn unpin(&mut self, i: usize) {
        if let Some(p) = self.pinned.get_mut(i) {
            *p = false;
        }
    }

    /// Whether point `i` is pinned.
    pub fn is_pinned(&self, i: usize) -> bool {
        self.pinned.get(i).copied().unwrap_or(false)
    }

    /// Number of simulated points.
    pub fn point_count(&self) -> usize {
        self.curr.len()
    }

    /// Current positions slice.
    pub fn positions(&self) -> &[[f32; 2]] {
        &self.curr
    }

    /// Rest positions slice. Renderers map these to texture coordinates.
    pub fn rest_positions(&self) -> &[[f32; 2]] {
        &self.rest
    }

    /// Per-point bruise intensities in [0, 1].
    pub fn bruise(&self) -> &[f32] {
        &self.bruise
    }

    /// The structural springs.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The mesh cells this body was created from.
    pub fn cells(&self) -> &[[u32; 3]] {
        &self.cells
    }
}

/// Canonicalize every cell edge to (min, max), sort, and collapse runs into
/// one link per distinct pair. Degenerate and out-of-range cell edges are
/// skipped.
fn build_links(points: &[[f32; 2]], cells: &[[u32; 3]]) -> Vec<Link> {
    let mut pairs: Vec<[u32; 2]> = Vec::with_capacity(cells.len() * 3);
    for cell in cells {
        for j in 0..3 {
            let s = cell[j];
            let t = cell[(j + 1) % 3];
            if s == t || s as usize >= points.len() || t as usize >= points.len() {
                continue;
            }
            pairs.push([s.min(t), s.max(t)]);
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
    pairs
        .into_iter()
        .map(|[s, t]| Link {
            s,
            t,
            rest: geometry::dist(points[s as usize], points[t as usize]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles sharing the 1-2 edge.
    fn quad_body() -> SoftBody {
        let points = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5], [1.0, 0.5]];
        let cells = [[0u32, 1, 2], [1, 3, 2]];
        SoftBody::new(&points, &cells)
    }

    fn frozen() -> SimParams {
        SimParams {
            damping: 0.0,
            solve_steps: 0,
            restore: 0.0,
        }
    }

    fn max_rest_distance(body: &SoftBody) -> f32 {
        body.positions()
            .iter()
            .zip(body.rest_positions())
            .map(|(&p, &r)| geometry::dist(p, r))
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_links_deduplicated_with_rest_lengths() {
        let body = quad_body();

        // 6 directed cell edges collapse to 5 undirected links
        assert_eq!(body.links().len(), 5);
        for (x, a) in body.links().iter().enumerate() {
            assert!(a.s < a.t);
            for b in body.links().iter().skip(x + 1) {
                assert!((a.s, a.t) != (b.s, b.t), "duplicate link {a:?}");
            }
        }

        let points = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5], [1.0, 0.5]];
        for link in body.links() {
            let expected = geometry::dist(points[link.s as usize], points[link.t as usize]);
            assert!((link.rest - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_cells_make_no_links() {
        let points = [[0.0, 0.0], [1.0, 0.0]];
        let body = SoftBody::new(&points, &[[0, 0, 1], [0, 1, 9]]);
        // Only the 0-1 pair survives, once
        assert_eq!(body.links(), &[Link { s: 0, t: 1, rest: 1.0 }]);
    }

    #[test]
    fn test_step_at_rest_is_identity() {
        let mut body = quad_body();
        let before = body.positions().to_vec();

        body.step(&frozen());
        body.step(&frozen());

        assert_eq!(body.positions(), &before[..]);
    }

    #[test]
    fn test_zero_solve_steps_is_valid() {
        let mut body = quad_body();
        body.punch([-0.5, -0.5], [0.05, 0.0], 0.1);
        body.step(&SimParams {
            damping: 0.5,
            solve_steps: 0,
            restore: 0.1,
        });
        for p in body.positions() {
            assert!(p[0].is_finite() && p[1].is_finite());
        }
    }

    #[test]
    fn test_restore_converges_to_rest() {
        // Three loose points, no links
        let points = [[-0.3, 0.0], [0.0, 0.2], [0.4, -0.1]];
        let mut body = SoftBody::new(&points, &[]);

        // Knock everything sideways, then let only the restoring force act
        body.punch([0.0, 0.0], [0.2, 0.1], 10.0);
        body.step(&frozen());
        assert!(max_rest_distance(&body) > 0.05);

        let params = SimParams {
            damping: 0.0,
            solve_steps: 0,
            restore: 0.5,
        };
        let mut last = max_rest_distance(&body);
        for _ in 0..20 {
            body.step(&params);
            let now = max_rest_distance(&body);
            assert!(now <= last + 1e-6);
            last = now;
        }
        assert!(last < 1e-3);
    }

    #[test]
    fn test_punch_locality() {
        let points = [[-0.9, 0.0], [0.9, 0.0]];
        let mut body = SoftBody::new(&points, &[]);

        body.punch([-0.9, 0.0], [0.1, 0.0], 0.1);
        body.step(&frozen());

        let near = geometry::dist(body.positions()[0], points[0]);
        let far = geometry::dist(body.positions()[1], points[1]);
        assert!((near - 0.1).abs() < 1e-4);
        assert!(far < 1e-6);
    }

    #[test]
    fn test_punches_accumulate_between_ticks() {
        let points = [[0.0, 0.0]];
        let mut one = SoftBody::new(&points, &[]);
        let mut two = SoftBody::new(&points, &[]);

        one.punch([0.0, 0.0], [0.03, 0.0], 0.2);
        two.punch([0.0, 0.0], [0.03, 0.0], 0.2);
        two.punch([0.0, 0.0], [0.03, 0.0], 0.2);
        one.step(&frozen());
        two.step(&frozen());

        let dx_one = one.positions()[0][0];
        let dx_two = two.positions()[0][0];
        assert!((dx_two - 2.0 * dx_one).abs() < 1e-6);
    }

    #[test]
    fn test_force_consumed_by_step() {
        let points = [[0.0, 0.0]];
        let mut body = SoftBody::new(&points, &[]);

        body.punch([0.0, 0.0], [0.05, 0.0], 0.2);
        body.step(&frozen());
        let after_first = body.positions()[0][0];

        // Damping 0 kills the velocity and the force is spent; nothing moves
        body.step(&frozen());
        assert_eq!(body.positions()[0][0], after_first);
    }

    #[test]
    fn test_constraints_pull_links_back_toward_rest() {
        let mut relaxed = quad_body();
        let mut unrelaxed = quad_body();

        for body in [&mut relaxed, &mut unrelaxed] {
            body.punch([0.0, 0.5], [0.3, 0.2], 0.15);
        }
        relaxed.step(&SimParams {
            damping: 0.0,
            solve_steps: 8,
            restore: 0.0,
        });
        unrelaxed.step(&frozen());

        let deviation = |body: &SoftBody| -> f32 {
            body.links()
                .iter()
                .map(|l| {
                    let ls = geometry::dist(
                        body.positions()[l.s as usize],
                        body.positions()[l.t as usize],
                    );
                    (ls - l.rest).abs()
                })
                .fold(0.0, f32::max)
        };
        assert!(deviation(&relaxed) < deviation(&unrelaxed));
    }

    #[test]
    fn test_coincident_link_endpoints_are_skipped() {
        // Two coincident points joined by a zero-rest link
        let points = [[0.0, 0.0], [0.0, 0.0], [0.5, 0.0]];
        let mut body = SoftBody::new(&points, &[[0, 1, 2]]);

        body.step(&SimParams {
            damping: 0.9,
            solve_steps: 4,
            restore: 0.01,
        });
        for p in body.positions() {
            assert!(p[0].is_finite() && p[1].is_finite());
        }
    }

    #[test]
    fn test_pinned_point_holds_under_punches() {
        let mut body = quad_body();
        body.pin(0);
        assert!(body.is_pinned(0));

        body.punch([-0.5, -0.5], [0.2, 0.2], 1.0);
        for _ in 0..5 {
            body.step(&SimParams::default());
        }

        assert_eq!(body.positions()[0], body.rest_positions()[0]);
        // Unpinned neighbors did move
        assert!(geometry::dist(body.positions()[1], body.rest_positions()[1]) > 1e-5);

        body.unpin(0);
        assert!(!body.is_pinned(0));
        // Out-of-range pin requests are ignored
        body.pin(99);
        assert!(!body.is_pinned(99));
    }

    #[test]
    fn test_bruise_accumulates_and_saturates() {
        let points = [[0.0, 0.0], [0.9, 0.0]];
        let mut body = SoftBody::new(&points, &[]);

        body.punch([0.0, 0.0], [0.0, 0.0], 0.1);
        let first = body.bruise()[0];
        assert!(first > 0.09);
        assert!(body.bruise()[1] < 1e-6);

        for _ in 0..30 {
            body.punch([0.0, 0.0], [0.0, 0.0], 0.1);
        }
        assert!(body.bruise()[0] <= 1.0);
        assert!((body.bruise()[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_radius_punch_is_ignored() {
        let points = [[0.0, 0.0]];
        let mut body = SoftBody::new(&points, &[]);
        body.punch([0.0, 0.0], [1.0, 1.0], 0.0);
        body.step(&frozen());
        assert_eq!(body.positions()[0], [0.0, 0.0]);
    }

    #[test]
    fn test_snapshot_does_not_alias_input() {
        let mut points = vec![[0.0, 0.0], [0.5, 0.0]];
        let body = SoftBody::new(&points, &[]);
        points[0] = [9.0, 9.0];
        assert_eq!(body.positions()[0], [0.0, 0.0]);
    }
}
