//! Soft-body deformation simulation.
//!
//! Verlet integration with damping and a rest-position restoring force,
//! plus iterative distance-constraint relaxation over the mesh 1-skeleton.

mod softbody;

pub use softbody::{Link, SimParams, SoftBody};
