//! Pointer-driven mesh editing.
//!
//! The editor state machine that turns pointer samples into graph
//! mutations: adding points, proposing edges by dragging, and deleting
//! points or edges.

mod controller;

pub use controller::{EditorController, EditorMode, Hover, SELECT_RADIUS};
