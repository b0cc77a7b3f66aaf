//! EditorController - the pointer-event state machine.
//!
//! Interprets pointer samples (cursor position plus button state) against
//! the planar graph:
//! - press on empty space adds a point
//! - press on a highlighted edge deletes it
//! - press on a point starts dragging a candidate edge
//! - release back on the drag's start point deletes that point
//! - release on a different point proposes an edge (silently dropped when
//!   the graph rejects it)
//!
//! Hover highlighting is recomputed on every sample; point hits win over
//! edge hits. The caller re-triangulates whenever a call reports a
//! topology change.

use crate::graph::PlanarGraph;

/// Hover radius in device units.
pub const SELECT_RADIUS: f32 = 0.05;

/// What the cursor is currently over. At most one target is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hover {
    /// Nothing within the selection radius.
    #[default]
    None,
    /// A point, by index.
    Point(usize),
    /// An edge, by position in the edge list.
    Edge(usize),
}

/// Editing mode. `DraggingEdge` tracks the candidate edge from `start` to
/// the live cursor position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorMode {
    Idle,
    DraggingEdge { start: usize, live_end: [f32; 2] },
}

/// Pointer-event interpreter for editing mode.
pub struct EditorController {
    mode: EditorMode,
    hover: Hover,
    last_pressed: bool,
}

impl EditorController {
    /// Create a controller in the idle state.
    pub fn new() -> Self {
        Self {
            mode: EditorMode::Idle,
            hover: Hover::None,
            last_pressed: false,
        }
    }

    /// Feed one pointer sample.
    ///
    /// Returns true when the graph topology changed and the cell partition
    /// must be recomputed before the next render.
    pub fn handle_pointer(
        &mut self,
        graph: &mut PlanarGraph,
        cursor: [f32; 2],
        pressed: bool,
    ) -> bool {
        self.update_hover(graph, cursor);

        let went_down = pressed && !self.last_pressed;
        let went_up = !pressed && self.last_pressed;
        self.last_pressed = pressed;

        if went_down {
            return self.press(graph, cursor);
        }
        if went_up {
            return self.release(graph);
        }
        if pressed {
            if let EditorMode::DraggingEdge { live_end, .. } = &mut self.mode {
                *live_end = cursor;
            }
        }
        false
    }

    fn update_hover(&mut self, graph: &mut PlanarGraph, cursor: [f32; 2]) {
        self.hover = if let Some(i) = graph.nearest_point_within(cursor, SELECT_RADIUS) {
            Hover::Point(i)
        } else if let Some(k) = graph.nearest_edge_within(cursor, SELECT_RADIUS) {
            Hover::Edge(k)
        } else {
            Hover::None
        };
    }

    fn press(&mut self, graph: &mut PlanarGraph, cursor: [f32; 2]) -> bool {
        match self.hover {
            Hover::Edge(k) => {
                let changed = graph.remove_edge(k);
                self.hover = Hover::None;
                changed
            }
            Hover::None => {
                graph.add_point(cursor);
                true
            }
            Hover::Point(i) => {
                self.mode = EditorMode::DraggingEdge {
                    start: i,
                    live_end: cursor,
                };
                false
            }
        }
    }

    /// Release ends an active drag. Two gestures share the release edge:
    /// releasing back on the start point deletes it, releasing on another
    /// point proposes a new edge.
    fn release(&mut self, graph: &mut PlanarGraph) -> bool {
        let EditorMode::DraggingEdge { start, .. } = self.mode else {
            return false;
        };
        self.mode = EditorMode::Idle;
        match self.hover {
            Hover::Point(i) if i == start => self.release_deletes_start(graph, i),
            Hover::Point(i) => self.release_connects_to(graph, start, i),
            _ => false,
        }
    }

    fn release_deletes_start(&mut self, graph: &mut PlanarGraph, start: usize) -> bool {
        let changed = graph.remove_point(start);
        self.hover = Hover::None;
        changed
    }

    fn release_connects_to(&mut self, graph: &mut PlanarGraph, start: usize, end: usize) -> bool {
        graph.add_edge(start, end)
    }

    /// Current hover target.
    pub fn hover(&self) -> Hover {
        self.hover
    }

    /// Current editing mode.
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Highlighted point index, if any.
    pub fn highlight_point(&self) -> Option<usize> {
        match self.hover {
            Hover::Point(i) => Some(i),
            _ => None,
        }
    }

    /// Highlighted edge index, if any.
    pub fn highlight_edge(&self) -> Option<usize> {
        match self.hover {
            Hover::Edge(k) => Some(k),
            _ => None,
        }
    }

    /// Endpoints of the candidate edge being dragged, if a drag is active.
    pub fn active_segment(&self, graph: &PlanarGraph) -> Option<[[f32; 2]; 2]> {
        if let EditorMode::DraggingEdge { start, live_end } = self.mode {
            graph.points().get(start).map(|&p| [p, live_end])
        } else {
            None
        }
    }

    /// Drop hover and drag state, e.g. when leaving editing mode.
    pub fn reset(&mut self) {
        self.mode = EditorMode::Idle;
        self.hover = Hover::None;
        self.last_pressed = false;
    }
}

impl Default for EditorController {
    fn default() -> Self {
        Self::new()
    }
}
