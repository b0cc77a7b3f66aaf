//! Softmesh - WASM Module
//!
//! Interactive planar mesh editing and soft-body deformation, compiled to
//! WebAssembly. The host page owns the canvas, textures, and control panel;
//! this module owns geometry, topology, and simulation state, and hands the
//! renderer read-only typed-array views of its buffers.
//!
//! # Architecture
//!
//! - `geometry`: pure 2D primitives (distances, intersections)
//! - `graph`: the planar point/edge model and its Delaunay cell partition
//! - `spatial`: R-tree hit testing for hover selection
//! - `editor`: the pointer-driven editing state machine
//! - `sim`: the mass-spring deformation simulation

use js_sys::{Float32Array, Uint32Array};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

pub mod editor;
pub mod geometry;
pub mod graph;
pub mod sim;
pub mod spatial;

use editor::EditorController;
use graph::{CellPartition, PlanarGraph, frame_corners, triangulate};
use sim::{SimParams, SoftBody};

/// Impulse radius for cursor punches in simulation mode, in device units.
const CURSOR_PUNCH_RADIUS: f32 = 0.1;

/// Initialize the WASM module: route panics to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Persisted scene layout.
///
/// Field-for-field compatible with the editor's JSON export: simulation
/// parameters plus the point set and the interior cells they triangulate
/// into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    pub damping: f32,
    pub solve_steps: u32,
    pub restore: f32,
    pub points: Vec<[f32; 2]>,
    pub cells: Vec<[u32; 3]>,
}

/// Main entry point for the mesh editor and simulation.
///
/// This struct wraps the internal editor, graph, and simulation state and
/// provides the public API exposed to JavaScript. Editing and simulation
/// are mutually exclusive modes; entering simulation snapshots the current
/// mesh, leaving it discards the snapshot.
#[wasm_bindgen]
pub struct SoftmeshWasm {
    graph: PlanarGraph,
    editor: EditorController,
    cells: CellPartition,
    /// Point positions followed by the frame corners, interleaved, for the
    /// exterior cell overlay.
    overlay: Vec<f32>,
    sim: Option<SoftBody>,
    params: SimParams,
    punch_scale: f32,
    viewport: [f32; 2],
}

#[wasm_bindgen]
impl SoftmeshWasm {
    /// Create an empty editor.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let mut editor = Self {
            graph: PlanarGraph::new(),
            editor: EditorController::new(),
            cells: CellPartition::default(),
            overlay: Vec::new(),
            sim: None,
            params: SimParams::default(),
            punch_scale: 0.01,
            viewport: [1.0, 1.0],
        };
        editor.refresh_cells();
        editor
    }

    /// Set the viewport size used to normalize pointer coordinates.
    ///
    /// Call whenever the host canvas resizes. Non-positive dimensions are
    /// ignored.
    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.viewport = [width, height];
        }
    }

    // =========================================================================
    // Pointer Input
    // =========================================================================

    /// Feed one pointer sample in screen pixels, once per frame.
    ///
    /// In editing mode this drives the editor state machine and recomputes
    /// the cell partition after topology changes. In simulation mode a
    /// held button punches the mesh at the cursor with a random impulse
    /// scaled by the punch setting.
    pub fn pointer(&mut self, x: f32, y: f32, pressed: bool) {
        let cursor = self.normalize(x, y);
        if let Some(body) = &mut self.sim {
            if pressed {
                body.punch(cursor, random_impulse(self.punch_scale), CURSOR_PUNCH_RADIUS);
            }
            return;
        }
        if self.editor.handle_pointer(&mut self.graph, cursor, pressed) {
            self.refresh_cells();
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Toggle simulation mode.
    ///
    /// Switching on snapshots the current points and interior cells into a
    /// fresh simulation; switching off discards it. Deformed positions are
    /// never merged back into the editable mesh.
    #[wasm_bindgen(js_name = setSimulate)]
    pub fn set_simulate(&mut self, on: bool) {
        if on {
            if self.sim.is_none() {
                self.sim = Some(SoftBody::new(self.graph.points(), &self.cells.interior));
            }
        } else {
            self.sim = None;
            self.editor.reset();
        }
    }

    /// Whether simulation mode is active.
    #[wasm_bindgen(js_name = isSimulating)]
    pub fn is_simulating(&self) -> bool {
        self.sim.is_some()
    }

    /// Set the per-tick velocity retention, clamped to 0..1.
    #[wasm_bindgen(js_name = setDamping)]
    pub fn set_damping(&mut self, damping: f32) {
        self.params.damping = damping.clamp(0.0, 1.0);
    }

    /// Set the constraint passes per tick, clamped to 0..32.
    #[wasm_bindgen(js_name = setSolveSteps)]
    pub fn set_solve_steps(&mut self, solve_steps: u32) {
        self.params.solve_steps = solve_steps.min(32);
    }

    /// Set the rest-position pull per tick, clamped to 0..1.
    #[wasm_bindgen(js_name = setRestore)]
    pub fn set_restore(&mut self, restore: f32) {
        self.params.restore = restore.clamp(0.0, 1.0);
    }

    /// Set the cursor punch magnitude, clamped to 0..2.
    #[wasm_bindgen(js_name = setPunch)]
    pub fn set_punch(&mut self, punch: f32) {
        self.punch_scale = punch.clamp(0.0, 2.0);
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advance the simulation one tick. No-op outside simulation mode.
    pub fn step(&mut self) {
        if let Some(body) = &mut self.sim {
            body.step(&self.params);
        }
    }

    /// Inject an impulse directly, in device coordinates.
    ///
    /// For hosts that drive their own punch model instead of the built-in
    /// cursor punches. No-op outside simulation mode.
    pub fn punch(&mut self, x: f32, y: f32, fx: f32, fy: f32, radius: f32) {
        if let Some(body) = &mut self.sim {
            body.punch([x, y], [fx, fy], radius);
        }
    }

    /// Hold a simulated point at its rest position.
    #[wasm_bindgen(js_name = pinPoint)]
    pub fn pin_point(&mut self, index: u32) {
        if let Some(body) = &mut self.sim {
            body.pin(index as usize);
        }
    }

    /// Release a pinned point.
    #[wasm_bindgen(js_name = unpinPoint)]
    pub fn unpin_point(&mut self, index: u32) {
        if let Some(body) = &mut self.sim {
            body.unpin(index as usize);
        }
    }

    // =========================================================================
    // Scene Exchange
    // =========================================================================

    /// Export the current scene as `{damping, solveSteps, restore, points,
    /// cells}`, with `cells` holding the interior cells.
    #[wasm_bindgen(js_name = exportScene)]
    pub fn export_scene(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.snapshot()).map_err(Into::into)
    }

    /// Load an exported scene and enter simulation mode over its mesh.
    ///
    /// Returns false and leaves all state unchanged when the value does not
    /// match the exported layout.
    #[wasm_bindgen(js_name = loadScene)]
    pub fn load_scene(&mut self, value: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<SceneSnapshot>(value) {
            Ok(snapshot) => {
                self.load_snapshot(snapshot);
                true
            }
            Err(err) => {
                web_sys::console::warn_1(&format!("scene load rejected: {err}").into());
                false
            }
        }
    }

    // =========================================================================
    // Render Views
    // =========================================================================

    /// Get the number of editable points.
    #[wasm_bindgen(js_name = pointCount)]
    pub fn point_count(&self) -> u32 {
        self.graph.point_count() as u32
    }

    /// Get the number of user-drawn edges.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.graph.edge_count() as u32
    }

    /// Get the number of interior cells.
    #[wasm_bindgen(js_name = interiorCellCount)]
    pub fn interior_cell_count(&self) -> u32 {
        self.cells.interior.len() as u32
    }

    /// Get the number of exterior cells.
    #[wasm_bindgen(js_name = exteriorCellCount)]
    pub fn exterior_cell_count(&self) -> u32 {
        self.cells.exterior.len() as u32
    }

    /// Get a zero-copy view of the editable point positions [x0, y0, ...].
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = pointsView)]
    pub fn points_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.graph.points().as_flattened()) }
    }

    /// Get a zero-copy view of the edge index pairs [s0, t0, s1, t1, ...].
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    #[wasm_bindgen(js_name = edgesView)]
    pub fn edges_view(&self) -> Uint32Array {
        unsafe { Uint32Array::view(self.graph.edges().as_flattened()) }
    }

    /// Get a zero-copy view of the overlay positions: the points followed
    /// by the four frame corners. Exterior cell indices resolve against
    /// this buffer.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    #[wasm_bindgen(js_name = overlayPositionsView)]
    pub fn overlay_positions_view(&self) -> Float32Array {
        unsafe { Float32Array::view(&self.overlay) }
    }

    /// Get a zero-copy view of the interior cell triples.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    #[wasm_bindgen(js_name = interiorCellsView)]
    pub fn interior_cells_view(&self) -> Uint32Array {
        unsafe { Uint32Array::view(self.cells.interior_flat()) }
    }

    /// Get a zero-copy view of the exterior cell triples.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    #[wasm_bindgen(js_name = exteriorCellsView)]
    pub fn exterior_cells_view(&self) -> Uint32Array {
        unsafe { Uint32Array::view(self.cells.exterior_flat()) }
    }

    /// Get the highlighted point index, if any.
    #[wasm_bindgen(js_name = highlightPoint)]
    pub fn highlight_point(&self) -> Option<u32> {
        self.editor.highlight_point().map(|i| i as u32)
    }

    /// Get the highlighted edge index, if any.
    #[wasm_bindgen(js_name = highlightEdge)]
    pub fn highlight_edge(&self) -> Option<u32> {
        self.editor.highlight_edge().map(|k| k as u32)
    }

    /// Get the active drag segment as [sx, sy, ex, ey], if a drag is in
    /// progress.
    #[wasm_bindgen(js_name = activeEdge)]
    pub fn active_edge(&self) -> Option<Vec<f32>> {
        self.editor
            .active_segment(&self.graph)
            .map(|[s, e]| vec![s[0], s[1], e[0], e[1]])
    }

    /// Get the number of simulated points.
    #[wasm_bindgen(js_name = simPointCount)]
    pub fn sim_point_count(&self) -> u32 {
        self.sim.as_ref().map_or(0, |body| body.point_count() as u32)
    }

    /// Get the number of structural links.
    #[wasm_bindgen(js_name = linkCount)]
    pub fn link_count(&self) -> u32 {
        self.sim.as_ref().map_or(0, |body| body.links().len() as u32)
    }

    /// Get a zero-copy view of the simulated positions. Empty outside
    /// simulation mode.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    #[wasm_bindgen(js_name = simPositionsView)]
    pub fn sim_positions_view(&self) -> Float32Array {
        match &self.sim {
            Some(body) => unsafe { Float32Array::view(body.positions().as_flattened()) },
            None => Float32Array::new_with_length(0),
        }
    }

    /// Get a zero-copy view of the rest positions, e.g. for texture
    /// coordinates. Empty outside simulation mode.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    #[wasm_bindgen(js_name = simRestView)]
    pub fn sim_rest_view(&self) -> Float32Array {
        match &self.sim {
            Some(body) => unsafe { Float32Array::view(body.rest_positions().as_flattened()) },
            None => Float32Array::new_with_length(0),
        }
    }

    /// Get a zero-copy view of the per-point bruise intensities in [0, 1].
    /// Empty outside simulation mode.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    #[wasm_bindgen(js_name = simBruiseView)]
    pub fn sim_bruise_view(&self) -> Float32Array {
        match &self.sim {
            Some(body) => unsafe { Float32Array::view(body.bruise()) },
            None => Float32Array::new_with_length(0),
        }
    }

    /// Get a zero-copy view of the simulated mesh cells. Empty outside
    /// simulation mode.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    #[wasm_bindgen(js_name = simCellsView)]
    pub fn sim_cells_view(&self) -> Uint32Array {
        match &self.sim {
            Some(body) => unsafe { Uint32Array::view(body.cells().as_flattened()) },
            None => Uint32Array::new_with_length(0),
        }
    }
}

impl SoftmeshWasm {
    /// Recompute the cell partition and the overlay buffer. Called after
    /// every topology change, before the next render view is taken.
    fn refresh_cells(&mut self) {
        self.cells = triangulate(self.graph.points(), self.graph.edges());
        self.overlay.clear();
        for p in self.graph.points().iter().chain(frame_corners().iter()) {
            self.overlay.extend_from_slice(p);
        }
    }

    /// Screen pixels to device coordinates, y up.
    fn normalize(&self, x: f32, y: f32) -> [f32; 2] {
        [
            2.0 * x / self.viewport[0] - 1.0,
            1.0 - 2.0 * y / self.viewport[1],
        ]
    }

    fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            damping: self.params.damping,
            solve_steps: self.params.solve_steps,
            restore: self.params.restore,
            points: self.graph.points().to_vec(),
            cells: self.cells.interior.clone(),
        }
    }

    /// Adopt a snapshot's parameters and simulate its mesh directly, the
    /// way the standalone player consumes exported scenes.
    fn load_snapshot(&mut self, snapshot: SceneSnapshot) {
        self.params.damping = snapshot.damping.clamp(0.0, 1.0);
        self.params.solve_steps = snapshot.solve_steps.min(32);
        self.params.restore = snapshot.restore.clamp(0.0, 1.0);
        self.sim = Some(SoftBody::new(&snapshot.points, &snapshot.cells));
        self.editor.reset();
    }
}

impl Default for SoftmeshWasm {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-axis impulse in [-scale/2, scale/2), like the control panel's
/// simulated cursor punches.
fn random_impulse(scale: f32) -> [f32; 2] {
    [
        scale * (js_sys::Math::random() as f32 - 0.5),
        scale * (js_sys::Math::random() as f32 - 0.5),
    ]
}
