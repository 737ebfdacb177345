use egui::{Pos2, Vec2};

use crate::{
    component::{ComponentId, ComponentKind, GridPos, LogicComponent, Rotation, WorkspaceComponent},
    config::WorkspaceConfig,
    grid::{GridPolicy, Placement},
    history::History,
    simulator::{CircuitGraph, OutputValue, SimulationStatus, Value},
    viewport::Viewport,
};

/// Fields a drag or inspector may change without committing an edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentPatch {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub rotation: Option<Rotation>,
}

/// One editing session: the live circuit plus everything needed to edit it.
///
/// Every structural edit (add, remove, rotate, drop, undo, redo, load)
/// commits history and re-evaluates before returning. Drag updates do
/// neither, so values always describe the last committed circuit.
#[derive(Debug)]
pub struct Workspace {
    config: WorkspaceConfig,
    policy: GridPolicy,
    components: Vec<LogicComponent>,
    history: History,
    next_id: u64,
    selected: Option<ComponentId>,
    hovered: Option<ComponentId>,
    viewport: Viewport,
    outputs: Vec<OutputValue>,
    status: SimulationStatus,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(WorkspaceConfig::default())
    }
}

impl Workspace {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            policy: GridPolicy::new(&config),
            history: History::new(&[], config.history_limit),
            viewport: Viewport::new(config.min_zoom, config.max_zoom),
            config,
            components: Vec::new(),
            next_id: 1,
            selected: None,
            hovered: None,
            outputs: Vec::new(),
            status: SimulationStatus::default(),
        }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn policy(&self) -> &GridPolicy {
        &self.policy
    }

    pub fn components(&self) -> &[LogicComponent] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&LogicComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    fn component_mut(&mut self, id: ComponentId) -> Option<&mut LogicComponent> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    /// The live list in its persisted form.
    pub fn snapshot(&self) -> Vec<WorkspaceComponent> {
        self.components.iter().map(WorkspaceComponent::from).collect()
    }

    pub fn output_values(&self) -> &[OutputValue] {
        &self.outputs
    }

    pub fn value_of(&self, id: ComponentId) -> Value {
        self.component(id).map(|c| c.value).unwrap_or(Value::X)
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn selected(&self) -> Option<ComponentId> {
        self.selected
    }

    pub fn hovered(&self) -> Option<ComponentId> {
        self.hovered
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // Editing

    /// Place a new component at the grid point nearest `pos` (world coordinates).
    ///
    /// Returns `None` and leaves the workspace untouched when the point is
    /// reserved or already taken. The reserved area is the panel plus the
    /// first grid column at its edge, where a gate's inputs would overlap the
    /// panel.
    pub fn add(
        &mut self,
        kind: ComponentKind,
        pos: Pos2,
        rotation: Rotation,
    ) -> Option<ComponentId> {
        let target = match self.policy.place(&self.components, pos, None) {
            Placement::Free(target) => target,
            Placement::Reserved(target) => {
                log::debug!("rejected {kind} at {target:?}: reserved panel area");
                return None;
            }
            Placement::Occupied { pos: target, by } => {
                log::debug!("rejected {kind} at {target:?}: occupied by {by}");
                return None;
            }
            Placement::OutOfRange => {
                log::warn!("rejected {kind} at {pos:?}: outside the workspace");
                return None;
            }
        };

        let id = self.allocate_id();
        self.components.push(LogicComponent::new(id, kind, target, rotation));
        log::debug!("added {kind} {id} at {target:?}");
        self.simulate_and_commit();
        Some(id)
    }

    pub fn remove(&mut self, id: ComponentId) -> bool {
        let Some(index) = self.components.iter().position(|c| c.id == id) else {
            log::warn!("remove: no component {id}");
            return false;
        };
        self.components.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        log::debug!("removed {id}");
        self.simulate_and_commit();
        true
    }

    /// Apply a drag-time change. Neither history nor values are touched.
    pub fn update(&mut self, id: ComponentId, patch: ComponentPatch) -> bool {
        let Some(c) = self.component_mut(id) else {
            log::warn!("update: no component {id}");
            return false;
        };
        if let Some(x) = patch.x {
            c.pos.x = x;
        }
        if let Some(y) = patch.y {
            c.pos.y = y;
        }
        if let Some(rotation) = patch.rotation {
            c.rotation = rotation;
        }
        true
    }

    /// Finish a drag at `pos` (world coordinates).
    ///
    /// If the snapped target is reserved or taken by another component, the
    /// component goes back to where it was last committed and `false` is
    /// returned.
    pub fn drop_component(&mut self, id: ComponentId, pos: Pos2) -> bool {
        if self.component(id).is_none() {
            log::warn!("drop: no component {id}");
            return false;
        }

        let placed = self.policy.place(&self.components, pos, Some(id)).free();
        let target = placed.or_else(|| self.committed_pos(id));
        if let (Some(target), Some(c)) = (target, self.component_mut(id)) {
            c.pos = target;
        }

        self.simulate();
        if self.differs_from_history() {
            self.commit_history();
        }
        placed.is_some()
    }

    pub fn rotate(&mut self, id: ComponentId) -> bool {
        let Some(c) = self.component_mut(id) else {
            log::warn!("rotate: no component {id}");
            return false;
        };
        c.rotate();
        log::debug!("rotated {id} to {} degrees", c.rotation.degrees());
        self.simulate_and_commit();
        true
    }

    /// Flip a source between INPUT-0 and INPUT-1. Gates are left alone.
    pub fn toggle_source(&mut self, id: ComponentId) -> bool {
        let Some(c) = self.component_mut(id) else {
            log::warn!("toggle: no component {id}");
            return false;
        };
        c.kind = match c.kind {
            ComponentKind::Input0 => ComponentKind::Input1,
            ComponentKind::Input1 => ComponentKind::Input0,
            ComponentKind::And
            | ComponentKind::Or
            | ComponentKind::Not
            | ComponentKind::Nand
            | ComponentKind::Nor
            | ComponentKind::Xor => return false,
        };
        self.simulate_and_commit();
        true
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.restore(&snapshot);
        log::debug!("undo to snapshot {}", self.history.index());
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.restore(&snapshot);
        log::debug!("redo to snapshot {}", self.history.index());
        true
    }

    /// Record the live list as a new history entry.
    pub fn commit_history(&mut self) {
        let snapshot = self.snapshot();
        self.history.commit(&snapshot);
    }

    pub fn clear(&mut self) {
        self.load(&[]);
    }

    /// Replace the whole circuit. History restarts from the loaded list.
    pub fn load(&mut self, components: &[WorkspaceComponent]) {
        self.components = components.iter().map(LogicComponent::from).collect();
        self.next_id = self
            .components
            .iter()
            .map(|c| c.id.0 + 1)
            .max()
            .unwrap_or(1)
            .max(self.next_id);
        self.selected = None;
        self.hovered = None;
        self.simulate();
        self.history.reset(&self.snapshot());
        log::info!("workspace reset with {} components", self.components.len());
    }

    pub fn select(&mut self, id: Option<ComponentId>) {
        self.selected = id.filter(|id| self.component(*id).is_some());
    }

    pub fn hover(&mut self, id: Option<ComponentId>) {
        self.hovered = id.filter(|id| self.component(*id).is_some());
    }

    // Viewport

    pub fn zoom_at(&mut self, factor: f32, anchor: Pos2) {
        self.viewport.zoom_at(factor, anchor);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan_by(delta);
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        self.viewport.screen_to_world(screen)
    }

    // Evaluation

    /// Rebuild the circuit graph and publish settled values.
    pub fn simulate(&mut self) -> SimulationStatus {
        let mut graph = CircuitGraph::build(&self.components, self.policy.grid_size)
            .with_max_iterations(self.config.max_iterations);
        self.status = graph.settle();
        graph.apply_to(&mut self.components);
        self.outputs = graph.outputs();
        self.status
    }

    /// Snapshots carry settled values, so evaluate before recording.
    fn simulate_and_commit(&mut self) {
        self.simulate();
        self.commit_history();
    }

    fn restore(&mut self, snapshot: &[WorkspaceComponent]) {
        self.components = snapshot.iter().map(LogicComponent::from).collect();
        if self.selected.is_some_and(|id| self.component(id).is_none()) {
            self.selected = None;
        }
        if self.hovered.is_some_and(|id| self.component(id).is_none()) {
            self.hovered = None;
        }
        self.simulate();
    }

    fn allocate_id(&mut self) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        id
    }

    fn committed_pos(&self, id: ComponentId) -> Option<GridPos> {
        self.history
            .current()?
            .iter()
            .find(|c| c.id == id)
            .map(|c| GridPos::new(c.x, c.y))
    }

    /// Values are derived, so only placement fields are compared.
    fn differs_from_history(&self) -> bool {
        let Some(current) = self.history.current() else {
            return true;
        };
        current.len() != self.components.len()
            || current.iter().zip(&self.components).any(|(saved, live)| {
                saved.id != live.id
                    || saved.kind != live.kind
                    || GridPos::new(saved.x, saved.y) != live.pos
                    || saved.rotation != live.rotation
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;
    use proptest::prelude::*;

    fn init_logger() {
        env_logger::builder().is_test(true).try_init().ok();
    }

    fn workspace() -> Workspace {
        init_logger();
        Workspace::new(WorkspaceConfig::default())
    }

    #[test]
    fn add_snaps_and_evaluates() {
        let mut ws = workspace();
        let id = ws
            .add(ComponentKind::Input1, pos2(203.0, 78.0), Rotation::Deg0)
            .expect("free cell");
        let c = ws.component(id).expect("was added");
        assert_eq!(c.pos, GridPos::new(200, 80), "snapped to the grid");
        assert_eq!(c.value, Value::One, "sources carry their constant");
        assert_eq!(ws.history_len(), 2, "empty baseline plus the add");
    }

    #[test]
    fn add_into_panel_is_rejected() {
        let mut ws = workspace();
        assert_eq!(
            ws.add(ComponentKind::And, pos2(40.0, 200.0), Rotation::Deg0),
            None,
            "panel is reserved"
        );
        assert_eq!(
            ws.add(ComponentKind::And, pos2(165.0, 200.0), Rotation::Deg0),
            None,
            "column at the panel edge is reserved"
        );
        assert!(ws.components().is_empty(), "nothing added");
        assert!(!ws.can_undo(), "no history entry for a rejected add");
    }

    #[test]
    fn add_far_outside_the_workspace_is_rejected() {
        init_logger();
        let mut ws = workspace();
        assert_eq!(
            ws.add(ComponentKind::And, pos2(1.0e10, 0.0), Rotation::Deg0),
            None,
            "coordinate too large to snap"
        );
        assert_eq!(
            ws.add(ComponentKind::Or, pos2(f32::NAN, 40.0), Rotation::Deg0),
            None,
            "NaN pointer"
        );
        assert!(ws.components().is_empty(), "nothing added");
        assert_eq!(ws.history_len(), 1, "nothing committed");
    }

    #[test]
    fn add_on_top_of_another_is_rejected() {
        let mut ws = workspace();
        ws.add(ComponentKind::Or, pos2(300.0, 200.0), Rotation::Deg0)
            .expect("free cell");
        let before = ws.snapshot();
        assert_eq!(
            ws.add(ComponentKind::Not, pos2(308.0, 193.0), Rotation::Deg0),
            None,
            "same cell after snapping"
        );
        assert_eq!(ws.snapshot(), before, "list unchanged");
    }

    #[test]
    fn add_then_undo_then_redo() {
        let mut ws = workspace();
        ws.add(ComponentKind::Input0, pos2(200.0, 40.0), Rotation::Deg0)
            .expect("free cell");
        let before_add = ws.snapshot();
        ws.add(ComponentKind::Not, pos2(240.0, 40.0), Rotation::Deg0)
            .expect("free cell");
        let after_add = ws.snapshot();

        assert!(ws.undo(), "undo succeeds");
        assert_eq!(ws.snapshot(), before_add, "back to the pre-add list");
        assert!(ws.redo(), "redo succeeds");
        assert_eq!(ws.snapshot(), after_add, "post-add list restored exactly");
        assert!(!ws.redo(), "already at the newest state");
    }

    #[test]
    fn undo_at_start_is_a_no_op() {
        let mut ws = workspace();
        assert!(!ws.undo(), "nothing to undo");
        assert!(!ws.redo(), "nothing to redo");
    }

    #[test]
    fn history_keeps_the_newest_fifty_states() {
        let mut ws = workspace();
        for i in 0..60 {
            ws.add(
                ComponentKind::Input1,
                pos2(200.0 + 40.0 * i as f32, 40.0),
                Rotation::Deg0,
            )
            .expect("free cell");
        }
        assert_eq!(ws.history_len(), 50, "bounded stack");

        let mut undos = 0;
        while ws.undo() {
            undos += 1;
        }
        assert_eq!(undos, 49, "reaches the oldest kept snapshot");
        assert_eq!(ws.components().len(), 11, "60 adds minus 49 undone");
    }

    #[test]
    fn remove_clears_selection_and_reevaluates() {
        let mut ws = workspace();
        let src = ws
            .add(ComponentKind::Input0, pos2(200.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        let not = ws
            .add(ComponentKind::Not, pos2(240.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        assert_eq!(ws.value_of(not), Value::One, "NOT 0");

        ws.select(Some(src));
        ws.hover(Some(src));
        assert!(ws.remove(src), "removed");
        assert_eq!(ws.selected(), None, "selection cleared");
        assert_eq!(ws.hovered(), None, "hover cleared");
        assert_eq!(ws.value_of(not), Value::X, "input is open now");
        assert!(!ws.remove(src), "second remove is a no-op");
    }

    #[test]
    fn update_defers_history_and_evaluation() {
        let mut ws = workspace();
        ws.add(ComponentKind::Input1, pos2(200.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        let not = ws
            .add(ComponentKind::Not, pos2(300.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        let history_len = ws.history_len();

        // Drag the inverter so its input touches the source output.
        assert!(
            ws.update(
                not,
                ComponentPatch {
                    x: Some(241),
                    y: Some(103),
                    ..ComponentPatch::default()
                }
            ),
            "patched"
        );
        assert_eq!(ws.history_len(), history_len, "no commit while dragging");
        assert_eq!(ws.value_of(not), Value::X, "no evaluation while dragging");

        assert!(ws.drop_component(not, pos2(241.0, 103.0)), "dropped on a free cell");
        assert_eq!(
            ws.component(not).map(|c| c.pos),
            Some(GridPos::new(240, 100)),
            "snapped on drop"
        );
        assert_eq!(ws.value_of(not), Value::Zero, "evaluated on drop");
        assert_eq!(ws.history_len(), history_len + 1, "drop commits");
    }

    #[test]
    fn drop_on_occupied_cell_returns_home() {
        let mut ws = workspace();
        let a = ws
            .add(ComponentKind::And, pos2(200.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        ws.add(ComponentKind::Or, pos2(300.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        let history_len = ws.history_len();

        ws.update(
            a,
            ComponentPatch {
                x: Some(296),
                y: Some(98),
                ..ComponentPatch::default()
            },
        );
        assert!(!ws.drop_component(a, pos2(296.0, 98.0)), "target is taken");
        assert_eq!(
            ws.component(a).map(|c| c.pos),
            Some(GridPos::new(200, 100)),
            "back at the committed position"
        );
        assert_eq!(ws.history_len(), history_len, "nothing new to commit");
    }

    #[test]
    fn drop_in_place_adds_no_undo_step() {
        let mut ws = workspace();
        ws.add(ComponentKind::Input1, pos2(200.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        let not = ws
            .add(ComponentKind::Not, pos2(240.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        let history_len = ws.history_len();

        assert!(ws.drop_component(not, pos2(241.0, 101.0)), "same cell is free for itself");
        assert_eq!(ws.history_len(), history_len, "no phantom history entry");
        assert!(ws.undo(), "undo goes back to before the NOT");
        assert!(ws.component(not).is_none(), "the NOT add was undone");
    }

    #[test]
    fn snapshots_hold_settled_values() {
        let mut ws = workspace();
        ws.add(ComponentKind::Input1, pos2(200.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        let not = ws
            .add(ComponentKind::Not, pos2(240.0, 100.0), Rotation::Deg0)
            .expect("free cell");

        let saved = ws
            .history
            .current()
            .and_then(|s| s.iter().find(|c| c.id == not).map(|c| c.value));
        assert_eq!(saved, Some(Value::Zero), "committed after evaluation");
        assert_eq!(ws.value_of(not), Value::Zero, "live value matches");
    }

    #[test]
    fn rotate_four_times_round_trips() {
        let mut ws = workspace();
        let id = ws
            .add(ComponentKind::Nand, pos2(300.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        let original = ws.component(id).cloned().expect("exists");
        for _ in 0..4 {
            assert!(ws.rotate(id), "rotates");
        }
        let c = ws.component(id).expect("exists");
        assert_eq!(c.rotation, original.rotation, "rotation restored");
        assert_eq!(c.input_offsets(), original.input_offsets(), "inputs restored");
        assert_eq!(c.output_offset(), original.output_offset(), "output restored");
        assert_eq!(ws.history_len(), 6, "baseline, add and four rotations");
    }

    #[test]
    fn toggle_source_flips_constant() {
        let mut ws = workspace();
        let src = ws
            .add(ComponentKind::Input0, pos2(200.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        let gate = ws
            .add(ComponentKind::Not, pos2(240.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        assert!(ws.toggle_source(src), "source toggles");
        assert_eq!(ws.value_of(src), Value::One, "now INPUT-1");
        assert_eq!(ws.value_of(gate), Value::Zero, "downstream follows");
        assert!(!ws.toggle_source(gate), "gates do not toggle");
    }

    #[test]
    fn and_with_one_open_input_then_both_connected() {
        let mut ws = workspace();
        // AND at (300, 100): inputs at (280, 80) and (280, 120).
        let and = ws
            .add(ComponentKind::And, pos2(300.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        ws.add(ComponentKind::Input1, pos2(260.0, 80.0), Rotation::Deg0)
            .expect("free cell");
        assert_eq!(ws.value_of(and), Value::X, "second input is open");
        assert_eq!(
            ws.output_values(),
            &[OutputValue {
                id: and,
                value: Value::X
            }],
            "gate is the only terminal"
        );

        ws.add(ComponentKind::Input1, pos2(260.0, 120.0), Rotation::Deg0)
            .expect("free cell");
        assert_eq!(ws.value_of(and), Value::One, "1 AND 1");
        assert!(
            matches!(ws.status(), SimulationStatus::Stable { .. }),
            "settled: {:?}",
            ws.status()
        );
    }

    #[test]
    fn load_resets_history_and_ids_continue() {
        let mut ws = workspace();
        ws.add(ComponentKind::Input0, pos2(200.0, 40.0), Rotation::Deg0)
            .expect("free cell");
        ws.load(&[WorkspaceComponent {
            id: ComponentId(41),
            kind: ComponentKind::Xor,
            x: 300,
            y: 300,
            rotation: Rotation::Deg0,
            value: Value::One,
        }]);
        assert!(!ws.can_undo(), "history restarted");
        assert_eq!(ws.value_of(ComponentId(41)), Value::X, "stale value recomputed");

        let id = ws
            .add(ComponentKind::Input1, pos2(200.0, 40.0), Rotation::Deg0)
            .expect("free cell");
        assert_eq!(id, ComponentId(42), "ids never collide with loaded ones");

        ws.clear();
        assert!(ws.components().is_empty(), "cleared");
        assert_eq!(ws.history_len(), 1, "single empty snapshot");
    }

    #[test]
    fn select_ignores_unknown_ids() {
        let mut ws = workspace();
        ws.select(Some(ComponentId(99)));
        assert_eq!(ws.selected(), None, "unknown id is not selectable");
    }

    #[test]
    fn undo_drops_selection_of_vanished_component() {
        let mut ws = workspace();
        let id = ws
            .add(ComponentKind::Or, pos2(300.0, 100.0), Rotation::Deg0)
            .expect("free cell");
        ws.select(Some(id));
        ws.undo();
        assert_eq!(ws.selected(), None, "component no longer exists");
    }

    #[test]
    fn evaluation_is_repeatable() {
        let mut ws = workspace();
        ws.add(ComponentKind::Input1, pos2(260.0, 80.0), Rotation::Deg0);
        ws.add(ComponentKind::Input0, pos2(260.0, 120.0), Rotation::Deg0);
        ws.add(ComponentKind::Nor, pos2(300.0, 100.0), Rotation::Deg0);
        let first = ws.snapshot();
        ws.simulate();
        assert_eq!(ws.snapshot(), first, "second run gives the same values");
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn panel_coordinates_are_always_rejected(
            x in -500.0f32..169.0,
            y in -500.0f32..500.0,
        ) {
            let mut ws = Workspace::default();
            ws.add(ComponentKind::Input1, pos2(400.0, 0.0), Rotation::Deg0);
            let before = ws.snapshot();
            prop_assert_eq!(ws.add(ComponentKind::And, pos2(x, y), Rotation::Deg0), None);
            prop_assert_eq!(ws.snapshot(), before);
        }

        #[test]
        fn near_an_anchor_is_always_rejected(
            col in 1i32..20,
            row in -10i32..10,
            dx in -9.0f32..9.0,
            dy in -9.0f32..9.0,
        ) {
            let mut ws = Workspace::default();
            let anchor = pos2((160 + 20 * col) as f32, (20 * row) as f32);
            ws.add(ComponentKind::Xor, anchor, Rotation::Deg0);
            let before = ws.snapshot();
            prop_assert_eq!(before.len(), 1);
            prop_assert_eq!(
                ws.add(ComponentKind::Not, anchor + egui::vec2(dx, dy), Rotation::Deg0),
                None
            );
            prop_assert_eq!(ws.snapshot(), before);
        }
    }
}
