use std::collections::{HashMap, HashSet};

use slotmap::{SecondaryMap, SlotMap};

use crate::component::{ComponentId, ComponentKind, GridPos, LogicComponent, PinKind};

/// Persisted as `0`, `1` or `null`.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "Option<u8>", into = "Option<u8>")]
pub enum Value {
    Zero,
    One,
    /// Not determinable from the current inputs.
    #[default]
    X,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationStatus {
    Stable { iterations: usize },
    Unstable { max_reached: bool },
    Running,
}

impl Default for SimulationStatus {
    fn default() -> Self {
        Self::Running
    }
}

impl From<Value> for Option<u8> {
    fn from(value: Value) -> Self {
        match value {
            Value::Zero => Some(0),
            Value::One => Some(1),
            Value::X => None,
        }
    }
}

impl TryFrom<Option<u8>> for Value {
    type Error = String;

    fn try_from(value: Option<u8>) -> Result<Self, Self::Error> {
        match value {
            Some(0) => Ok(Self::Zero),
            Some(1) => Ok(Self::One),
            None => Ok(Self::X),
            Some(other) => Err(format!("value must be 0, 1 or null, got {other}")),
        }
    }
}

// Gate operators are strict: any unresolved operand makes the result unresolved.
impl Value {
    pub fn is_resolved(self) -> bool {
        self != Self::X
    }

    fn from_bool(b: bool) -> Self {
        if b { Self::One } else { Self::Zero }
    }

    fn to_bool(self) -> Option<bool> {
        match self {
            Self::Zero => Some(false),
            Self::One => Some(true),
            Self::X => None,
        }
    }

    fn not(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
            Self::X => Self::X,
        }
    }

    fn binary(self, other: Self, op: impl Fn(bool, bool) -> bool) -> Self {
        match (self.to_bool(), other.to_bool()) {
            (Some(a), Some(b)) => Self::from_bool(op(a, b)),
            _ => Self::X,
        }
    }

    fn and(self, other: Self) -> Self {
        self.binary(other, |a, b| a && b)
    }

    fn or(self, other: Self) -> Self {
        self.binary(other, |a, b| a || b)
    }

    fn xor(self, other: Self) -> Self {
        self.binary(other, |a, b| a ^ b)
    }
}

/// Truth table of `kind` applied to already resolved input values.
pub fn gate_output(kind: ComponentKind, inputs: &[Value]) -> Value {
    match (kind, inputs) {
        (ComponentKind::Input0 | ComponentKind::Input1, _) => {
            kind.source_value().unwrap_or(Value::X)
        }
        (ComponentKind::Not, [a]) => a.not(),
        (ComponentKind::And, [a, b]) => a.and(*b),
        (ComponentKind::Nand, [a, b]) => a.and(*b).not(),
        (ComponentKind::Or, [a, b]) => a.or(*b),
        (ComponentKind::Nor, [a, b]) => a.or(*b).not(),
        (ComponentKind::Xor, [a, b]) => a.xor(*b),
        _ => Value::X,
    }
}

slotmap::new_key_type! {
    pub struct NodeId;
}

/// A pin placed at a concrete grid cell. Only lives inside one [`CircuitGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub owner: ComponentId,
    pub index: u32,
    pub kind: PinKind,
    pub cell: GridPos,
}

#[derive(Debug, Clone)]
struct Entry {
    id: ComponentId,
    kind: ComponentKind,
    inputs: Vec<NodeId>,
    output: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputValue {
    pub id: ComponentId,
    pub value: Value,
}

/// Transient connectivity graph built from a component list.
///
/// Nodes are connected when they occupy the same grid cell; there is no
/// explicit wire list. A graph is meant to be built, settled, read and
/// dropped within one evaluation.
#[derive(Debug, Default)]
pub struct CircuitGraph {
    nodes: SlotMap<NodeId, Node>,
    entries: Vec<Entry>,
    /// Output nodes keyed by the cell they occupy
    drivers: HashMap<GridPos, Vec<NodeId>>,
    /// Cells occupied by at least one input node
    sinks: HashSet<GridPos>,
    values: SecondaryMap<NodeId, Value>,
    max_iterations: usize,
    pub status: SimulationStatus,
    pub last_iterations: usize,
}

impl CircuitGraph {
    pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

    pub fn build(components: &[LogicComponent], grid_size: i32) -> Self {
        let mut graph = Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            ..Self::default()
        };

        for c in components {
            let inputs = c
                .input_positions(grid_size)
                .into_iter()
                .enumerate()
                .map(|(i, pos)| {
                    let cell = pos.cell(grid_size);
                    graph.sinks.insert(cell);
                    graph.nodes.insert(Node {
                        owner: c.id,
                        index: i as u32,
                        kind: PinKind::Input,
                        cell,
                    })
                })
                .collect();

            let cell = c.output_position(grid_size).cell(grid_size);
            let output = graph.nodes.insert(Node {
                owner: c.id,
                index: 0,
                kind: PinKind::Output,
                cell,
            });
            graph.drivers.entry(cell).or_default().push(output);
            graph
                .values
                .insert(output, c.kind.source_value().unwrap_or(Value::X));

            graph.entries.push(Entry {
                id: c.id,
                kind: c.kind,
                inputs,
                output,
            });
        }

        log::debug!(
            "built circuit graph: {} components, {} nodes",
            graph.entries.len(),
            graph.nodes.len()
        );
        graph
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Run settle passes until a full pass changes nothing or the cap is hit.
    pub fn settle(&mut self) -> SimulationStatus {
        log::debug!("=== Begin simulation ===");
        self.status = SimulationStatus::Running;

        let mut iteration = 0;
        while iteration < self.max_iterations {
            iteration += 1;
            let mut changed = false;
            for i in 0..self.entries.len() {
                changed |= self.evaluate_entry(i);
            }
            if !changed {
                self.last_iterations = iteration;
                self.status = SimulationStatus::Stable {
                    iterations: iteration,
                };
                log::debug!("Simulation stabilized after {iteration} iterations");
                return self.status;
            }
        }

        self.last_iterations = self.max_iterations;
        self.status = SimulationStatus::Unstable { max_reached: true };
        log::warn!("Simulation reached max iterations without stabilizing");
        self.status
    }

    /// Returns true when the entry's output changed.
    fn evaluate_entry(&mut self, i: usize) -> bool {
        let entry = &self.entries[i];
        if entry.kind.is_source() {
            return false;
        }

        let inputs: Vec<Value> = entry
            .inputs
            .iter()
            .map(|&n| self.input_value(n))
            .collect();
        let new = if inputs.iter().all(|v| v.is_resolved()) {
            gate_output(entry.kind, &inputs)
        } else {
            Value::X
        };

        let output = entry.output;
        let old = self.values.insert(output, new);
        old != Some(new)
    }

    fn input_value(&self, input: NodeId) -> Value {
        let Some(node) = self.nodes.get(input) else {
            return Value::X;
        };
        let Some(drivers) = self.drivers.get(&node.cell) else {
            return Value::X;
        };

        let mut result: Option<Value> = None;
        for &d in drivers {
            let v = self.values.get(d).copied().unwrap_or(Value::X);
            match result {
                None => result = Some(v),
                Some(prev) if prev == v => {}
                Some(_) => return Value::X,
            }
        }
        result.unwrap_or(Value::X)
    }

    pub fn value_of(&self, id: ComponentId) -> Value {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| self.values.get(e.output).copied())
            .unwrap_or(Value::X)
    }

    /// Copy settled values into `components`, matched by id.
    pub fn apply_to(&self, components: &mut [LogicComponent]) {
        let by_id: HashMap<ComponentId, Value> = self
            .entries
            .iter()
            .map(|e| (e.id, self.values.get(e.output).copied().unwrap_or(Value::X)))
            .collect();
        for c in components {
            if let Some(v) = by_id.get(&c.id) {
                c.value = *v;
            }
        }
    }

    /// Values of gates whose output feeds no other component.
    pub fn outputs(&self) -> Vec<OutputValue> {
        self.entries
            .iter()
            .filter(|e| !e.kind.is_source())
            .filter(|e| {
                let cell = self.nodes[e.output].cell;
                !self.sinks.contains(&cell)
            })
            .map(|e| OutputValue {
                id: e.id,
                value: self.values.get(e.output).copied().unwrap_or(Value::X),
            })
            .collect()
    }
}

/// Settle `components` and return them with their values filled in.
pub fn evaluate(components: &[LogicComponent], grid_size: i32) -> Vec<LogicComponent> {
    let mut graph = CircuitGraph::build(components, grid_size);
    graph.settle();
    let mut settled = components.to_vec();
    graph.apply_to(&mut settled);
    settled
}
