use std::fmt::Display;
use std::ops::{Add, Sub};

use crate::simulator::Value;

#[derive(
    serde::Deserialize, serde::Serialize, Copy, Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
#[serde(transparent)]
pub struct ComponentId(pub u64);

impl Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ComponentId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(serde::Deserialize, serde::Serialize, PartialEq, Eq, Hash, Copy, Debug, Clone)]
pub enum ComponentKind {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "NOT")]
    Not,
    #[serde(rename = "NAND")]
    Nand,
    #[serde(rename = "NOR")]
    Nor,
    #[serde(rename = "XOR")]
    Xor,
    #[serde(rename = "INPUT-0")]
    Input0,
    #[serde(rename = "INPUT-1")]
    Input1,
}

impl ComponentKind {
    pub const ALL: [Self; 8] = [
        Self::And,
        Self::Or,
        Self::Not,
        Self::Nand,
        Self::Nor,
        Self::Xor,
        Self::Input0,
        Self::Input1,
    ];

    pub fn is_source(self) -> bool {
        matches!(self, Self::Input0 | Self::Input1)
    }

    /// The constant a source drives. `None` for gates.
    pub fn source_value(self) -> Option<Value> {
        match self {
            Self::Input0 => Some(Value::Zero),
            Self::Input1 => Some(Value::One),
            Self::And | Self::Or | Self::Not | Self::Nand | Self::Nor | Self::Xor => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Nand => "NAND",
            Self::Nor => "NOR",
            Self::Xor => "XOR",
            Self::Input0 => "INPUT-0",
            Self::Input1 => "INPUT-1",
        }
    }

    fn layout(self) -> &'static PinLayout {
        match self {
            Self::And | Self::Or | Self::Nand | Self::Nor | Self::Xor => &BINARY_GATE_LAYOUT,
            Self::Not => &NOT_LAYOUT,
            Self::Input0 | Self::Input1 => &SOURCE_LAYOUT,
        }
    }
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Clockwise quarter turns, in screen space where `y` grows downwards.
#[derive(serde::Deserialize, serde::Serialize, PartialEq, Eq, Hash, Copy, Debug, Clone, Default)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn next(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    fn quarter_turns(self) -> u8 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }
}

impl From<Rotation> for u16 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(format!("rotation must be 0, 90, 180 or 270 degrees, got {other}")),
        }
    }
}

/// Integer world position in pixels.
#[derive(
    serde::Deserialize, serde::Serialize, Copy, Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The grid cell this position falls in, rounding to the nearest cell.
    pub fn cell(self, grid_size: i32) -> Self {
        let g = grid_size as f32;
        Self::new(
            (self.x as f32 / g).round() as i32,
            (self.y as f32 / g).round() as i32,
        )
    }

    /// Saturates at the `i32` range, so far-off anchors never overflow.
    pub fn offset_by(self, offset: Offset, grid_size: i32) -> Self {
        Self::new(
            self.x.saturating_add(offset.dx.saturating_mul(grid_size)),
            self.y.saturating_add(offset.dy.saturating_mul(grid_size)),
        )
    }
}

impl Add for GridPos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for GridPos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

/// Pin offset relative to a component anchor, measured in grid cells.
#[derive(serde::Deserialize, serde::Serialize, Copy, Debug, Clone, Eq, PartialEq, Hash)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// One clockwise quarter turn.
    pub fn rotate_quarter(self) -> Self {
        Self::new(-self.dy, self.dx)
    }

    pub fn rotated(self, rotation: Rotation) -> Self {
        (0..rotation.quarter_turns()).fold(self, |o, _| o.rotate_quarter())
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    Input,
    Output,
}

struct PinLayout {
    inputs: &'static [Offset],
    output: Offset,
}

static BINARY_GATE_LAYOUT: PinLayout = PinLayout {
    inputs: &[Offset::new(-1, -1), Offset::new(-1, 1)],
    output: Offset::new(1, 0),
};

static NOT_LAYOUT: PinLayout = PinLayout {
    inputs: &[Offset::new(-1, 0)],
    output: Offset::new(1, 0),
};

static SOURCE_LAYOUT: PinLayout = PinLayout {
    inputs: &[],
    output: Offset::new(1, 0),
};

/// Input pin offsets of `kind` turned by `rotation`, in pin order.
pub fn input_offsets(kind: ComponentKind, rotation: Rotation) -> Vec<Offset> {
    kind.layout()
        .inputs
        .iter()
        .map(|o| o.rotated(rotation))
        .collect()
}

pub fn output_offset(kind: ComponentKind, rotation: Rotation) -> Offset {
    kind.layout().output.rotated(rotation)
}

/// A component placed in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicComponent {
    pub id: ComponentId,
    pub kind: ComponentKind,
    /// Anchor position. Pin offsets are applied relative to it.
    pub pos: GridPos,
    pub rotation: Rotation,
    pub value: Value,
}

impl LogicComponent {
    pub fn new(id: ComponentId, kind: ComponentKind, pos: GridPos, rotation: Rotation) -> Self {
        Self {
            id,
            kind,
            pos,
            rotation,
            value: kind.source_value().unwrap_or(Value::X),
        }
    }

    pub fn input_offsets(&self) -> Vec<Offset> {
        input_offsets(self.kind, self.rotation)
    }

    pub fn output_offset(&self) -> Offset {
        output_offset(self.kind, self.rotation)
    }

    pub fn input_positions(&self, grid_size: i32) -> Vec<GridPos> {
        self.input_offsets()
            .into_iter()
            .map(|o| self.pos.offset_by(o, grid_size))
            .collect()
    }

    pub fn output_position(&self, grid_size: i32) -> GridPos {
        self.pos.offset_by(self.output_offset(), grid_size)
    }

    pub fn rotate(&mut self) {
        self.rotation = self.rotation.next();
    }
}

/// The persisted, renderer-facing form of a [`LogicComponent`].
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceComponent {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub value: Value,
}

impl From<&LogicComponent> for WorkspaceComponent {
    fn from(c: &LogicComponent) -> Self {
        Self {
            id: c.id,
            kind: c.kind,
            x: c.pos.x,
            y: c.pos.y,
            rotation: c.rotation,
            value: c.value,
        }
    }
}

impl From<&WorkspaceComponent> for LogicComponent {
    fn from(c: &WorkspaceComponent) -> Self {
        Self {
            id: c.id,
            kind: c.kind,
            pos: GridPos::new(c.x, c.y),
            rotation: c.rotation,
            value: c.kind.source_value().unwrap_or(c.value),
        }
    }
}
