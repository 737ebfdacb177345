//! Editing and simulation core for the logic-gate workspace.
//!
//! Components are wired by position: an input pin is driven by whatever
//! output pin sits on the same grid cell. A [`Workspace`] owns the live
//! circuit, its undo history and the viewport, and re-settles the circuit
//! after every structural edit.
#![warn(clippy::all, rust_2018_idioms)]

pub mod assets;
pub mod component;
pub mod config;
pub mod error;
pub mod grid;
pub mod history;
pub mod save_load;
pub mod simulator;
pub mod viewport;
pub mod workspace;

pub use component::{ComponentId, ComponentKind, LogicComponent, Rotation, WorkspaceComponent};
pub use config::WorkspaceConfig;
pub use error::{Result, WorkspaceError};
pub use simulator::{CircuitGraph, OutputValue, SimulationStatus, Value, evaluate};
pub use workspace::{ComponentPatch, Workspace};
