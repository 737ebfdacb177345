//! Grid snapping and placement rules.
//!
//! Placement only looks at component anchors. Whether pins touch is the
//! evaluator's business, not the placement policy's.

use egui::Pos2;

use crate::component::{ComponentId, GridPos, LogicComponent};
use crate::config::WorkspaceConfig;

/// Largest absolute world coordinate a snapped anchor may have.
pub const COORD_LIMIT: i32 = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Free(GridPos),
    Reserved(GridPos),
    Occupied { pos: GridPos, by: ComponentId },
    /// Not finite or past [`COORD_LIMIT`].
    OutOfRange,
}

impl Placement {
    pub fn free(self) -> Option<GridPos> {
        match self {
            Self::Free(pos) => Some(pos),
            Self::Reserved(_) | Self::Occupied { .. } | Self::OutOfRange => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPolicy {
    pub grid_size: i32,
    pub panel_width: i32,
}

impl GridPolicy {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            grid_size: config.grid_size.max(1),
            panel_width: config.panel_width,
        }
    }

    /// Nearest grid point, with columns counted from the panel edge.
    ///
    /// `None` for coordinates that are not finite or snap past [`COORD_LIMIT`].
    pub fn snap(&self, pos: Pos2) -> Option<GridPos> {
        let g = f64::from(self.grid_size);
        let panel = f64::from(self.panel_width);
        let x = panel + ((f64::from(pos.x) - panel) / g).round() * g;
        let y = (f64::from(pos.y) / g).round() * g;
        let limit = f64::from(COORD_LIMIT);
        if !(x.is_finite() && y.is_finite()) || x.abs() > limit || y.abs() > limit {
            return None;
        }
        Some(GridPos::new(x as i32, y as i32))
    }

    /// The panel and the column right next to it. Gate inputs stick out one
    /// cell to the left, so an anchor there would put pins over the panel.
    pub fn is_reserved(&self, pos: GridPos) -> bool {
        pos.x < self.panel_width + self.grid_size
    }

    /// First component whose anchor is within half a cell of `pos`.
    pub fn occupant(
        &self,
        components: &[LogicComponent],
        pos: GridPos,
        ignore: Option<ComponentId>,
    ) -> Option<ComponentId> {
        // Compare doubled distances so odd grid sizes keep an exact half cell.
        let limit = i64::from(self.grid_size);
        let near = |a: i32, b: i32| (2 * (i64::from(a) - i64::from(b))).abs() < limit;
        components
            .iter()
            .filter(|c| Some(c.id) != ignore)
            .find(|c| near(c.pos.x, pos.x) && near(c.pos.y, pos.y))
            .map(|c| c.id)
    }

    pub fn place(
        &self,
        components: &[LogicComponent],
        pos: Pos2,
        ignore: Option<ComponentId>,
    ) -> Placement {
        let Some(snapped) = self.snap(pos) else {
            return Placement::OutOfRange;
        };
        if self.is_reserved(snapped) {
            return Placement::Reserved(snapped);
        }
        match self.occupant(components, snapped, ignore) {
            Some(by) => Placement::Occupied { pos: snapped, by },
            None => Placement::Free(snapped),
        }
    }
}
