use std::collections::VecDeque;
use std::rc::Rc;

use crate::component::WorkspaceComponent;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Immutable copy of the component list at an edit boundary.
pub type Snapshot = Rc<[WorkspaceComponent]>;

/// Bounded undo/redo stack of snapshots with a cursor.
///
/// `snapshots[index]` always mirrors the last committed state. Entries past
/// `index` are redo states and are dropped by the next commit.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<Snapshot>,
    index: usize,
    limit: usize,
}

impl History {
    pub fn new(initial: &[WorkspaceComponent], limit: usize) -> Self {
        let mut snapshots = VecDeque::new();
        snapshots.push_back(Snapshot::from(initial));
        Self {
            snapshots,
            index: 0,
            limit: limit.max(1),
        }
    }

    /// Drop everything and start over from `initial`.
    pub fn reset(&mut self, initial: &[WorkspaceComponent]) {
        self.snapshots.clear();
        self.snapshots.push_back(Snapshot::from(initial));
        self.index = 0;
    }

    pub fn commit(&mut self, components: &[WorkspaceComponent]) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push_back(Snapshot::from(components));
        self.index += 1;

        if self.snapshots.len() > self.limit {
            self.snapshots.pop_front();
            self.index -= 1;
        }
        log::debug!(
            "history commit: {} snapshots, index {}",
            self.snapshots.len(),
            self.index
        );
    }

    pub fn undo(&mut self) -> Option<Snapshot> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.current()
    }

    pub fn redo(&mut self) -> Option<Snapshot> {
        if self.index + 1 >= self.snapshots.len() {
            return None;
        }
        self.index += 1;
        self.current()
    }

    pub fn current(&self) -> Option<Snapshot> {
        self.snapshots.get(self.index).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(&[], DEFAULT_HISTORY_LIMIT)
    }
}
