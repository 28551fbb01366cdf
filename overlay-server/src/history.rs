use std::collections::VecDeque;

use crate::event::BroadcastEvent;

/// Most recent events kept for replay to late-joining clients.
pub const HISTORY_MAX: usize = 200;

/// Insertion-ordered ring of the last [`HISTORY_MAX`] broadcast events.
/// Owned by the hub; mutated only on broadcast, cleared only explicitly.
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    entries: VecDeque<BroadcastEvent>,
}

impl HistoryBuffer {
    pub fn push(&mut self, event: BroadcastEvent) {
        self.entries.push_back(event);
        if self.entries.len() > HISTORY_MAX {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BroadcastEvent> {
        self.entries.iter()
    }
}
