// ============================================================================
// HISTORY MANAGER: bounded undo/redo stacks of full-canvas snapshots
// ============================================================================

use std::collections::VecDeque;

use crate::pixel_buffer::{PixelBuffer, Snapshot};

/// Default number of undo steps kept.
pub const DEFAULT_MAX_DEPTH: usize = 32;
/// Default memory cap across both stacks (100 MiB).
pub const DEFAULT_MAX_BYTES: usize = 100 * 1024 * 1024;

/// Linear undo/redo history.
///
/// Each entry is a full snapshot taken just before a mutation committed. Both
/// stacks hold at most `max_depth` entries; the oldest are evicted first.
pub struct HistoryManager {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    max_depth: usize,
    /// Optional memory cap in bytes.
    max_memory_bytes: Option<usize>,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("max_depth", &self.max_depth)
            .field("total_memory", &self.total_memory)
            .finish()
    }
}

impl HistoryManager {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth,
            max_memory_bytes: Some(DEFAULT_MAX_BYTES),
            total_memory: 0,
        }
    }

    /// Replace the memory cap. `None` disables it; the depth cap still applies.
    pub fn with_memory_limit(mut self, max_bytes: Option<usize>) -> Self {
        self.max_memory_bytes = max_bytes;
        self.prune();
        self
    }

    /// Record the buffer's current state as the undo point of a new gesture
    /// and drop any redo entries. Returns the snapshot so the caller can keep
    /// reading the pre-mutation pixels.
    pub fn begin_mutation(&mut self, buffer: &PixelBuffer) -> Snapshot {
        for snap in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(snap.memory_bytes());
        }

        let snapshot = buffer.snapshot();
        self.total_memory += snapshot.memory_bytes();
        self.undo_stack.push_back(snapshot.clone());
        self.prune();
        snapshot
    }

    /// Restore the most recent undo point. `false` when there is none.
    pub fn undo(&mut self, buffer: &mut PixelBuffer) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        let current = buffer.snapshot();
        self.total_memory += current.memory_bytes();
        self.total_memory = self.total_memory.saturating_sub(previous.memory_bytes());
        buffer.restore(&previous);
        self.redo_stack.push_back(current);
        self.trim_front(StackSide::Redo);
        true
    }

    /// Re-apply the most recently undone state. `false` when there is none.
    pub fn redo(&mut self, buffer: &mut PixelBuffer) -> bool {
        let Some(next) = self.redo_stack.pop_back() else {
            return false;
        };
        let current = buffer.snapshot();
        self.total_memory += current.memory_bytes();
        self.total_memory = self.total_memory.saturating_sub(next.memory_bytes());
        buffer.restore(&next);
        self.undo_stack.push_back(current);
        self.trim_front(StackSide::Undo);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Bytes held by both stacks (O(1) via cached total).
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    /// Evict the oldest undo entries until both caps hold.
    fn prune(&mut self) {
        self.trim_front(StackSide::Undo);

        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.undo_stack.len() > 1 {
                self.evict(StackSide::Undo);
            }
        }
    }

    fn trim_front(&mut self, side: StackSide) {
        loop {
            let len = match side {
                StackSide::Undo => self.undo_stack.len(),
                StackSide::Redo => self.redo_stack.len(),
            };
            if len <= self.max_depth {
                break;
            }
            self.evict(side);
        }
    }

    fn evict(&mut self, side: StackSide) {
        let removed = match side {
            StackSide::Undo => self.undo_stack.pop_front(),
            StackSide::Redo => self.redo_stack.pop_front(),
        };
        if let Some(snap) = removed {
            self.total_memory = self.total_memory.saturating_sub(snap.memory_bytes());
            log::debug!(
                "history: evicted oldest {:?} entry ({} bytes)",
                side,
                snap.memory_bytes()
            );
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StackSide {
    Undo,
    Redo,
}
