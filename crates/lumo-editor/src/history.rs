//! Undo/Redo history for the graph store.
//!
//! Every entry is a pair of store snapshots (before, after). Snapshots are
//! `Arc`s, so an entry costs a few pointer clones no matter how big the
//! canvas is.
//!
//! Drag gestures are batched: `begin_batch` captures the state at pointer
//! down, every position batch in between is applied live, and `end_batch`
//! pushes one entry covering the whole gesture.

use crate::store::{GraphStore, StoreSnapshot};

#[derive(Debug, Clone)]
struct Entry {
    before: StoreSnapshot,
    after: StoreSnapshot,
    description: String,
}

/// Bounded undo/redo stacks with gesture batching.
pub struct History {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// State captured when the outermost batch opened.
    batch_snapshot: Option<StoreSnapshot>,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    /// History sized from the store's configuration.
    pub fn for_store(store: &GraphStore) -> Self {
        Self::new(store.config().history_depth)
    }

    /// Open a batch. Mutations until the matching `end_batch` become a
    /// single undo step.
    pub fn begin_batch(&mut self, store: &GraphStore) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(store.snapshot());
        }
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes and the graph
    /// actually changed, one entry is pushed.
    pub fn end_batch(&mut self, store: &GraphStore, description: &str) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0
            && let Some(before) = self.batch_snapshot.take()
        {
            self.push(before, store.snapshot(), description);
        }
    }

    /// Run `mutation` against the store and record it as one undo step.
    /// Inside a batch the mutation is applied but folded into the batch.
    pub fn record<R>(
        &mut self,
        store: &mut GraphStore,
        description: &str,
        mutation: impl FnOnce(&mut GraphStore) -> R,
    ) -> R {
        if self.batch_depth > 0 {
            return mutation(store);
        }
        let before = store.snapshot();
        let result = mutation(store);
        self.push(before, store.snapshot(), description);
        result
    }

    fn push(&mut self, before: StoreSnapshot, after: StoreSnapshot, description: &str) {
        if before.same_as(&after) {
            return;
        }
        self.undo_stack.push(Entry {
            before,
            after,
            description: description.to_string(),
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // New action invalidates redo
        self.redo_stack.clear();
        log::trace!("history: recorded `{description}`");
    }

    /// Undo the last entry. Returns its description.
    pub fn undo(&mut self, store: &mut GraphStore) -> Option<String> {
        let entry = self.undo_stack.pop()?;
        store.restore(entry.before.clone());
        let desc = entry.description.clone();
        self.redo_stack.push(entry);
        Some(desc)
    }

    /// Redo the last undone entry. Returns its description.
    pub fn redo(&mut self, store: &mut GraphStore) -> Option<String> {
        let entry = self.redo_stack.pop()?;
        store.restore(entry.after.clone());
        let desc = entry.description.clone();
        self.undo_stack.push(entry);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
    }
}
