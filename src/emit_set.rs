//! Provides [`EmitSet`], the deflater-local scratch list of table slots
//! touched during one `deflate` call (§2, §5).
//!
//! The emit set exists so the deflater can safely reference an entry
//! multiple times while building one block's output without the entry
//! being evicted out from under it by one of the deflater's own
//! insertions later in the same block. It is drained by a
//! capture-then-release pattern in [`crate::deflater::Deflater::deflate`]
//! rather than a `Drop` guard: a guard type would need to hold its own
//! `&mut HeaderTable` for the body of `deflate`, aliasing the direct
//! table access `deflate` itself needs in the same scope.

use crate::table::{HeaderTable, SlotId};

/// Tracks slot ids retained via [`HeaderTable::retain`] for the duration
/// of a single block, so they can be released in one pass regardless of
/// how the block's processing exits.
#[derive(Default)]
pub struct EmitSet {
    touched: Vec<SlotId>,
}

impl EmitSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { touched: Vec::with_capacity(capacity) }
    }

    /// Retains `slot_id` in `table` and records it for later release.
    pub fn hold(&mut self, table: &mut HeaderTable, slot_id: SlotId) {
        table.retain(slot_id);
        self.touched.push(slot_id);
    }

    /// Releases every retained slot back into `table`. Safe to call on an
    /// empty set (e.g. after an error with nothing yet retained).
    pub fn release_all(&mut self, table: &mut HeaderTable) {
        for slot_id in self.touched.drain(..) {
            table.release(slot_id);
        }
    }

    pub fn len(&self) -> usize {
        self.touched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }
}
