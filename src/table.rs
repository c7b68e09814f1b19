//! Provides [`HeaderTable`], the dynamic, bounded header table shared by
//! the deflater and the inflater (§3, §4.4).
//!
//! Entries are addressed by a stable [`SlotId`] rather than by their
//! current FIFO position, because the position (and therefore the
//! external wire index, §3) shifts on every insertion or eviction while an
//! entry may still be referenced by a deflater's emit set or an inflater's
//! output borrow. The table is a slab (`Vec<Option<Slot>>` plus a free
//! list) addressed by `SlotId`; FIFO order lives separately in a
//! `VecDeque<SlotId>`, an arena-owned design rather than threading shared
//! mutable pointers between entries.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::entry::HeaderEntry;
use crate::error::HdError;
use crate::side::Side;

/// Stable identifier for a slab slot. Remains valid for the lifetime of
/// the entry it names, independent of the entry's current table index.
///
/// Carries a generation counter alongside the slab index: once a slot is
/// freed and its index handed back out by a later insert, an `SlotId`
/// minted before the free must resolve to `None` rather than silently
/// aliasing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: usize,
    generation: u32,
}

struct Slot {
    entry: HeaderEntry,
    refcount: u32,
    /// False once the entry has been evicted; the slot then survives only
    /// until its refcount drains to zero (I3).
    linked: bool,
}

/// The dynamic header table: a byte-budgeted FIFO plus the bookkeeping
/// (`index`, `IN_REFSET`, refcounts) §3 and §4.4 require of it.
pub struct HeaderTable {
    side: Side,
    slots: Vec<Option<Slot>>,
    /// Current generation per slab index, bumped on every free so a stale
    /// `SlotId` referring to a reused index is rejected.
    generations: Vec<u32>,
    free: Vec<usize>,
    /// Front is the most recently inserted entry (index 0); back is the
    /// oldest (I2).
    order: VecDeque<SlotId>,
    size: usize,
    max_size: usize,
}

impl HeaderTable {
    pub fn new(side: Side, max_size: usize) -> Self {
        Self {
            side,
            slots: Vec::with_capacity(crate::INITIAL_HD_TABLE_SIZE),
            generations: Vec::with_capacity(crate::INITIAL_HD_TABLE_SIZE),
            free: Vec::new(),
            order: VecDeque::with_capacity(crate::INITIAL_HD_TABLE_SIZE),
            size: 0,
            max_size,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of live dynamic entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Current byte usage against the budget (I1).
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Changes the byte budget, evicting immediately if the new budget is
    /// smaller than the current usage.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.evict_to_fit(0);
    }

    /// Inserts a fully-owned literal entry (deep-copied name and value).
    pub fn insert_owned(
        &mut self,
        name: &[u8],
        value: &[u8],
        in_refset: bool,
    ) -> Result<Option<SlotId>, HdError> {
        self.insert_entry(HeaderEntry::owned(name, value), in_refset)
    }

    /// Inserts an entry sharing its name buffer with an existing entry
    /// (the "indexed name" literal path, §5 resource ownership).
    pub fn insert_with_shared_name(
        &mut self,
        name: Rc<[u8]>,
        value: &[u8],
        in_refset: bool,
    ) -> Result<Option<SlotId>, HdError> {
        self.insert_entry(HeaderEntry::with_shared_name(name, value), in_refset)
    }

    /// Inserts a copy of a static-table entry, used when the inflater
    /// synthesizes a dynamic entry for a static-range `Indexed`
    /// representation (§4.6).
    pub fn insert_static_copy(
        &mut self,
        name: &[u8],
        value: &[u8],
        in_refset: bool,
    ) -> Result<Option<SlotId>, HdError> {
        self.insert_entry(HeaderEntry::from_static(name, value), in_refset)
    }

    fn insert_entry(
        &mut self,
        mut entry: HeaderEntry,
        in_refset: bool,
    ) -> Result<Option<SlotId>, HdError> {
        let size = entry.size();
        if size > crate::HD_MAX_ENTRY_SIZE {
            log::warn!("hd table: rejecting entry of size {size}, exceeds per-entry cap");
            return Ok(None);
        }

        self.evict_to_fit(size);
        if self.size + size > self.max_size {
            // Budget can't fit this entry even with the table fully
            // emptied; leave it empty rather than partially inserted.
            return Ok(None);
        }

        entry.set_in_refset(in_refset);
        entry.set_emitted_this_block(false);

        let slot_id = self.alloc_slot(entry);
        self.order.push_front(slot_id);
        self.size += size;
        self.reindex();

        log::debug!("hd table insert: slot={slot_id:?} size={size} table_size={}", self.size);
        Ok(Some(slot_id))
    }

    fn alloc_slot(&mut self, entry: HeaderEntry) -> SlotId {
        let slot = Slot { entry, refcount: 0, linked: true };
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(slot);
            SlotId { index, generation: self.generations[index] }
        } else {
            self.slots.push(Some(slot));
            self.generations.push(0);
            SlotId { index: self.slots.len() - 1, generation: 0 }
        }
    }

    /// Evicts entries from the tail until `incoming_size` additional bytes
    /// would fit under the budget, or the table is empty.
    fn evict_to_fit(&mut self, incoming_size: usize) {
        while self.size + incoming_size > self.max_size {
            match self.order.pop_back() {
                Some(slot_id) => self.unlink(slot_id),
                None => break,
            }
        }
        self.reindex();
    }

    /// Evicts the dynamic entry currently at external index `index`
    /// (substitution indexing's first step, §4.3/§4.4).
    pub fn evict_at_index(&mut self, index: u32) -> Result<(), HdError> {
        let pos = index as usize;
        if pos >= self.order.len() {
            return Err(HdError::Compression("substitution index out of range"));
        }
        let slot_id = self.order.remove(pos).expect("position checked above");
        self.unlink(slot_id);
        self.reindex();
        Ok(())
    }

    fn unlink(&mut self, slot_id: SlotId) {
        let mut free_now = false;
        if let Some(slot) = self.slots[slot_id.index].as_mut() {
            slot.linked = false;
            slot.entry.set_in_refset(false);
            self.size -= slot.entry.size();
            log::debug!("hd table evict: slot={}", slot_id.index);
            free_now = slot.refcount == 0;
        }
        if free_now {
            self.free_slot(slot_id);
        }
    }

    fn free_slot(&mut self, slot_id: SlotId) {
        self.slots[slot_id.index] = None;
        self.generations[slot_id.index] = self.generations[slot_id.index].wrapping_add(1);
        self.free.push(slot_id.index);
    }

    /// Reassigns every linked entry's `index` to its current FIFO
    /// position (I2). A full pass is affordable here since dynamic tables
    /// stay small (at most ~128 entries under the default budget, §4.4).
    fn reindex(&mut self) {
        for (position, &slot_id) in self.order.iter().enumerate() {
            if let Some(slot) = self.slots[slot_id.index].as_mut() {
                slot.entry.set_index(position as u32);
            }
        }
    }

    /// Resolves an external dynamic-range index to a slot id.
    pub fn resolve_index(&self, index: u32) -> Option<SlotId> {
        self.order.get(index as usize).copied()
    }

    fn is_current(&self, slot_id: SlotId) -> bool {
        self.generations.get(slot_id.index).copied() == Some(slot_id.generation)
    }

    pub fn get(&self, slot_id: SlotId) -> Option<&HeaderEntry> {
        if !self.is_current(slot_id) {
            return None;
        }
        self.slots.get(slot_id.index)?.as_ref().map(|slot| &slot.entry)
    }

    pub fn get_mut(&mut self, slot_id: SlotId) -> Option<&mut HeaderEntry> {
        if !self.is_current(slot_id) {
            return None;
        }
        self.slots.get_mut(slot_id.index)?.as_mut().map(|slot| &mut slot.entry)
    }

    /// Finds the most recent dynamic entry with an exact name+value match
    /// that hasn't already been claimed by this block's processing.
    ///
    /// An entry already marked `EMITTED_THIS_BLOCK` can't be matched again
    /// via `Indexed` without colliding with that representation's toggle
    /// semantics (a second `Indexed` for the same slot means "remove from
    /// the reference set", not "emit again") — a same-block repeat must
    /// instead fall through to a fresh literal insertion.
    pub fn find_exact(&self, name: &[u8], value: &[u8]) -> Option<SlotId> {
        self.order.iter().copied().find(|&slot_id| {
            self.get(slot_id).is_some_and(|entry| entry.matches(name, value) && !entry.is_emitted_this_block())
        })
    }

    /// Finds the most recent dynamic entry with a matching name.
    pub fn find_name(&self, name: &[u8]) -> Option<SlotId> {
        self.order
            .iter()
            .copied()
            .find(|&slot_id| self.get(slot_id).is_some_and(|entry| entry.matches_name(name)))
    }

    /// Slot ids for every entry currently in the reference set.
    pub fn refset_slots(&self) -> Vec<SlotId> {
        self.order
            .iter()
            .copied()
            .filter(|&slot_id| self.get(slot_id).is_some_and(|entry| entry.is_in_refset()))
            .collect()
    }

    /// Clears `IN_REFSET` on every linked entry (the index-0 signal,
    /// §4.6).
    pub fn clear_refset(&mut self) {
        let ids: Vec<SlotId> = self.order.iter().copied().collect();
        for slot_id in ids {
            if let Some(entry) = self.get_mut(slot_id) {
                entry.set_in_refset(false);
            }
        }
    }

    /// Clears `EMITTED_THIS_BLOCK` and `IMPLICIT_EMIT` on every linked
    /// entry, run at the start of block processing on both peers.
    pub fn reset_emitted_flags(&mut self) {
        let ids: Vec<SlotId> = self.order.iter().copied().collect();
        for slot_id in ids {
            if let Some(entry) = self.get_mut(slot_id) {
                entry.set_emitted_this_block(false);
                entry.set_implicit_emit(false);
            }
        }
    }

    /// Increments a slot's refcount, keeping it alive past eviction until
    /// released (§5).
    pub fn retain(&mut self, slot_id: SlotId) {
        if !self.is_current(slot_id) {
            return;
        }
        if let Some(slot) = self.slots[slot_id.index].as_mut() {
            slot.refcount += 1;
        }
    }

    /// Decrements a slot's refcount, freeing the slab slot if the entry
    /// has already been evicted and no references remain.
    pub fn release(&mut self, slot_id: SlotId) {
        if !self.is_current(slot_id) {
            return;
        }
        let mut free_now = false;
        if let Some(slot) = self.slots[slot_id.index].as_mut() {
            slot.refcount = slot.refcount.saturating_sub(1);
            free_now = slot.refcount == 0 && !slot.linked;
        }
        if free_now {
            self.free_slot(slot_id);
        }
    }
}
