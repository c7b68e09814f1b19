//! Provides the [`Deflater`], the compressing half of the codec (§4.5).
//!
//! The wire forms below are restated here the way the reference crate's
//! own encoder documents its representations, adapted to this draft's
//! four families (one bit narrower per family than HPACK's two, since this
//! draft adds the substitution-indexing form in between):
//!
//! ```txt
//! Indexed:                      1xxxxxxx  (7-bit prefix, value = index+1)
//! Literal, incremental indexing: 01xxxxxx  (6-bit prefix, name-index+1)
//! Literal, substitution indexing: 001xxxxx  (5-bit prefix, name-index+1)
//! Literal, without indexing:     0000xxxx  (4-bit prefix, name-index+1)
//! ```
//!
//! A name-index field of `0` means "no index — a literal name string
//! follows"; a real index is always carried as `index + 1` so that `0`
//! stays free as that sentinel. The substitution form's subindex field is
//! a separate, unshifted integer naming the dynamic slot being replaced.

use std::io::Write;

use crate::codec::{encode_integer, encode_string};
use crate::error::HdError;
use crate::side::Side;
use crate::table::{HeaderTable, SlotId};
use crate::emit_set::EmitSet;

/// Header names whose values are high-entropy and rarely repeat; the
/// deflater never indexes them, keeping the table free for headers that
/// actually benefit from reuse.
const NON_CACHEABLE_COMMON: &[&[u8]] = &[
    b":path",
    b"content-length",
    b"etag",
    b"if-modified-since",
    b"set-cookie",
];

/// Additional non-cacheable names for server-side contexts.
const NON_CACHEABLE_SERVER: &[&[u8]] = &[b"date", b"expires"];

fn is_non_cacheable(side: Side, name: &[u8]) -> bool {
    if NON_CACHEABLE_COMMON.contains(&name) {
        return true;
    }
    side == Side::Server && NON_CACHEABLE_SERVER.contains(&name)
}

/// Where a literal representation's name comes from.
#[derive(Clone, Copy)]
enum NameRef {
    /// No existing entry has this name; a literal name string follows.
    New,
    /// The combined dynamic+static index of an entry with this name.
    Index(u32),
}

/// Compresses header blocks against a [`crate::table::HeaderTable`] shared
/// (logically, not physically — see `DESIGN.md`) with a peer [`crate::inflater::Inflater`].
pub struct Deflater {
    side: Side,
    table: HeaderTable,
    emit_set: EmitSet,
    bad: bool,
}

impl Deflater {
    pub fn new(side: Side) -> Self {
        Self::with_dynamic_size(side, crate::HD_MAX_BUFFER_SIZE)
    }

    /// Builds a deflater with a non-default dynamic table byte budget.
    pub fn with_dynamic_size(side: Side, max_dynamic_size: usize) -> Self {
        Self {
            side,
            table: HeaderTable::new(side, max_dynamic_size),
            emit_set: EmitSet::with_capacity(crate::INITIAL_EMIT_SET_SIZE),
            bad: false,
        }
    }

    pub fn max_dynamic_size(&self) -> usize {
        self.table.max_size()
    }

    pub fn is_bad(&self) -> bool {
        self.bad
    }

    /// Compresses one header block, returning its wire-format bytes.
    ///
    /// On error the context latches into the bad state (§4.7); every
    /// subsequent call fails fast with [`HdError::Bad`] without touching
    /// the table further.
    pub fn deflate(&mut self, headers: &[(Vec<u8>, Vec<u8>)]) -> Result<Vec<u8>, HdError> {
        if self.bad {
            return Err(HdError::Bad);
        }

        let mut dst = Vec::new();
        let result = self.deflate_body(headers, &mut dst);

        // Capture the result before draining, so the emit set is released
        // on every exit path without a `Drop` guard aliasing `self.table`.
        self.emit_set.release_all(&mut self.table);

        match result {
            Ok(()) => Ok(dst),
            Err(err) => {
                self.bad = true;
                log::warn!("deflater entering bad state: {err}");
                Err(err)
            }
        }
    }

    /// No-op on the deflater side; kept for API symmetry with the
    /// inflater, whose `end_headers` is load-bearing (§9).
    pub fn end_headers(&mut self) {}

    fn deflate_body(&mut self, headers: &[(Vec<u8>, Vec<u8>)], dst: &mut Vec<u8>) -> Result<(), HdError> {
        self.table.reset_emitted_flags();

        // 1. Mark phase: drop refset membership for entries this block
        // doesn't reuse.
        for slot_id in self.table.refset_slots() {
            let still_present = match self.table.get(slot_id) {
                Some(entry) => headers.iter().any(|(n, v)| entry.matches(n, v)),
                None => continue,
            };
            if !still_present {
                let index = self.table.get(slot_id).unwrap().index();
                self.encode_indexed(index, &mut *dst)?;
                self.table.get_mut(slot_id).unwrap().set_in_refset(false);
            }
        }

        // 2 & 3. Emit phase, with the correction phase folded in: a header
        // pair repeated within this same block can't reuse its first
        // occurrence's slot via `Indexed` (that representation always
        // toggles reference-set membership, so a second `Indexed` for an
        // already-claimed slot would read as "remove", not "emit again").
        // `find_exact` excludes slots already claimed this block, so a
        // repeat falls through to a fresh literal insertion instead.
        for (name, value) in headers {
            self.deflate_one(name, value, dst)?;
        }
        Ok(())
    }

    fn deflate_one(&mut self, name: &[u8], value: &[u8], dst: &mut Vec<u8>) -> Result<(), HdError> {
        if let Some(slot_id) = self.table.find_exact(name, value) {
            return self.deflate_exact_match(slot_id, dst);
        }

        if let Some(dyn_slot) = self.table.find_name(name) {
            let dyn_index = self.table.get(dyn_slot).unwrap().index();
            return self.deflate_new_value(name, value, NameRef::Index(dyn_index), Some(dyn_slot), dst);
        }

        if let Some(static_index) = crate::static_table::find_name(self.side, name) {
            let combined_index = self.table.len() as u32 + static_index as u32;
            return self.deflate_new_value(name, value, NameRef::Index(combined_index), None, dst);
        }

        self.deflate_new_value(name, value, NameRef::New, None, dst)
    }

    fn deflate_exact_match(&mut self, slot_id: SlotId, dst: &mut Vec<u8>) -> Result<(), HdError> {
        // `find_exact` only ever returns a slot not yet claimed this block
        // (table.rs), so this is always the first occurrence of the pair.
        let entry = self.table.get(slot_id).unwrap();
        let index = entry.index();
        let in_refset = entry.is_in_refset();

        if in_refset {
            // 2a: the peer will emit this from its own reference set.
            let entry = self.table.get_mut(slot_id).unwrap();
            entry.set_emitted_this_block(true);
            entry.set_implicit_emit(true);
            return Ok(());
        }

        // 2b: toggle the entry into the reference set.
        self.encode_indexed(index, &mut *dst)?;
        let entry = self.table.get_mut(slot_id).unwrap();
        entry.set_in_refset(true);
        entry.set_emitted_this_block(true);
        self.emit_set.hold(&mut self.table, slot_id);
        Ok(())
    }

    fn deflate_new_value(
        &mut self,
        name: &[u8],
        value: &[u8],
        name_ref: NameRef,
        dyn_match: Option<SlotId>,
        dst: &mut Vec<u8>,
    ) -> Result<(), HdError> {
        let candidate_size = name.len() + value.len() + crate::HD_ENTRY_OVERHEAD;
        let oversized = candidate_size > crate::HD_MAX_ENTRY_SIZE;
        let literal_name = |r: NameRef| if let NameRef::New = r { Some(name) } else { None };

        if is_non_cacheable(self.side, name) || oversized {
            return self.encode_literal_without_indexing(name_ref, literal_name(name_ref), value, dst);
        }

        let byte_pressure = self.table.size() + candidate_size > self.table.max_size();
        if byte_pressure {
            if let Some(slot_id) = dyn_match {
                let subindex = self.table.get(slot_id).unwrap().index();
                let shared_name = self.table.get(slot_id).unwrap().name_rc();
                self.encode_literal_substitution(name_ref, literal_name(name_ref), subindex, value, dst)?;
                self.table.evict_at_index(subindex)?;
                if let Some(new_slot) = self.table.insert_with_shared_name(shared_name, value, true)? {
                    self.table.get_mut(new_slot).unwrap().set_emitted_this_block(true);
                    self.emit_set.hold(&mut self.table, new_slot);
                }
                return Ok(());
            }
        }

        self.encode_literal_incremental(name_ref, literal_name(name_ref), value, dst)?;
        let inserted = match dyn_match {
            Some(slot_id) => {
                let shared_name = self.table.get(slot_id).unwrap().name_rc();
                self.table.insert_with_shared_name(shared_name, value, true)?
            }
            None => self.table.insert_owned(name, value, true)?,
        };
        if let Some(new_slot) = inserted {
            self.table.get_mut(new_slot).unwrap().set_emitted_this_block(true);
            self.emit_set.hold(&mut self.table, new_slot);
        }
        Ok(())
    }

    /// **Indexed representation:**
    ///
    /// ```txt
    ///   0   1   2   3   4   5   6   7
    /// +---+---+---+---+---+---+---+---+
    /// | 1 |      Index+1 (7+)         |
    /// +---+---------------------------+
    /// ```
    fn encode_indexed<W: Write>(&self, index: u32, mut dst: W) -> Result<(), HdError> {
        encode_integer(index + 1, 0x80, 7, &mut dst)
    }

    fn encode_name_ref<W: Write>(name_ref: NameRef, flag_bits: u8, prefix_bits: u8, mut dst: W) -> Result<(), HdError> {
        let wire_value = match name_ref {
            NameRef::New => 0,
            NameRef::Index(index) => index + 1,
        };
        encode_integer(wire_value, flag_bits, prefix_bits, &mut dst)
    }

    /// **Literal with incremental indexing:**
    ///
    /// ```txt
    ///   0   1   2   3   4   5   6   7
    /// +---+---+---+---+---+---+---+---+
    /// | 0 | 1 |   Name-index+1 (6+)   |
    /// +---+---+-----------------------+
    /// | Name String (if index == 0)  |
    /// +-------------------------------+
    /// | Value String                  |
    /// +-------------------------------+
    /// ```
    fn encode_literal_incremental<W: Write>(
        &self,
        name_ref: NameRef,
        name: Option<&[u8]>,
        value: &[u8],
        mut dst: W,
    ) -> Result<(), HdError> {
        Self::encode_name_ref(name_ref, 0x40, 6, &mut dst)?;
        if let Some(name) = name {
            encode_string(name, &mut dst)?;
        }
        encode_string(value, dst)
    }

    /// **Literal with substitution indexing:**
    ///
    /// ```txt
    ///   0   1   2   3   4   5   6   7
    /// +---+---+---+---+---+---+---+---+
    /// | 0 | 0 | 1 | Name-index+1 (5+)|
    /// +---+---+---+-------------------+
    /// | Name String (if index == 0)   |
    /// +-------------------------------+
    /// | Substitution index (8+)       |
    /// +-------------------------------+
    /// | Value String                  |
    /// +-------------------------------+
    /// ```
    fn encode_literal_substitution<W: Write>(
        &self,
        name_ref: NameRef,
        name: Option<&[u8]>,
        subindex: u32,
        value: &[u8],
        mut dst: W,
    ) -> Result<(), HdError> {
        Self::encode_name_ref(name_ref, 0x20, 5, &mut dst)?;
        if let Some(name) = name {
            encode_string(name, &mut dst)?;
        }
        encode_integer(subindex, 0x0, 8, &mut dst)?;
        encode_string(value, dst)
    }

    /// **Literal without indexing:**
    ///
    /// ```txt
    ///   0   1   2   3   4   5   6   7
    /// +---+---+---+---+---+---+---+---+
    /// | 0 | 0 | 0 | 0 | Name-index+1 |
    /// +---+---+---+---+---------------+
    /// | Name String (if index == 0)   |
    /// +-------------------------------+
    /// | Value String                  |
    /// +-------------------------------+
    /// ```
    fn encode_literal_without_indexing<W: Write>(
        &self,
        name_ref: NameRef,
        name: Option<&[u8]>,
        value: &[u8],
        mut dst: W,
    ) -> Result<(), HdError> {
        Self::encode_name_ref(name_ref, 0x0, 4, &mut dst)?;
        if let Some(name) = name {
            encode_string(name, &mut dst)?;
        }
        encode_string(value, dst)
    }
}

impl Drop for Deflater {
    fn drop(&mut self) {
        self.emit_set.release_all(&mut self.table);
    }
}
