//! Provides the [`Inflater`], the decompressing half of the codec (§4.6),
//! and its [`HeaderField`] output type.
//!
//! Mirrors [`crate::deflater::Deflater`]'s four wire families. Unlike the
//! deflater, which only ever produces representations it chose itself,
//! the inflater must accept anything a conforming peer may emit —
//! including a static-range `Indexed` representation, which the deflater
//! in this crate never emits on its own (see `DESIGN.md`).

use std::borrow::Cow;
use std::rc::Rc;

use crate::codec::{decode_integer, decode_string_borrowed};
use crate::error::HdError;
use crate::side::Side;
use crate::table::{HeaderTable, SlotId};

/// One decoded header pair. `name`/`value` either borrow directly from
/// the input block (literal strings) or own a copy pulled from the
/// table (indexed and name-indexed representations), per §5/§9.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField<'a> {
    pub name: Cow<'a, [u8]>,
    pub value: Cow<'a, [u8]>,
}

/// Decompresses header blocks against a [`crate::table::HeaderTable`]
/// kept in lockstep with a peer [`crate::deflater::Deflater`].
pub struct Inflater {
    side: Side,
    table: HeaderTable,
    bad: bool,
}

impl Inflater {
    pub fn new(side: Side) -> Self {
        Self::with_dynamic_size(side, crate::HD_MAX_BUFFER_SIZE)
    }

    pub fn with_dynamic_size(side: Side, max_dynamic_size: usize) -> Self {
        Self {
            side,
            table: HeaderTable::new(side, max_dynamic_size),
            bad: false,
        }
    }

    pub fn max_dynamic_size(&self) -> usize {
        self.table.max_size()
    }

    pub fn is_bad(&self) -> bool {
        self.bad
    }

    /// Decompresses one header block.
    ///
    /// The returned fields borrow from `bytes` and, transitively through
    /// `self`'s lifetime parameter, remain valid exactly as long as the
    /// caller holds off on passing the next block (§5).
    pub fn inflate<'a>(&'a mut self, bytes: &'a [u8]) -> Result<Vec<HeaderField<'a>>, HdError> {
        if self.bad {
            return Err(HdError::Bad);
        }
        match self.inflate_body(bytes) {
            Ok(fields) => Ok(fields),
            Err(err) => {
                self.bad = true;
                log::warn!("inflater entering bad state: {err}");
                Err(err)
            }
        }
    }

    /// No-op, kept for API symmetry with the deflater; the borrow-release
    /// obligation described in §5 is enforced by the compiler through the
    /// lifetime on [`Inflater::inflate`] itself, not by code running here
    /// (§9, "`end_headers` is a legacy barrier, kept").
    pub fn end_headers(&mut self) {}

    fn inflate_body<'a>(&mut self, bytes: &'a [u8]) -> Result<Vec<HeaderField<'a>>, HdError> {
        self.table.reset_emitted_flags();

        let mut fields = Vec::new();
        let mut pos = 0usize;
        while pos < bytes.len() {
            pos += self.inflate_one(&bytes[pos..], &mut fields)?;
        }

        for slot_id in self.table.refset_slots() {
            let entry = self.table.get(slot_id).expect("refset slot must be live");
            if !entry.is_emitted_this_block() {
                fields.push(HeaderField {
                    name: Cow::Owned(entry.name().to_vec()),
                    value: Cow::Owned(entry.value().to_vec()),
                });
                let entry = self.table.get_mut(slot_id).expect("refset slot must be live");
                entry.set_emitted_this_block(true);
                entry.set_implicit_emit(true);
            }
        }
        Ok(fields)
    }

    fn inflate_one<'a>(&mut self, src: &'a [u8], fields: &mut Vec<HeaderField<'a>>) -> Result<usize, HdError> {
        let first = *src.first().ok_or(HdError::Compression("truncated representation"))?;

        if first & 0x80 != 0 {
            self.inflate_indexed(src, fields)
        } else if first & 0xc0 == 0x40 {
            self.inflate_literal_incremental(src, fields)
        } else if first & 0xe0 == 0x20 {
            self.inflate_literal_substitution(src, fields)
        } else if first & 0xf0 == 0x00 {
            self.inflate_literal_without_indexing(src, fields)
        } else {
            Err(HdError::Compression("reserved representation bit pattern"))
        }
    }

    /// **Indexed representation.** Wire value `0` clears the entire
    /// reference set (§4.6 edge case); otherwise `index = wire_value - 1`.
    fn inflate_indexed<'a>(&mut self, src: &[u8], fields: &mut Vec<HeaderField<'a>>) -> Result<usize, HdError> {
        let (wire_value, consumed) = decode_integer(src, 7)?;
        if wire_value == 0 {
            self.table.clear_refset();
            return Ok(consumed);
        }

        let slot_id = self.resolve_to_dynamic_slot(wire_value - 1)?;
        let was_in_refset = self
            .table
            .get(slot_id)
            .ok_or(HdError::Compression("indexed representation: slot missing"))?
            .is_in_refset();

        if was_in_refset {
            self.table.get_mut(slot_id).unwrap().set_in_refset(false);
        } else {
            let entry = self.table.get(slot_id).unwrap();
            fields.push(HeaderField {
                name: Cow::Owned(entry.name().to_vec()),
                value: Cow::Owned(entry.value().to_vec()),
            });
            let entry = self.table.get_mut(slot_id).unwrap();
            entry.set_in_refset(true);
            entry.set_emitted_this_block(true);
        }
        Ok(consumed)
    }

    /// Resolves an `Indexed` representation's index to a dynamic slot,
    /// synthesizing a dynamic copy on the fly when it names a static
    /// entry (§4.6).
    fn resolve_to_dynamic_slot(&mut self, index: u32) -> Result<SlotId, HdError> {
        let dyn_len = self.table.len() as u32;
        if index < dyn_len {
            return self
                .table
                .resolve_index(index)
                .ok_or(HdError::Compression("indexed representation: index out of range"));
        }

        let static_index = (index - dyn_len) as usize;
        let (name, value) = crate::static_table::get(self.side, static_index)
            .ok_or(HdError::Compression("indexed representation: index out of range"))?;
        self.table
            .insert_static_copy(name.as_bytes(), value.as_bytes(), false)?
            .ok_or(HdError::Compression("indexed representation: static entry too large to synthesize"))
    }

    /// Resolves a name-index field (used by the literal forms) to the
    /// referenced name, sharing the `Rc` buffer when the source is
    /// already a dynamic entry.
    fn resolve_name_rc(&self, index: u32) -> Result<Rc<[u8]>, HdError> {
        let dyn_len = self.table.len() as u32;
        if index < dyn_len {
            let slot_id = self
                .table
                .resolve_index(index)
                .ok_or(HdError::Compression("name index out of range"))?;
            let entry = self.table.get(slot_id).ok_or(HdError::Compression("name index out of range"))?;
            return Ok(entry.name_rc());
        }

        let static_index = (index - dyn_len) as usize;
        let (name, _) = crate::static_table::get(self.side, static_index)
            .ok_or(HdError::Compression("name index out of range"))?;
        Ok(Rc::from(name.as_bytes()))
    }

    fn decode_name<'a>(&self, wire_value: u32, src: &'a [u8]) -> Result<(Vec<u8>, Option<Rc<[u8]>>, usize), HdError> {
        if wire_value == 0 {
            let (slice, consumed) = decode_string_borrowed(src)?;
            Ok((slice.to_vec(), None, consumed))
        } else {
            let rc = self.resolve_name_rc(wire_value - 1)?;
            Ok((rc.to_vec(), Some(rc), 0))
        }
    }

    /// **Literal without indexing.** No table mutation.
    fn inflate_literal_without_indexing<'a>(
        &mut self,
        src: &'a [u8],
        fields: &mut Vec<HeaderField<'a>>,
    ) -> Result<usize, HdError> {
        let (wire_value, mut pos) = decode_integer(src, 4)?;
        let (name_bytes, _, name_consumed) = self.decode_name(wire_value, &src[pos..])?;
        pos += name_consumed;

        let (value_slice, consumed) = decode_string_borrowed(&src[pos..])?;
        pos += consumed;

        fields.push(HeaderField { name: Cow::Owned(name_bytes), value: Cow::Borrowed(value_slice) });
        Ok(pos)
    }

    /// **Literal with incremental indexing.** Inserts the decoded pair.
    fn inflate_literal_incremental<'a>(
        &mut self,
        src: &'a [u8],
        fields: &mut Vec<HeaderField<'a>>,
    ) -> Result<usize, HdError> {
        let (wire_value, mut pos) = decode_integer(src, 6)?;
        let (name_bytes, shared_name, name_consumed) = self.decode_name(wire_value, &src[pos..])?;
        pos += name_consumed;

        let (value_slice, consumed) = decode_string_borrowed(&src[pos..])?;
        pos += consumed;

        let inserted = match shared_name {
            Some(rc) => self.table.insert_with_shared_name(rc, value_slice, true)?,
            None => self.table.insert_owned(&name_bytes, value_slice, true)?,
        };
        if let Some(slot_id) = inserted {
            self.table.get_mut(slot_id).unwrap().set_emitted_this_block(true);
        }

        fields.push(HeaderField { name: Cow::Owned(name_bytes), value: Cow::Borrowed(value_slice) });
        Ok(pos)
    }

    /// **Literal with substitution indexing.** Evicts the entry at the
    /// decoded subindex, then inserts the decoded pair in its place.
    fn inflate_literal_substitution<'a>(
        &mut self,
        src: &'a [u8],
        fields: &mut Vec<HeaderField<'a>>,
    ) -> Result<usize, HdError> {
        let (wire_value, mut pos) = decode_integer(src, 5)?;
        let (name_bytes, shared_name, name_consumed) = self.decode_name(wire_value, &src[pos..])?;
        pos += name_consumed;

        let (subindex, consumed) = decode_integer(&src[pos..], 8)?;
        pos += consumed;

        let (value_slice, consumed) = decode_string_borrowed(&src[pos..])?;
        pos += consumed;

        self.table.evict_at_index(subindex)?;
        let inserted = match shared_name {
            Some(rc) => self.table.insert_with_shared_name(rc, value_slice, true)?,
            None => self.table.insert_owned(&name_bytes, value_slice, true)?,
        };
        if let Some(slot_id) = inserted {
            self.table.get_mut(slot_id).unwrap().set_emitted_this_block(true);
        }

        fields.push(HeaderField { name: Cow::Owned(name_bytes), value: Cow::Borrowed(value_slice) });
        Ok(pos)
    }
}
