//! Provides a stateful header-compression codec for an HTTP/2.0 draft —
//! the precursor to [HPACK] that introduced a dynamic indexing table
//! alongside a per-block "reference set" carried forward implicitly from
//! one header block to the next.
//!
//! A connection uses a paired [`Deflater`]/[`Inflater`] per direction.
//! Both sides must process header blocks in the exact order they appear
//! on the wire — the reference-set protocol has no resynchronization
//! mechanism, and any reordering silently diverges the two tables.
//!
//! * [Integer representation] defines the rules for encoding the
//!   variable-length integers used for table indexes and string lengths.
//! * [String literal representation] defines the length-prefixed byte
//!   string encoding used for header names and values. This draft
//!   predates the Huffman addition to the wire format, so literals are
//!   always plain bytes.
//! * The **reference set** lets a header repeated across consecutive
//!   blocks cost nothing on the wire after its first occurrence: once an
//!   entry is toggled into the set, the peer keeps re-emitting it until
//!   told otherwise.
//!
//! **Example:**
//!
//! ```rust
//! use httlib_hd::{Deflater, Inflater, Side};
//!
//! let mut deflater = Deflater::new(Side::Client);
//! let mut inflater = Inflater::new(Side::Client);
//!
//! let block = vec![(b":method".to_vec(), b"GET".to_vec())];
//! let wire = deflater.deflate(&block).unwrap();
//! let decoded = inflater.inflate(&wire).unwrap();
//! assert_eq!(&*decoded[0].name, b":method".as_ref());
//! ```
//!
//! [HPACK]: https://tools.ietf.org/html/rfc7541
//! [Integer representation]: https://tools.ietf.org/html/rfc7541#section-5.1
//! [String literal representation]: https://tools.ietf.org/html/rfc7541#section-5.2

mod codec;
mod deflater;
mod emit_set;
mod entry;
mod error;
mod inflater;
mod side;
mod static_table;
mod table;

pub use deflater::Deflater;
pub use error::HdError;
pub use inflater::{HeaderField, Inflater};
pub use side::Side;

/// Byte budget of the dynamic table (`B` in §3).
pub const HD_MAX_BUFFER_SIZE: usize = 4096;

/// Largest single entry an indexing representation may create. Larger
/// headers are still emitted, but always as a non-indexing literal
/// (§4.4, I6).
pub const HD_MAX_ENTRY_SIZE: usize = 3072;

/// Fixed per-entry accounting overhead added to `name.len() + value.len()`
/// when computing an entry's abstract size (§3).
pub const HD_ENTRY_OVERHEAD: usize = 32;

/// Initial slab capacity for a fresh dynamic table. The table grows past
/// this if the byte budget allows more entries than fit here, since it is
/// a capacity hint, not a hard cap.
pub const INITIAL_HD_TABLE_SIZE: usize = 128;

/// Initial capacity reserved for a deflater's per-block emit set.
pub const INITIAL_EMIT_SET_SIZE: usize = 128;
