//! Provides the error type returned by the deflater and the inflater.
//!
//! Every failure that can occur while compressing or decompressing a header
//! block collapses into one of three cases: the peer sent something that
//! violates the wire contract, the process ran out of memory, or the
//! context already latched into the sticky bad state described by
//! [`crate::Deflater`]/[`crate::Inflater`].

use std::{error, fmt};

/// Contains error options that can be encountered while performing deflate
/// or inflate operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HdError {
    /// A protocol violation: a truncated or overflowing integer, a string
    /// length that runs past the end of the input, an index outside the
    /// valid range, or an indexing representation that would create an
    /// oversized table entry. The payload names the violated rule.
    Compression(&'static str),

    /// The process ran out of memory while performing the operation.
    OutOfMemory,

    /// The context is already in the bad state from a previous error. No
    /// further operation will succeed until the context is recreated.
    Bad,
}

impl fmt::Display for HdError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Compression(reason) => write!(fmt, "header compression error: {}", reason),
            Self::OutOfMemory => write!(fmt, "out of memory"),
            Self::Bad => write!(fmt, "context is in the bad state"),
        }
    }
}

impl error::Error for HdError {}
