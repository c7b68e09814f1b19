//! Provides the primitive wire encodings shared by the deflater and the
//! inflater: prefix-encoded integers (§4.1) and length-prefixed byte
//! strings (§4.2).

mod integer;
mod string;

pub use integer::*;
pub use string::*;
