//! Provides the [`Side`] type used to select the static table and the
//! non-cacheable header allow-list a context uses.
//!
//! A deflater/inflater pair always has one side configured as [`Side::Client`]
//! and the other as [`Side::Server`]; the codec itself stays oblivious to
//! HTTP semantics beyond this single distinction (§1, Non-goals).

/// Represents which peer role a context was constructed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The context belongs to the entity issuing requests.
    Client,

    /// The context belongs to the entity issuing responses.
    Server,
}
