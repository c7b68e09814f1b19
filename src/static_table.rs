//! Provides the process-wide static tables.
//!
//! The static table is a fixed list of common header pairs appended after
//! the dynamic table in the external index space (§3). It has a
//! client-request variant and a server-response variant; which one a
//! context uses is selected by its [`crate::Side`] at construction.
//!
//! No byte-exact reference dump of either table was available in the
//! source material this crate was derived from — see `DESIGN.md` for the
//! full note. The tables below are a representative set built from the
//! headers named throughout this draft's wire format and cross-checked for
//! internal consistency by `tests/fixtures/static_table.json`.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::side::Side;

/// A single static-table entry: a fixed name and a fixed default value
/// (possibly empty).
pub type StaticEntry = (&'static str, &'static str);

/// Static table used by client (request-side) contexts.
pub static STATIC_TABLE_CLIENT: &[StaticEntry] = &[
    (":method", "GET"),
    (":method", "POST"),
    (":path", "/"),
    (":path", "/index.html"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":authority", ""),
    ("accept", ""),
    ("accept-charset", ""),
    ("accept-encoding", "gzip, deflate"),
    ("accept-language", ""),
    ("cookie", ""),
    ("host", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("referer", ""),
    ("user-agent", ""),
];

/// Static table used by server (response-side) contexts.
pub static STATIC_TABLE_SERVER: &[StaticEntry] = &[
    (":status", "200"),
    (":status", "204"),
    (":status", "206"),
    (":status", "304"),
    (":status", "400"),
    (":status", "404"),
    (":status", "500"),
    ("age", ""),
    ("cache-control", ""),
    ("content-encoding", ""),
    ("content-length", ""),
    ("content-type", ""),
    ("date", ""),
    ("etag", ""),
    ("expires", ""),
    ("last-modified", ""),
    ("location", ""),
    ("server", ""),
    ("set-cookie", ""),
    ("vary", ""),
    ("via", ""),
];

lazy_static! {
    static ref NAME_INDEX_CLIENT: HashMap<&'static str, usize> =
        build_name_index(STATIC_TABLE_CLIENT);
    static ref NAME_INDEX_SERVER: HashMap<&'static str, usize> =
        build_name_index(STATIC_TABLE_SERVER);
}

fn build_name_index(table: &'static [StaticEntry]) -> HashMap<&'static str, usize> {
    let mut map = HashMap::with_capacity(table.len());
    for (index, &(name, _)) in table.iter().enumerate() {
        map.entry(name).or_insert(index);
    }
    map
}

/// Returns the static table for `side`.
pub fn table(side: Side) -> &'static [StaticEntry] {
    match side {
        Side::Client => STATIC_TABLE_CLIENT,
        Side::Server => STATIC_TABLE_SERVER,
    }
}

/// Returns the entry at static-table position `index`, if any.
pub fn get(side: Side, index: usize) -> Option<StaticEntry> {
    table(side).get(index).copied()
}

/// Looks up the first entry with a matching name in the static table,
/// returning its position.
pub fn find_name(side: Side, name: &[u8]) -> Option<usize> {
    let name = std::str::from_utf8(name).ok()?;
    let map = match side {
        Side::Client => &*NAME_INDEX_CLIENT,
        Side::Server => &*NAME_INDEX_SERVER,
    };
    map.get(name).copied()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn finds_name_only_match() {
        let index = find_name(Side::Server, b":status").unwrap();
        assert_eq!(get(Side::Server, index).unwrap().0, ":status");
    }

    #[test]
    fn returns_none_for_unknown_name() {
        assert_eq!(find_name(Side::Client, b"x-unknown-header"), None);
    }

    /// Cross-validates the in-source tables against the JSON fixture that
    /// is the nominal source of truth for this crate's static tables
    /// (§6). Keeps the two representations from silently drifting apart.
    #[test]
    fn matches_fixture_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/static_table.json");
        let raw = std::fs::read_to_string(path).expect("fixture file must be readable");
        let parsed: serde_json::Value = serde_json::from_str(&raw).expect("fixture must be valid JSON");

        for (side, table) in [("client", STATIC_TABLE_CLIENT), ("server", STATIC_TABLE_SERVER)] {
            let expected = parsed[side].as_array().expect("fixture side must be an array");
            assert_eq!(expected.len(), table.len(), "{} table length mismatch", side);
            for (entry, pair) in expected.iter().zip(table.iter()) {
                let name = entry[0].as_str().unwrap();
                let value = entry[1].as_str().unwrap();
                assert_eq!((name, value), *pair);
            }
        }
    }
}
