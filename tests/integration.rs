use httlib_hd::{Deflater, HdError, Inflater, Side};

fn pairs(raw: &[(&[u8], &[u8])]) -> Vec<(Vec<u8>, Vec<u8>)> {
    raw.iter().map(|(n, v)| (n.to_vec(), v.to_vec())).collect()
}

/// Checks that `block` round-trips as the same multiset of header pairs.
///
/// Decode order only matches the caller's original order when a block is
/// either entirely fresh or an exact repeat of the previous one — once a
/// block mixes reference-set carries with new or re-toggled headers, the
/// implicit-emit pass (§4.6, run after the block's explicit
/// representations) appends the carried entries afterward, since none of
/// the wire forms carries a position for the zero-byte implicit path (see
/// DESIGN.md). A sorted comparison checks content fidelity without
/// asserting positions the protocol can't guarantee.
fn assert_round_trip(deflater: &mut Deflater, inflater: &mut Inflater, block: &[(Vec<u8>, Vec<u8>)]) {
    let wire = deflater.deflate(block).unwrap();
    let decoded = inflater.inflate(&wire).unwrap();
    assert_eq!(decoded.len(), block.len(), "header count mismatch for {block:?}");

    let mut expected: Vec<(&[u8], &[u8])> = block.iter().map(|(n, v)| (n.as_slice(), v.as_slice())).collect();
    let mut actual: Vec<(&[u8], &[u8])> = decoded.iter().map(|f| (&*f.name, &*f.value)).collect();
    expected.sort_unstable();
    actual.sort_unstable();
    assert_eq!(actual, expected, "header contents mismatch for {block:?}");
}

/// Scenario 1: a repeated (name, value) pair across two blocks is
/// encoded as a literal the first time and an indexed reference the
/// second.
#[test]
fn single_indexed_name_reuse() {
    let mut deflater = Deflater::new(Side::Client);
    let mut inflater = Inflater::new(Side::Client);

    let block = pairs(&[(b"x-request-id", b"abc123")]);
    let first_wire = deflater.deflate(&block).unwrap();
    assert_eq!(first_wire[0] & 0xc0, 0x40); // literal, incremental indexing

    inflater.inflate(&first_wire).unwrap();

    let second_wire = deflater.deflate(&block).unwrap();
    assert!(second_wire.is_empty()); // implicit: already in refset, unchanged

    let decoded = inflater.inflate(&second_wire).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(&*decoded[0].name, b"x-request-id");
    assert_eq!(&*decoded[0].value, b"abc123");
}

/// Scenario 2: a header present in one block and absent from the next is
/// toggled out of the reference set via an explicit indexed
/// representation, and does not reappear on the peer.
#[test]
fn reference_set_subtraction() {
    let mut deflater = Deflater::new(Side::Client);
    let mut inflater = Inflater::new(Side::Client);

    let first = pairs(&[(b"x-a", b"1"), (b"x-b", b"2")]);
    assert_round_trip(&mut deflater, &mut inflater, &first);

    let second = pairs(&[(b"x-a", b"1")]);
    let wire = deflater.deflate(&second).unwrap();
    assert!(!wire.is_empty()); // must toggle x-b out explicitly

    let decoded = inflater.inflate(&wire).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(&*decoded[0].name, b"x-a");
}

/// Scenario 3: once the table is under byte pressure, a header reusing
/// an existing name is encoded with substitution indexing rather than a
/// plain insertion. Budget fits exactly two 36-byte entries ("nm" + a
/// 2-byte value + the 32-byte overhead), so the third reuse of "nm"
/// forces substitution; the preceding block's now-stale value is first
/// toggled out of the reference set (an `Indexed` representation), so
/// the substitution-family byte is the block's *second* representation.
#[test]
fn substitution_under_byte_pressure() {
    let budget = 36 * 2;
    let mut deflater = Deflater::with_dynamic_size(Side::Client, budget);
    let mut inflater = Inflater::with_dynamic_size(Side::Client, budget);

    assert_round_trip(&mut deflater, &mut inflater, &pairs(&[(b"nm", b"v1")]));
    assert_round_trip(&mut deflater, &mut inflater, &pairs(&[(b"nm", b"v2")]));

    let wire = deflater.deflate(&pairs(&[(b"nm", b"v3")])).unwrap();
    assert_eq!(wire[0] & 0x80, 0x80, "expected a mark-phase toggle-off first");
    assert_eq!(wire[1] & 0xe0, 0x20, "expected substitution-indexing family next");

    let decoded = inflater.inflate(&wire).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(&*decoded[0].value, b"v3");
}

/// Scenario 4: a header whose value would make its entry exceed the
/// per-entry cap is always emitted as a literal without indexing and
/// never enters the table.
#[test]
fn oversize_literal_never_enters_the_table() {
    let mut deflater = Deflater::new(Side::Client);
    let mut inflater = Inflater::new(Side::Client);

    let huge_value = vec![b'v'; httlib_hd::HD_MAX_ENTRY_SIZE];
    let block = vec![(b"x-huge".to_vec(), huge_value)];
    let wire = deflater.deflate(&block).unwrap();
    assert_eq!(wire[0] & 0xf0, 0x00);

    let decoded = inflater.inflate(&wire).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(&*decoded[0].value, block[0].1.as_slice());
}

/// Scenario 5: an `Indexed` representation carrying wire value `0`
/// clears the entire reference set on the inflater.
#[test]
fn index_zero_clears_the_reference_set() {
    let mut deflater = Deflater::new(Side::Client);
    let mut inflater = Inflater::new(Side::Client);

    assert_round_trip(&mut deflater, &mut inflater, &pairs(&[(b"x-a", b"1"), (b"x-b", b"2")]));

    let clear_all = vec![0x80u8]; // Indexed, wire value 0
    let decoded = inflater.inflate(&clear_all).unwrap();
    assert!(decoded.is_empty());

    // With the refset cleared, the previously-seen headers are no longer
    // emitted implicitly on the next empty block.
    let following = inflater.inflate(&[]).unwrap();
    assert!(following.is_empty());
}

/// Scenario 6: once a context hits a protocol violation it stays in the
/// bad state and rejects every subsequent call without mutating
/// anything further.
#[test]
fn bad_state_stickiness() {
    let mut inflater = Inflater::new(Side::Client);
    let garbage = vec![0x40u8, 0x7f, 0x80]; // unterminated continuation
    assert!(inflater.inflate(&garbage).is_err());
    assert_eq!(inflater.inflate(&[]), Err(HdError::Bad));
    assert_eq!(inflater.inflate(&[0x00, 1, b'a', 1, b'b']), Err(HdError::Bad));
}

/// P1: decoded headers equal the originally encoded headers across a
/// longer history of varied blocks, including ones that mix reference-set
/// carries with newly introduced headers.
#[test]
fn decoded_headers_match_encoded_headers_across_a_history() {
    let mut deflater = Deflater::new(Side::Server);
    let mut inflater = Inflater::new(Side::Server);

    let history = vec![
        pairs(&[(b":status", b"200"), (b"content-type", b"text/html")]),
        pairs(&[(b":status", b"200"), (b"content-type", b"text/html"), (b"etag", b"v1")]),
        pairs(&[(b":status", b"200")]),
        pairs(&[(b"content-type", b"application/json"), (b"etag", b"v2")]),
    ];
    for block in &history {
        assert_round_trip(&mut deflater, &mut inflater, block);
    }
}

/// P7: a non-cacheable header name never appears in the table after a
/// full block is encoded and the block boundary crossed.
#[test]
fn non_cacheable_headers_never_enter_the_table() {
    let mut deflater = Deflater::new(Side::Client);
    let block = pairs(&[(b":path", b"/a"), (b"etag", b"abc"), (b"set-cookie", b"s=1")]);
    deflater.deflate(&block).unwrap();
    deflater.end_headers();

    // Re-encoding the same block must not produce any indexed references
    // (which would only be possible if the names had been inserted).
    let wire = deflater.deflate(&block).unwrap();
    assert!(wire.iter().all(|&byte| byte & 0x80 == 0));
}

/// A header pair repeated twice within the same fresh block: the first
/// occurrence inserts a new entry, and the second must not mistake it for
/// an already-implicit refset member — it has to be re-emitted explicitly
/// (correction phase, §4.5 step 3), since the peer's own insert already
/// marks the entry emitted for this same block.
#[test]
fn duplicate_pair_within_a_single_fresh_block_round_trips() {
    let mut deflater = Deflater::new(Side::Client);
    let mut inflater = Inflater::new(Side::Client);

    let headers = pairs(&[(b"x-dup", b"v"), (b"x-dup", b"v")]);
    let wire = deflater.deflate(&headers).unwrap();
    let decoded = inflater.inflate(&wire).unwrap();
    assert_eq!(decoded.len(), headers.len());
    for field in &decoded {
        assert_eq!(&*field.name, b"x-dup");
        assert_eq!(&*field.value, b"v");
    }
}

