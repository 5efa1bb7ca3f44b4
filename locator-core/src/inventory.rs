//! Ingest payload parsing.
//!
//! Inventory uploads are newline-separated UTF-8 content identifiers with
//! no framing, terminated by the peer closing its write side. This module
//! defines the size ceiling and the parsing rules: blank lines are
//! skipped, invalid UTF-8 is decoded lossily, and a payload cut off at
//! the ceiling loses its partial trailing line rather than registering a
//! corrupt key.

use locator_types::ContentKey;

/// Ceiling on an inventory upload, in bytes.
pub const MAX_INGEST_BYTES: usize = 64 * 1024;

/// Acknowledgement bytes sent back after a registration is applied.
pub const INGEST_ACK: &[u8] = b"OK";

/// Bound `payload` to [`MAX_INGEST_BYTES`].
///
/// When the payload exceeds the ceiling it is cut at the last newline
/// within the cap, so the surviving prefix is whole records only.
/// Returns the bounded slice and whether truncation happened.
pub fn clamp_ingest_payload(payload: &[u8]) -> (&[u8], bool) {
    if payload.len() <= MAX_INGEST_BYTES {
        return (payload, false);
    }
    let capped = &payload[..MAX_INGEST_BYTES];
    match capped.iter().rposition(|&b| b == b'\n') {
        Some(pos) => (&capped[..=pos], true),
        None => (&[], true),
    }
}

/// Parse an inventory payload into content keys.
///
/// Splits on newlines; empty and whitespace-only lines are ignored.
pub fn parse_inventory(payload: &[u8]) -> Vec<ContentKey> {
    String::from_utf8_lossy(payload)
        .lines()
        .filter_map(ContentKey::new)
        .collect()
}
