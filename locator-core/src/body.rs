//! Where-response body construction.
//!
//! The response to a content-location query is the matched host
//! addresses, one per line. The body is hard-capped: an entry is written
//! only if the entire `address + '\n'` fits under the ceiling, so a dense
//! result set truncates cleanly after the last whole entry and earlier
//! entries are never corrupted.

use locator_types::HostAddress;

/// Ceiling on a where-response body, in bytes.
pub const MAX_RESPONSE_BODY: usize = 64 * 1024;

/// Render `hosts` as a newline-terminated list bounded by
/// [`MAX_RESPONSE_BODY`].
///
/// Hosts appear in the given order. An empty slice yields an empty body.
pub fn build_location_body(hosts: &[HostAddress]) -> Vec<u8> {
    build_bounded(hosts, MAX_RESPONSE_BODY)
}

fn build_bounded(hosts: &[HostAddress], ceiling: usize) -> Vec<u8> {
    let mut body = Vec::new();
    for host in hosts {
        let line = host.to_string();
        if body.len() + line.len() + 1 > ceiling {
            break;
        }
        body.extend_from_slice(line.as_bytes());
        body.push(b'\n');
    }
    body
}
