//! Line-delimited JSON codec for [`Event`]s.
//!
//! Wire format:
//! ```text
//! {json object}\n{json object}\n...
//! ```
//! One UTF-8 JSON object per event, each terminated by a single `\n`.  There
//! is no length prefix: the newline is the frame boundary, and because every
//! payload field is a number or a boolean the delimiter can never appear
//! inside an object.
//!
//! Decoding is best effort.  The same codec is used on the unreliable
//! channel, so a malformed or truncated chunk is skipped rather than
//! surfaced as an error, and the decoder moves on to the next line.

use tracing::trace;

use crate::protocol::event::Event;

/// Frame delimiter appended after every encoded event.
pub const DELIMITER: u8 = b'\n';

/// Encodes one event as a delimited frame.
///
/// # Examples
///
/// ```rust
/// use padlink_core::protocol::{decode, encode, Event};
///
/// let bytes = encode(&Event::PointerMove { dx: 3, dy: -1 });
/// assert_eq!(bytes.last(), Some(&b'\n'));
/// assert_eq!(decode(&bytes), vec![Event::PointerMove { dx: 3, dy: -1 }]);
/// ```
pub fn encode(event: &Event) -> Vec<u8> {
    let mut buf = Vec::with_capacity(48);
    encode_into(&mut buf, event);
    buf
}

/// Appends one delimited frame to `buf`.
pub fn encode_into(buf: &mut Vec<u8>, event: &Event) {
    // Writing an all-numeric event into a Vec cannot fail.
    if serde_json::to_writer(&mut *buf, event).is_ok() {
        buf.push(DELIMITER);
    }
}

/// Encodes several events back to back, preserving order.
pub fn encode_batch(events: &[Event]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(events.len() * 48);
    for event in events {
        encode_into(&mut buf, event);
    }
    buf
}

/// Decodes every well-formed event in `bytes`, in order.
///
/// Empty lines, malformed JSON and unknown event types are dropped silently
/// (trace-level log only).  A final chunk without a trailing delimiter is
/// kept if it parses as a complete event.
///
/// The decoder keeps no state between calls; callers are expected to hand it
/// whole frames (the sender never splits one event across two sends).
pub fn decode(bytes: &[u8]) -> Vec<Event> {
    bytes
        .split(|b| *b == DELIMITER)
        .filter(|chunk| !chunk.iter().all(u8::is_ascii_whitespace))
        .filter_map(|chunk| match serde_json::from_slice::<Event>(chunk) {
            Ok(event) => Some(event),
            Err(e) => {
                trace!(len = chunk.len(), error = %e, "dropping undecodable chunk");
                None
            }
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
