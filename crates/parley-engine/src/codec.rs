//! Peer status payload codec.
//!
//! Peer updates arrive as free-text status messages of the informal shape:
//!
//! ```text
//! ... Lambda=<number>, ... Mismatch=<number>, end ...
//! ```
//!
//! The rate field is the text between the literal `Lambda=` and the next
//! comma; the mismatch field is the text between the literal `Mismatch=`
//! and the literal `, end`. Both must parse as finite decimal numbers.
//!
//! Malformed payloads are always surfaced as [`DecodeError`] — never as a
//! fabricated zero value, which would silently poison the update rule.

use crate::error::DecodeError;
use crate::state::PeerObservation;

/// Marker preceding the rate field.
const RATE_MARKER: &str = "Lambda=";

/// Marker preceding the mismatch field.
const MISMATCH_MARKER: &str = "Mismatch=";

/// Terminator following the mismatch field.
const MISMATCH_END: &str = ", end";

/// Decode a raw event payload into the peer's `(rate, mismatch)` pair.
pub fn decode_payload(payload: &[u8]) -> Result<PeerObservation, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
    decode_status(text)
}

/// Decode an already-UTF-8 status message.
pub fn decode_status(text: &str) -> Result<PeerObservation, DecodeError> {
    if text.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let rate_text = capture(text, RATE_MARKER, ",")?;
    let mismatch_text = capture(text, MISMATCH_MARKER, MISMATCH_END)?;

    let rate = parse_field("rate", rate_text)?;
    let mismatch = parse_field("mismatch", mismatch_text)?;

    Ok(PeerObservation { rate, mismatch })
}

/// Format a local `(rate, mismatch)` pair as a status message the peer's
/// codec will decode back to exactly the same values.
///
/// Rust's default f64 formatting is shortest-round-trip, so
/// `decode_status(&format_status(r, m))` recovers `(r, m)` bit-exact.
pub fn format_status(rate: f64, mismatch: f64) -> String {
    format!("Lambda={rate}, Mismatch={mismatch}, end")
}

/// Slice out the text between `marker` and the next occurrence of `until`.
fn capture<'a>(
    text: &'a str,
    marker: &'static str,
    until: &str,
) -> Result<&'a str, DecodeError> {
    let start = text
        .find(marker)
        .ok_or(DecodeError::MissingMarker { marker })?
        + marker.len();
    let rest = &text[start..];
    let end = rest
        .find(until)
        .ok_or(DecodeError::MissingMarker { marker })?;
    Ok(&rest[..end])
}

fn parse_field(field: &'static str, text: &str) -> Result<f64, DecodeError> {
    text.trim().parse::<f64>().map_err(|_| DecodeError::InvalidNumber {
        field,
        text: text.to_string(),
    })
}
