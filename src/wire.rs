//! Shared wire protocol: one message is exactly [`SEQ_LEN`] bytes, a
//! signed 32-bit sequence number. No length prefix, no magic bytes, no
//! version field.
//!
//! The sequence number always travels in network byte order so the
//! exchange is well-defined between hosts of different endianness.

use std::time::Duration;

/// Size of one echo message on the wire.
pub const SEQ_LEN: usize = 4;

/// Fixed sleep between consecutive attempts of one flow.
pub const PACING: Duration = Duration::from_secs(1);

/// Default per-attempt timeout, milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Encode a sequence number for transmission.
pub fn encode_seq(seq: i32) -> [u8; SEQ_LEN] {
    seq.to_be_bytes()
}

/// Decode a received sequence number.
pub fn decode_seq(buf: [u8; SEQ_LEN]) -> i32 {
    i32::from_be_bytes(buf)
}
