//! One probing flow against one target.
//!
//! A flow is strictly half-duplex: connect, then repeat
//! send-sequence-number / await-matching-echo / measure, sleeping one
//! second between attempts. The deadlines on the socket make every
//! blocking call resolve within the configured timeout.
//!
//! Outcome taxonomy:
//! * timeout, would-block, refused connect, peer reset/close - reported
//!   as a timeout event; the flow continues or ends as described below;
//! * any other I/O error - fatal, returned to the caller and ends only
//!   this flow.

use crate::error::Result;
use crate::formatter::Formatter;
use crate::wire;
use serde::Serialize;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of a single attempt, handed to the formatter layer.
///
/// This structure may be serialised as JSON by the formatter layer.
#[derive(Clone, Debug, Serialize)]
pub struct ProbeEvent {
    pub addr: SocketAddr,
    pub attempt: u32,
    pub success: bool,
    pub rtt_ms: Option<u64>,
}

impl ProbeEvent {
    pub fn success(addr: SocketAddr, attempt: u32, rtt_ms: u64) -> Self {
        Self {
            addr,
            attempt,
            success: true,
            rtt_ms: Some(rtt_ms),
        }
    }

    pub fn timeout(addr: SocketAddr, attempt: u32) -> Self {
        Self {
            addr,
            attempt,
            success: false,
            rtt_ms: None,
        }
    }
}

/// Result of the full 4-byte read for one attempt.
enum ReadOutcome {
    /// Four bytes arrived and decoded.
    Seq(i32),
    /// Orderly close (zero-length read) before a full message.
    Closed,
}

/// Run one complete probing flow.
///
/// * `target`  - endpoint to probe
/// * `count`   - attempts to make; `0` means probe forever
/// * `timeout` - deadline applied to connect, send and receive
///
/// Events are pushed to `fmt` as they resolve. Returns `Err` only for
/// fatal local errors; transient outcomes are events, not errors.
pub fn run_flow(
    target: SocketAddr,
    count: u32,
    timeout: Duration,
    fmt: &dyn Formatter,
) -> Result<()> {
    let mut stream = match TcpStream::connect_timeout(&target, timeout) {
        Ok(stream) => stream,
        Err(e) if is_unreachable(&e) => {
            fmt.event(&ProbeEvent::timeout(target, 0));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    debug!(target_addr = %target, "flow connected");

    let mut attempt: u32 = 0;
    while count == 0 || attempt < count {
        if attempt > 0 {
            thread::sleep(wire::PACING);
        }

        let seq = attempt as i32;
        let started = Instant::now();

        match stream.write_all(&wire::encode_seq(seq)) {
            Ok(()) => {}
            Err(e) if is_peer_gone(&e) => {
                fmt.event(&ProbeEvent::timeout(target, attempt));
                break;
            }
            Err(e) => return Err(e.into()),
        }

        match read_seq(&mut stream) {
            Ok(ReadOutcome::Seq(echo)) if echo == seq => {
                let elapsed = started.elapsed();
                if elapsed > timeout {
                    fmt.event(&ProbeEvent::timeout(target, attempt));
                } else {
                    let rtt_ms = elapsed.as_millis() as u64;
                    fmt.event(&ProbeEvent::success(target, attempt, rtt_ms));
                }
            }
            // Mismatched echo (e.g. a stale reply from a timed-out
            // attempt): no RTT, next attempt resynchronises.
            Ok(ReadOutcome::Seq(echo)) => {
                debug!(target_addr = %target, sent = seq, got = echo, "sequence mismatch");
                fmt.event(&ProbeEvent::timeout(target, attempt));
            }
            Ok(ReadOutcome::Closed) => {
                fmt.event(&ProbeEvent::timeout(target, attempt));
                break;
            }
            Err(e) if is_timeout(&e) => {
                fmt.event(&ProbeEvent::timeout(target, attempt));
            }
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                fmt.event(&ProbeEvent::timeout(target, attempt));
                break;
            }
            Err(e) => return Err(e.into()),
        }

        attempt += 1;
    }

    // Socket closes on drop.
    Ok(())
}

/// Full-read semantics: keep reading until a whole message arrived, the
/// socket deadline fires, or the peer closes.
///
/// Bytes staged when the deadline fires are discarded with the attempt.
/// If the peer later delivers the rest, the stream is misaligned from
/// then on: each following attempt decodes a stale or shifted value,
/// fails the sequence comparison and resolves as that attempt's timeout
/// event, so the event stream stays well-formed either way.
fn read_seq(stream: &mut TcpStream) -> io::Result<ReadOutcome> {
    let mut buf = [0u8; wire::SEQ_LEN];
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Ok(ReadOutcome::Closed),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(ReadOutcome::Seq(wire::decode_seq(buf)))
}

/// Connect outcomes reported as a timeout event rather than an error.
fn is_unreachable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Deadline expiry on a socket with SO_RCVTIMEO/SO_SNDTIMEO set shows
/// up as WouldBlock on Unix and TimedOut on Windows.
fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Send failures meaning the peer is gone: end the flow with a timeout
/// event instead of a hard error.
fn is_peer_gone(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
    )
}
