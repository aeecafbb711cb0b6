//! Single-threaded echo service.
//!
//! Readiness-based model: one `poll` call per iteration covers the
//! listener and every connected peer, then non-blocking syscalls do the
//! actual I/O. All peer state lives in a [`Slab`] owned by the loop
//! thread, so there is no synchronisation anywhere.
//!
//! Peer lifecycle is purely peer-driven: there is no connection cap and
//! no idle eviction, a peer stays in the set until it closes or resets.

use crate::wire;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Registry, Token};
use slab::Slab;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use tracing::{debug, warn};

const LISTENER_TOKEN: Token = Token(usize::MAX);

const EVENT_CAPACITY: usize = 1024;

/// One accepted connection.
///
/// `buf`/`filled` stage a single in-flight message: non-blocking reads
/// may deliver the 4 bytes in fragments, but the buffer never spans
/// more than one message.
struct Peer {
    stream: TcpStream,
    addr: SocketAddr,
    buf: [u8; wire::SEQ_LEN],
    filled: usize,
}

/// The echo service: listener, poller and the peer set.
pub struct EchoServer {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    peers: Slab<Peer>,
}

impl EchoServer {
    /// Bind the listener and prepare the poller. Bind/listen failures
    /// are setup-fatal and surface here.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;

        Ok(Self {
            poll,
            events: Events::with_capacity(EVENT_CAPACITY),
            listener,
            peers: Slab::new(),
        })
    }

    /// Address the listener actually bound to (port 0 resolves here).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the control loop. Never returns on its own; an `Err` is a
    /// fatal I/O failure the service cannot continue past.
    pub fn run(mut self) -> io::Result<()> {
        loop {
            // Blocks indefinitely until some socket has activity.
            self.poll.poll(&mut self.events, None)?;

            let mut closed: Vec<usize> = Vec::new();
            for event in self.events.iter() {
                match event.token() {
                    LISTENER_TOKEN => {
                        accept_pending(&self.listener, self.poll.registry(), &mut self.peers)?
                    }
                    Token(id) => service_peer(&mut self.peers, id, &mut closed)?,
                }
            }

            // Deferred removal keeps the peer set stable while the
            // event batch is walked.
            for id in closed {
                if let Some(mut peer) = self.peers.try_remove(id) {
                    let _ = self.poll.registry().deregister(&mut peer.stream);
                    debug!(peer = %peer.addr, "peer closed");
                }
            }
        }
    }
}

/// Drain the accept queue. Readiness is edge-style, so every pending
/// connection must be taken now; `WouldBlock` means the queue is empty.
/// Any other accept failure is fatal, the service cannot continue
/// without a healthy listener.
fn accept_pending(
    listener: &TcpListener,
    registry: &Registry,
    peers: &mut Slab<Peer>,
) -> io::Result<()> {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                let entry = peers.vacant_entry();
                let id = entry.key();
                let peer = entry.insert(Peer {
                    stream,
                    addr,
                    buf: [0u8; wire::SEQ_LEN],
                    filled: 0,
                });
                registry.register(&mut peer.stream, Token(id), Interest::READABLE)?;
                debug!(peer = %addr, conn_id = id, "accepted connection");
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Serve one ready peer: read until `WouldBlock`, echoing every
/// complete message straight back.
///
/// * zero-length read - orderly close, mark for removal;
/// * read reset - benign, skip this readiness, the close event follows;
/// * any other read error - fatal to the whole service;
/// * echo-write reset/pipe - tolerated silently, other write errors are
///   fatal.
fn service_peer(peers: &mut Slab<Peer>, id: usize, closed: &mut Vec<usize>) -> io::Result<()> {
    let Some(peer) = peers.get_mut(id) else {
        // Event for a peer removed earlier in this batch.
        return Ok(());
    };

    loop {
        match peer.stream.read(&mut peer.buf[peer.filled..]) {
            Ok(0) => {
                closed.push(id);
                return Ok(());
            }
            Ok(n) => {
                peer.filled += n;
                if peer.filled == wire::SEQ_LEN {
                    peer.filled = 0;
                    println!("recv from {}", peer.addr);
                    echo_back(peer)?;
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => {
                debug!(peer = %peer.addr, "read reset");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}

/// Echo the staged message back to its sender.
fn echo_back(peer: &mut Peer) -> io::Result<()> {
    match peer.stream.write_all(&peer.buf) {
        Ok(()) => Ok(()),
        Err(ref e)
            if matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe
            ) =>
        {
            debug!(peer = %peer.addr, "echo dropped, peer gone");
            Ok(())
        }
        // A 4-byte write into a fresh send buffer essentially never
        // blocks; if it does, drop the echo and let the client time out
        // rather than grow a write-interest state machine.
        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
            warn!(peer = %peer.addr, "send buffer full, echo dropped");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
