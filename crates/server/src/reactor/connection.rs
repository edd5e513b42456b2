//! Per-connection state machine.
//!
//! ```text
//! Accepted -> Reading <-> Writing -> Closing
//! ```
//!
//! A connection is `Reading` while it has no unsent output and `Writing` while a partial write
//! left bytes in its transmit buffer. It never blocks: reads drain the socket until it would
//! block, writes stop at the first would-block and resume on the next writable event.
//!
//! A peer that half-closes still gets answers to whatever it sent before its FIN. The
//! connection closes once that input is handled and the replies are flushed.

use std::io;
use std::io::{Read, Write};
use std::net::SocketAddr;

use bytes::Buf;
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};
use tracing::{debug, trace};

use crate::handler::{ConnectionId, Handler, Outcome};
use crate::pool::BufferPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Accepted,
    Reading,
    Writing,
    Closing,
}

impl State {
    fn interest(self) -> Interest {
        match self {
            State::Writing => Interest::READABLE | Interest::WRITABLE,
            _ => Interest::READABLE,
        }
    }
}

/// Result of draining the socket.
#[derive(Debug, PartialEq, Eq)]
enum Fill {
    Drained,
    Eof,
    Overflow,
}

pub(crate) struct Connection {
    id: ConnectionId,
    stream: TcpStream,
    peer: SocketAddr,
    buffers: BufferPair,
    state: State,
    registered: Option<Interest>,
    close_after_flush: bool,
    read_closed: bool,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, stream: TcpStream, peer: SocketAddr, buffers: BufferPair) -> Self {
        Self { id, stream, peer, buffers, state: State::Accepted, registered: None, close_after_flush: false, read_closed: false }
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) fn register(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        let interest = State::Reading.interest();
        registry.register(&mut self.stream, token, interest)?;
        self.registered = Some(interest);
        self.state = State::Reading;
        Ok(())
    }

    /// Brings the poller registration in line with the current state.
    pub(crate) fn update_interest(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        let wanted = self.state.interest();
        if self.registered == Some(wanted) {
            return Ok(());
        }
        registry.reregister(&mut self.stream, token, wanted)?;
        self.registered = Some(wanted);
        Ok(())
    }

    /// Deregisters the socket and hands back the buffers. The socket is closed on drop.
    pub(crate) fn shutdown(mut self, registry: &Registry) -> BufferPair {
        if self.registered.take().is_some() {
            if let Err(e) = registry.deregister(&mut self.stream) {
                debug!(connection = %self.id, cause = %e, "failed to deregister connection");
            }
        }
        self.state = State::Closing;
        self.buffers
    }

    /// Processes one readiness event and returns the state the connection ends up in.
    pub(crate) fn ready<H: Handler + ?Sized>(
        &mut self,
        readable: bool,
        handler: &mut H,
        rx_chunk: usize,
        max_rx_buffer: usize,
    ) -> State {
        if readable && !self.read_closed {
            match self.fill(rx_chunk, max_rx_buffer) {
                Ok(Fill::Drained) => {}
                Ok(Fill::Eof) => {
                    trace!(connection = %self.id, pending = self.buffers.rx.len(), "peer closed its side");
                    self.read_closed = true;
                }
                Ok(Fill::Overflow) => {
                    debug!(connection = %self.id, max_rx_buffer, "receive buffer limit exceeded");
                    return self.closing();
                }
                Err(e) => {
                    debug!(connection = %self.id, cause = %e, "read failed");
                    return self.closing();
                }
            }
        }
        self.drive(handler)
    }

    /// Alternates flushing and dispatching until output blocks or no more input can be handled.
    fn drive<H: Handler + ?Sized>(&mut self, handler: &mut H) -> State {
        let mut dispatch = true;
        loop {
            if !self.buffers.tx.is_empty() {
                match self.flush() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.state = State::Writing;
                        return self.state;
                    }
                    Err(e) => {
                        debug!(connection = %self.id, cause = %e, "write failed");
                        return self.closing();
                    }
                }
            }

            if self.close_after_flush {
                return self.closing();
            }

            if !dispatch || self.buffers.rx.is_empty() {
                // no more input will arrive to complete what is left
                if self.read_closed {
                    return self.closing();
                }
                self.state = State::Reading;
                return self.state;
            }

            let BufferPair { rx, tx } = &mut self.buffers;
            match handler.on_data_ready(self.id, rx, tx) {
                Outcome::AwaitData => dispatch = false,
                Outcome::KeepAlive { consumed } => {
                    let consumed = consumed.min(rx.len());
                    rx.advance(consumed);
                    dispatch = consumed > 0;
                }
                Outcome::CloseAfterFlush => self.close_after_flush = true,
                Outcome::Close => return self.closing(),
            }
        }
    }

    fn closing(&mut self) -> State {
        self.state = State::Closing;
        self.state
    }

    /// Reads until the socket would block, growing the receive buffer as needed.
    fn fill(&mut self, chunk: usize, max_rx_buffer: usize) -> io::Result<Fill> {
        let rx = &mut self.buffers.rx;
        loop {
            let filled = rx.len();
            rx.resize(filled + chunk, 0);

            let result = self.stream.read(&mut rx[filled..]);
            match result {
                Ok(0) => {
                    rx.truncate(filled);
                    return Ok(Fill::Eof);
                }
                Ok(n) => {
                    rx.truncate(filled + n);
                    if rx.len() > max_rx_buffer {
                        return Ok(Fill::Overflow);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    rx.truncate(filled);
                    return Ok(Fill::Drained);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    rx.truncate(filled);
                }
                Err(e) => {
                    rx.truncate(filled);
                    return Err(e);
                }
            }
        }
    }

    /// Writes as much pending output as the socket takes. `Ok(true)` once nothing is left.
    fn flush(&mut self) -> io::Result<bool> {
        let tx = &mut self.buffers.tx;
        while !tx.is_empty() {
            match self.stream.write(tx) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => tx.advance(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}
