//! The capability set the reactor calls into.
//!
//! A [`Handler`] sees a connection three ways: when it is accepted, every time unconsumed
//! bytes are buffered for it, and once when it goes away. All calls happen on the reactor
//! thread, one at a time, so implementations need no synchronisation.

use std::fmt;
use std::net::SocketAddr;

use bytes::BytesMut;

/// Identifies a live connection for the lifetime of its socket.
///
/// Ids are reused after a connection closes, the same way file descriptors are.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) usize);

impl ConnectionId {
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decision taken when a peer connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    /// The socket is closed immediately and never registered.
    Reject,
}

/// What the reactor should do after a data callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was consumed; call again once more bytes arrive.
    AwaitData,
    /// The first `consumed` bytes were handled and are dropped from the receive buffer. Anything
    /// appended to the transmit buffer is flushed and the connection stays open.
    KeepAlive { consumed: usize },
    /// Flush the transmit buffer, then close.
    CloseAfterFlush,
    /// Close right away, discarding pending output.
    Close,
}

/// Protocol logic driven by the reactor.
pub trait Handler {
    /// Called once per accepted socket, before it is registered for readiness.
    fn on_connected(&mut self, id: ConnectionId, peer: SocketAddr) -> Admission;

    /// Called with the contiguous unconsumed bytes of the receive buffer.
    ///
    /// Output goes into `tx`. While `tx` still holds unsent bytes the reactor does not call
    /// this again for the same connection, so at most one response is in flight.
    fn on_data_ready(&mut self, id: ConnectionId, rx: &[u8], tx: &mut BytesMut) -> Outcome;

    /// Called exactly once for every accepted connection, after its socket is closed.
    fn on_disconnected(&mut self, id: ConnectionId);
}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn on_connected(&mut self, id: ConnectionId, peer: SocketAddr) -> Admission {
        (**self).on_connected(id, peer)
    }

    fn on_data_ready(&mut self, id: ConnectionId, rx: &[u8], tx: &mut BytesMut) -> Outcome {
        (**self).on_data_ready(id, rx, tx)
    }

    fn on_disconnected(&mut self, id: ConnectionId) {
        (**self).on_disconnected(id);
    }
}
