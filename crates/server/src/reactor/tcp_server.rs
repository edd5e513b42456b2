use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use std::{fmt, io};

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Registry, Token, Waker};
use slab::Slab;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, error, info, trace, warn};

use super::connection::{Connection, State};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::{Admission, ConnectionId, Handler};
use crate::pool::BufferPool;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

fn token_of(id: ConnectionId) -> Token {
    Token(id.0 + FIRST_CONNECTION)
}

/// Requests a running [`TcpServer`] to stop, from any thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl StopHandle {
    /// Raises the stop flag and interrupts the current readiness wait.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
        if let Err(e) = self.waker.wake() {
            warn!(cause = %e, "failed to wake the reactor, it stops after the current poll timeout");
        }
    }
}

/// Single-threaded, readiness-driven TCP server.
///
/// One `TcpServer` owns a listener, every connection accepted from it, and the buffer pool those
/// connections draw from. [`run`](Self::run) drives them all on the calling thread and hands
/// protocol work to a [`Handler`].
///
/// ```no_run
/// use std::net::SocketAddr;
///
/// use bytes::BytesMut;
/// use inter_server::{Admission, ConnectionId, Handler, Outcome, ServerConfig, TcpServer};
///
/// struct Echo;
///
/// impl Handler for Echo {
///     fn on_connected(&mut self, _id: ConnectionId, _peer: SocketAddr) -> Admission {
///         Admission::Accept
///     }
///
///     fn on_data_ready(&mut self, _id: ConnectionId, rx: &[u8], tx: &mut BytesMut) -> Outcome {
///         tx.extend_from_slice(rx);
///         Outcome::KeepAlive { consumed: rx.len() }
///     }
///
///     fn on_disconnected(&mut self, _id: ConnectionId) {}
/// }
///
/// let mut server = TcpServer::new(ServerConfig::default()).unwrap();
/// server.listen(7878, &mut Echo, 64).unwrap();
/// ```
pub struct TcpServer {
    config: ServerConfig,
    poll: Poll,
    waker: Arc<Waker>,
    stop: Arc<AtomicBool>,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    connections: Slab<Connection>,
    pool: BufferPool,
    accept_pending: bool,
}

impl fmt::Debug for TcpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpServer")
            .field("local_addr", &self.local_addr)
            .field("connections", &self.connections.len())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl TcpServer {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let poll = Poll::new().map_err(ServerError::poll)?;
        let waker = Waker::new(poll.registry(), WAKER).map_err(ServerError::register)?;
        Ok(Self {
            config,
            poll,
            waker: Arc::new(waker),
            stop: Arc::new(AtomicBool::new(false)),
            listener: None,
            local_addr: None,
            connections: Slab::new(),
            pool: BufferPool::new(),
            accept_pending: false,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds `port` on every IPv4 interface. Port `0` picks a free port, see [`local_addr`](Self::local_addr).
    pub fn bind(&mut self, port: u16, backlog: u32) -> Result<SocketAddr, ServerError> {
        self.bind_addr(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), backlog)
    }

    /// Creates a listening socket with address reuse on, and registers it with the poller.
    pub fn bind_addr(&mut self, addr: SocketAddr, backlog: u32) -> Result<SocketAddr, ServerError> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP)).map_err(ServerError::socket)?;
        socket.set_reuse_address(true).map_err(ServerError::socket)?;
        socket.set_nonblocking(true).map_err(ServerError::socket)?;
        socket.bind(&addr.into()).map_err(|e| ServerError::bind(addr, e))?;
        socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX)).map_err(ServerError::listen)?;

        let mut listener = TcpListener::from_std(socket.into());
        let local_addr = listener.local_addr().map_err(ServerError::socket)?;

        if let Some(mut previous) = self.listener.take() {
            if let Err(e) = self.poll.registry().deregister(&mut previous) {
                debug!(cause = %e, "failed to deregister previous listener");
            }
        }
        self.poll.registry().register(&mut listener, LISTENER, Interest::READABLE).map_err(ServerError::register)?;

        info!(addr = %local_addr, backlog, "listening");
        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Binds and runs until stopped.
    pub fn listen<H: Handler + ?Sized>(&mut self, port: u16, handler: &mut H, backlog: u32) -> Result<(), ServerError> {
        self.bind(port, backlog)?;
        self.run(handler)
    }

    /// [`listen`](Self::listen) with the port and backlog taken from the configuration.
    pub fn serve<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<(), ServerError> {
        self.listen(self.config.port(), handler, self.config.backlog())
    }

    /// Drives the event loop on the calling thread until [`stop`](Self::stop) is requested.
    ///
    /// Every connection still open when the loop ends is closed through the regular close
    /// path, so `on_disconnected` fires for each before this returns.
    pub fn run<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<(), ServerError> {
        if self.listener.is_none() {
            return Err(ServerError::NotBound);
        }

        let mut events = Events::with_capacity(self.config.events_capacity());
        let result = loop {
            if self.stop.load(Ordering::Acquire) {
                break Ok(());
            }

            let timeout = if self.accept_pending { Duration::ZERO } else { self.config.poll_timeout() };
            if let Err(e) = self.poll.poll(&mut events, Some(timeout)) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!(cause = %e, "poll failed, stopping the reactor");
                break Err(ServerError::poll(e));
            }

            if self.accept_pending || events.iter().any(|event| event.token() == LISTENER) {
                self.accept(handler);
            }

            for event in &events {
                let token = event.token();
                if token == LISTENER || token == WAKER {
                    continue;
                }

                let key = token.0 - FIRST_CONNECTION;
                let Some(connection) = self.connections.get_mut(key) else {
                    continue;
                };

                let state = if event.is_error() {
                    debug!(connection = %connection.id(), "socket error reported by the poller");
                    State::Closing
                } else {
                    let readable = event.is_readable() || event.is_read_closed();
                    connection.ready(readable, handler, self.config.rx_buffer_size(), self.config.max_rx_buffer())
                };

                if state == State::Closing {
                    self.close(key, handler);
                } else if let Err(e) = connection.update_interest(self.poll.registry(), token) {
                    warn!(connection = %connection.id(), cause = %e, "failed to update interest");
                    self.close(key, handler);
                }
            }
        };

        let open = self.connections.len();
        for connection in self.connections.drain() {
            release(self.poll.registry(), &mut self.pool, handler, connection);
        }
        self.stop.store(false, Ordering::Release);
        self.accept_pending = false;
        info!(closed = open, "reactor stopped");
        result
    }

    /// Raises the stop flag; the loop ends before its next readiness wait.
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { flag: Arc::clone(&self.stop), waker: Arc::clone(&self.waker) }
    }

    /// The raw stop flag, for registering with a signal handler.
    ///
    /// Setting it directly does not interrupt the current wait, so the loop notices it within
    /// one poll timeout.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Accepts until the listener would block or the burst limit is reached.
    ///
    /// The listener is edge-triggered, so whenever the loop stops short of would-block the
    /// accept stays pending and the next poll does not wait.
    fn accept<H: Handler + ?Sized>(&mut self, handler: &mut H) {
        self.accept_pending = false;
        let Some(listener) = self.listener.as_ref() else {
            return;
        };

        for _ in 0..self.config.accept_burst() {
            let (stream, peer) = match listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::ConnectionAborted => {
                    debug!(cause = %e, "peer aborted before accept");
                    continue;
                }
                Err(e) => {
                    // descriptor or buffer exhaustion; the backlog is still there, retry next cycle
                    warn!(cause = %e, "failed to accept");
                    self.accept_pending = true;
                    return;
                }
            };

            let entry = self.connections.vacant_entry();
            let id = ConnectionId(entry.key());
            if handler.on_connected(id, peer) == Admission::Reject {
                debug!(%peer, "connection rejected");
                continue;
            }

            let buffers = self.pool.acquire(self.config.rx_buffer_size(), self.config.tx_buffer_size());
            let mut connection = Connection::new(id, stream, peer, buffers);
            if let Err(e) = connection.register(self.poll.registry(), token_of(id)) {
                warn!(connection = %id, cause = %e, "failed to register connection");
                release(self.poll.registry(), &mut self.pool, handler, connection);
                continue;
            }

            trace!(connection = %id, %peer, "connection accepted");
            entry.insert(connection);
        }

        self.accept_pending = true;
    }

    fn close<H: Handler + ?Sized>(&mut self, key: usize, handler: &mut H) {
        if let Some(connection) = self.connections.try_remove(key) {
            release(self.poll.registry(), &mut self.pool, handler, connection);
        }
    }
}

/// The one close path: deregister, close the socket, notify the handler, recycle the buffers.
fn release<H: Handler + ?Sized>(registry: &Registry, pool: &mut BufferPool, handler: &mut H, connection: Connection) {
    let id = connection.id();
    let peer = connection.peer();
    let buffers = connection.shutdown(registry);
    handler.on_disconnected(id);
    pool.release(buffers);
    trace!(connection = %id, %peer, "connection closed");
}
