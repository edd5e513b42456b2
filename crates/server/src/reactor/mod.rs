//! The event loop: one poller, one listener, a slab of connections.
//!
//! Tokens `0` and `1` belong to the listener and the stop waker; connection `n` is registered
//! under token `n + 2`. All sockets are edge-triggered, so every read drains until the socket
//! would block and an accept burst cut short by the burst limit forces a non-blocking poll.

mod connection;
mod tcp_server;

pub use tcp_server::{StopHandle, TcpServer};
