//! Single-threaded, readiness-driven TCP server with a pluggable protocol handler.
//!
//! The crate has three layers:
//!
//! - [`TcpServer`]: owns the listening socket, every accepted connection and a [`BufferPool`];
//!   multiplexes them over one `mio` poller on the calling thread
//! - [`Handler`]: what the reactor calls when a connection opens, when it has unconsumed bytes,
//!   and when it closes
//! - [`HttpServer`]: an HTTP/1.x [`Handler`] built on `inter-http`, bundled with a reactor
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::Response;
//! use inter_http::protocol::Request;
//! use inter_server::{HttpServer, service_fn};
//!
//! let mut server = HttpServer::new(service_fn(|request: &Request<'_>, _body: &[u8]| {
//!     Response::new(Bytes::from(format!("hello {}", request.path())))
//! }))?;
//! server.listen(8080, 64)?;
//! # Ok::<(), inter_server::ServerError>(())
//! ```
//!
//! # Stopping
//!
//! [`TcpServer::stop`] and [`StopHandle::stop`] raise a flag and wake the poller. The flag
//! itself is exposed through [`TcpServer::stop_flag`] so it can be set from a signal handler,
//! in which case the loop notices it within one poll timeout.

mod config;
mod error;
mod handler;
mod pool;
mod reactor;
mod server;

pub use config::{ConfigError, ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use handler::{Admission, ConnectionId, Handler, Outcome};
pub use pool::{BufferPair, BufferPool};
pub use reactor::{StopHandle, TcpServer};
pub use server::{HttpHandler, HttpServer, Service, ServiceFn, service_fn};
