//! HTTP/1.x on top of the reactor.
//!
//! [`HttpHandler`] is the [`Handler`] that turns buffered bytes into [`Request`] views, waits
//! for a `Content-Length` body, asks a [`Service`] for the response and encodes it into the
//! transmit buffer. [`HttpServer`] bundles it with a [`TcpServer`].

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use bytes::{Bytes, BytesMut};
use http::Response;
use inter_http::codec::{Parsed, RequestParser, ResponseEncoder};
use inter_http::protocol::{HttpError, KnownHeader, Request};
use tracing::{debug, trace, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::{Admission, ConnectionId, Handler, Outcome};
use crate::reactor::{StopHandle, TcpServer};

/// Produces the response for one complete request.
pub trait Service {
    fn call(&mut self, request: &Request<'_>, body: &[u8]) -> Response<Bytes>;
}

#[derive(Debug)]
pub struct ServiceFn<F> {
    f: F,
}

impl<F> Service for ServiceFn<F>
where
    F: FnMut(&Request<'_>, &[u8]) -> Response<Bytes>,
{
    fn call(&mut self, request: &Request<'_>, body: &[u8]) -> Response<Bytes> {
        (self.f)(request, body)
    }
}

/// Wraps a closure into a [`Service`].
pub fn service_fn<F>(f: F) -> ServiceFn<F>
where
    F: FnMut(&Request<'_>, &[u8]) -> Response<Bytes>,
{
    ServiceFn { f }
}

impl<S: Service + ?Sized> Service for Box<S> {
    fn call(&mut self, request: &Request<'_>, body: &[u8]) -> Response<Bytes> {
        (**self).call(request, body)
    }
}

/// [`Handler`] speaking HTTP/1.x, one request in flight per connection.
pub struct HttpHandler<S> {
    service: S,
    parser: RequestParser,
    encoder: ResponseEncoder,
}

impl<S> fmt::Debug for HttpHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHandler").field("parser", &self.parser).finish_non_exhaustive()
    }
}

impl<S: Service> HttpHandler<S> {
    pub fn new(service: S) -> Self {
        Self::with_parser(service, RequestParser::new())
    }

    pub fn with_parser(service: S, parser: RequestParser) -> Self {
        Self { service, parser, encoder: ResponseEncoder::new() }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    fn reject(&self, id: ConnectionId, error: HttpError, tx: &mut BytesMut) -> Outcome {
        debug!(connection = %id, status = error.code(), "rejecting request");
        self.encoder.encode_error(error, tx);
        Outcome::CloseAfterFlush
    }
}

impl<S: Service> Handler for HttpHandler<S> {
    fn on_connected(&mut self, id: ConnectionId, peer: SocketAddr) -> Admission {
        trace!(connection = %id, %peer, "http connection opened");
        Admission::Accept
    }

    fn on_data_ready(&mut self, id: ConnectionId, rx: &[u8], tx: &mut BytesMut) -> Outcome {
        let (request, head_len) = match self.parser.parse(rx) {
            Ok(Parsed::Complete { request, consumed }) => (request, consumed),
            Ok(Parsed::Incomplete) => return Outcome::AwaitData,
            Err(e) => {
                warn!(connection = %id, cause = %e, "failed to parse request");
                return self.reject(id, e.http_error(), tx);
            }
        };

        if request.get("transfer-encoding").is_some() {
            return self.reject(id, HttpError::BadRequest, tx);
        }

        let body_len = match request.header(KnownHeader::ContentLength) {
            None => 0,
            Some(value) => match content_length(value) {
                Some(len) => len,
                None => return self.reject(id, HttpError::BadRequest, tx),
            },
        };

        let Some(total) = head_len.checked_add(body_len) else {
            return self.reject(id, HttpError::BadRequest, tx);
        };
        if rx.len() < total {
            return Outcome::AwaitData;
        }

        let keep_alive = request.is_keep_alive();
        let response = self.service.call(&request, &rx[head_len..total]);
        trace!(connection = %id, method = %request.method(), path = request.target(), status = response.status().as_u16(), "request served");
        self.encoder.encode(response, !keep_alive, tx);

        if keep_alive { Outcome::KeepAlive { consumed: total } } else { Outcome::CloseAfterFlush }
    }

    fn on_disconnected(&mut self, id: ConnectionId) {
        trace!(connection = %id, "http connection closed");
    }
}

/// `Content-Length = 1*DIGIT`. Signs and whitespace that `usize::from_str` would tolerate are refused.
fn content_length(value: &str) -> Option<usize> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// An [`HttpHandler`] together with the reactor that drives it.
///
/// ```no_run
/// use bytes::Bytes;
/// use http::Response;
/// use inter_server::{HttpServer, service_fn};
///
/// let mut server = HttpServer::new(service_fn(|_request, _body| Response::new(Bytes::from_static(b"hello"))))?;
/// server.listen(8080, 64)?;
/// # Ok::<(), inter_server::ServerError>(())
/// ```
pub struct HttpServer<S> {
    reactor: TcpServer,
    handler: HttpHandler<S>,
}

impl<S> fmt::Debug for HttpServer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServer").field("reactor", &self.reactor).field("handler", &self.handler).finish()
    }
}

impl<S: Service> HttpServer<S> {
    pub fn new(service: S) -> Result<Self, ServerError> {
        Self::with_config(ServerConfig::default(), service)
    }

    pub fn with_config(config: ServerConfig, service: S) -> Result<Self, ServerError> {
        Ok(Self { reactor: TcpServer::new(config)?, handler: HttpHandler::new(service) })
    }

    pub fn bind(&mut self, port: u16, backlog: u32) -> Result<SocketAddr, ServerError> {
        self.reactor.bind(port, backlog)
    }

    pub fn bind_addr(&mut self, addr: SocketAddr, backlog: u32) -> Result<SocketAddr, ServerError> {
        self.reactor.bind_addr(addr, backlog)
    }

    pub fn run(&mut self) -> Result<(), ServerError> {
        self.reactor.run(&mut self.handler)
    }

    pub fn listen(&mut self, port: u16, backlog: u32) -> Result<(), ServerError> {
        self.reactor.listen(port, &mut self.handler, backlog)
    }

    pub fn stop(&self) {
        self.reactor.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.reactor.stop_handle()
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.reactor.stop_flag()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.reactor.local_addr()
    }

    pub fn reactor(&self) -> &TcpServer {
        &self.reactor
    }

    pub fn handler(&self) -> &HttpHandler<S> {
        &self.handler
    }

    pub fn into_service(self) -> S {
        self.handler.service
    }
}
