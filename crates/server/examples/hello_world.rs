use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use bytes::Bytes;
use http::{Response, StatusCode};
use inter_http::protocol::{Method, Request};
use inter_server::{HttpServer, ServerConfig, service_fn};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn hello(request: &Request<'_>, _body: &[u8]) -> Response<Bytes> {
    match (request.method(), request.path()) {
        (Method::Get, "/") => Response::new(Bytes::from_static(b"hello world")),
        _ => {
            let mut response = Response::new(Bytes::from_static(b"404 not found"));
            *response.status_mut() = StatusCode::NOT_FOUND;
            response
        }
    }
}

#[cfg(unix)]
fn stop_on_sigint(flag: Arc<AtomicBool>) -> io::Result<()> {
    signal_hook::flag::register(signal_hook::consts::SIGINT, flag).map(|_| ())
}

#[cfg(not(unix))]
fn stop_on_sigint(_flag: Arc<AtomicBool>) -> io::Result<()> {
    Ok(())
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match ServerConfig::builder().port(3000).build() {
        Ok(config) => config,
        Err(e) => {
            error!(cause = %e, "invalid server config");
            return;
        }
    };
    let (port, backlog) = (config.port(), config.backlog());

    let mut server = match HttpServer::with_config(config, service_fn(hello)) {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "failed to create server");
            return;
        }
    };

    if let Err(e) = stop_on_sigint(server.stop_flag()) {
        error!(cause = %e, "failed to install SIGINT handler");
        return;
    }

    if let Err(e) = server.listen(port, backlog) {
        error!(cause = %e, errno = ?e.raw_os_error(), "server error");
        return;
    }
    info!("server stopped");
}
