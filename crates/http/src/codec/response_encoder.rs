//! HTTP/1.1 response serialization into a transmit buffer.

use std::io;
use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use http::{HeaderValue, Response, StatusCode, header};
use tracing::warn;

use crate::protocol::HttpError;

/// Initial buffer size reserved for the status line and headers
const INIT_HEADER_SIZE: usize = 256;

/// Writes complete responses into a [`BytesMut`].
///
/// The encoder always emits `HTTP/1.1`, sets `Content-Length` from the body and, when the
/// connection is about to be closed, adds `Connection: close`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Appends `response` to `dst`.
    pub fn encode(&self, response: Response<Bytes>, close: bool, dst: &mut BytesMut) {
        let (mut parts, body) = response.into_parts();

        parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        if close {
            const CLOSE_VALUE: HeaderValue = HeaderValue::from_static("close");
            parts.headers.insert(header::CONNECTION, CLOSE_VALUE);
        }

        dst.reserve(INIT_HEADER_SIZE + body.len());
        write_status_line(parts.status, dst);

        for (header_name, header_value) in &parts.headers {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        dst.put_slice(&body);
    }

    /// Appends an empty-bodied error response that closes the connection.
    pub fn encode_error(&self, error: HttpError, dst: &mut BytesMut) {
        let mut response = Response::new(Bytes::new());
        *response.status_mut() = error.status();
        self.encode(response, true, dst);
    }
}

fn write_status_line(status: StatusCode, dst: &mut BytesMut) {
    let reason = status.canonical_reason().unwrap_or("");
    if let Err(e) = write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), reason) {
        warn!(cause = %e, "failed to write status line");
    }
}

/// `io::Write` adapter appending straight into a `BytesMut`.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_with_body() {
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Bytes::from_static(b"Hello World!"))
            .unwrap();

        let mut dst = BytesMut::new();
        ResponseEncoder::new().encode(response, false, &mut dst);

        let text = std::str::from_utf8(&dst).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("content-type: text/plain\r\n"));
        assert!(text.contains("content-length: 12\r\n"));
        assert!(!text.contains("connection"));
        assert!(text.ends_with("\r\n\r\nHello World!"));
    }

    #[test]
    fn encode_overrides_content_length() {
        let response = Response::builder().header(header::CONTENT_LENGTH, "999").body(Bytes::from_static(b"abc")).unwrap();

        let mut dst = BytesMut::new();
        ResponseEncoder::new().encode(response, true, &mut dst);

        let text = std::str::from_utf8(&dst).unwrap();
        assert!(text.contains("content-length: 3\r\n"));
        assert!(!text.contains("999"));
        assert!(text.contains("connection: close\r\n"));
    }

    #[test]
    fn encode_error_appends() {
        let mut dst = BytesMut::from(&b"previous"[..]);
        ResponseEncoder::new().encode_error(HttpError::MethodNotAllowed, &mut dst);

        let text = std::str::from_utf8(&dst).unwrap();
        assert!(text.starts_with("previousHTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(text.contains("content-length: 0\r\n"));
        assert!(text.contains("connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }
}
