//! Wire-format processing for HTTP/1.x.
//!
//! - Request handling: [`RequestParser`] / [`try_parse`] scan a receive buffer into a borrowed
//!   [`Request`](crate::protocol::Request) view
//! - Response handling: [`ResponseEncoder`] serializes an `http::Response` into a transmit buffer
//!
//! # Example
//!
//! ```
//! use inter_http::codec::{Parsed, try_parse};
//! use inter_http::protocol::Method;
//!
//! let bytes = b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! match try_parse(bytes) {
//!     Ok(Parsed::Complete { request, consumed }) => {
//!         assert_eq!(request.method(), Method::Get);
//!         assert_eq!(request.host(), Some("example.com"));
//!         assert_eq!(consumed, bytes.len());
//!     }
//!     Ok(Parsed::Incomplete) => unreachable!("the request is complete"),
//!     Err(e) => panic!("unexpected parse error: {e}"),
//! }
//! ```

mod char_class;
mod request_parser;
mod response_encoder;

pub use request_parser::{DEFAULT_MAX_HEADER_BYTES, DEFAULT_MAX_HEADERS, Parsed, RequestParser, try_parse};
pub use response_encoder::ResponseEncoder;
