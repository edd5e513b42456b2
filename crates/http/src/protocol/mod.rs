//! Core HTTP protocol types.
//!
//! - [`Method`] and [`KnownHeader`]: closed, table-driven name sets
//! - [`Request`]: zero-copy view over a receive buffer
//! - [`DynamicHeaders`]: storage for headers without a fixed slot
//! - [`Version`]: request-line protocol version
//! - [`ParseError`] and [`HttpError`]: parse failures and their HTTP status category

mod method;
pub use method::Method;

mod header;
pub use header::DynamicHeaders;
pub use header::KnownHeader;

mod version;
pub use version::Version;

mod request;
pub use request::Request;

mod error;
pub use error::HttpError;
pub use error::ParseError;
