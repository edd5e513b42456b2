//! Zero-copy HTTP/1.x request parsing
//!
//! This crate turns the bytes sitting in a connection's receive buffer into a borrowed
//! [`protocol::Request`] view without allocating or copying, and serializes responses back
//! into a transmit buffer. It performs no I/O: the reactor in `inter-server` owns sockets and
//! buffers, this crate only looks at byte slices.
//!
//! # Architecture
//!
//! - [`protocol`]: request view, method and header tables, version, error types
//! - [`codec`]: the request parser and response encoder
//!
//! # Parsing model
//!
//! [`codec::try_parse`] returns `Complete` with the request and the number of bytes its head
//! occupied, `Incomplete` when the input stops before a terminator, or a [`protocol::ParseError`]
//! as soon as a byte breaks the grammar. Retrying with more bytes appended is always safe.
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - No body framing: bytes after the header section are left to the caller
//! - Maximum header size: 8KB by default
//! - Header values must be visible ASCII plus SP/HTAB

pub mod codec;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
