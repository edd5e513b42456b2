//! Borrowed view of a parsed HTTP request.
//!
//! A [`Request`] never owns the bytes it describes: the target and every header name and value
//! are sub-slices of the receive buffer the parser ran over. The view therefore lives only as
//! long as that buffer is left untouched, which in practice means for the duration of a single
//! data callback.

use crate::protocol::{DynamicHeaders, KnownHeader, Method, Version};

/// Represents an HTTP request line plus headers, borrowed from a receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'buf> {
    method: Method,
    target: &'buf str,
    version: Version,
    known_headers: [Option<&'buf str>; KnownHeader::COUNT],
    dynamic_headers: DynamicHeaders<'buf>,
}

impl<'buf> Request<'buf> {
    pub fn new(method: Method, target: &'buf str, version: Version) -> Self {
        Self { method, target, version, known_headers: [None; KnownHeader::COUNT], dynamic_headers: DynamicHeaders::new() }
    }

    /// Stores a header, routing well-known names to their fixed slot.
    ///
    /// A repeated name overwrites the earlier value in whichever storage it belongs to.
    pub fn insert_header(&mut self, name: &'buf str, value: &'buf str) {
        match KnownHeader::parse(name.as_bytes()) {
            Some(known) => self.known_headers[known.index()] = Some(value),
            None => self.dynamic_headers.insert(name, value),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The raw request target exactly as it appeared on the request line.
    pub fn target(&self) -> &'buf str {
        self.target
    }

    /// The request target up to (not including) the first `?`.
    pub fn path(&self) -> &'buf str {
        self.target.split_once('?').map_or(self.target, |(path, _)| path)
    }

    pub fn query(&self) -> Option<&'buf str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn header(&self, header: KnownHeader) -> Option<&'buf str> {
        self.known_headers[header.index()]
    }

    pub fn dynamic_headers(&self) -> &DynamicHeaders<'buf> {
        &self.dynamic_headers
    }

    /// Looks a header up by name in both storages.
    pub fn get(&self, name: &str) -> Option<&'buf str> {
        match KnownHeader::parse(name.as_bytes()) {
            Some(known) => self.header(known),
            None => self.dynamic_headers.get(name),
        }
    }

    pub fn host(&self) -> Option<&'buf str> {
        self.header(KnownHeader::Host)
    }

    pub fn user_agent(&self) -> Option<&'buf str> {
        self.header(KnownHeader::UserAgent)
    }

    /// Whether the peer expects the connection to stay open after this request.
    ///
    /// An explicit `Connection: close` or `Connection: keep-alive` token wins; otherwise the
    /// version default applies.
    pub fn is_keep_alive(&self) -> bool {
        if let Some(connection) = self.header(KnownHeader::Connection) {
            for token in connection.split(',').map(str::trim) {
                if token.eq_ignore_ascii_case("close") {
                    return false;
                }
                if token.eq_ignore_ascii_case("keep-alive") {
                    return true;
                }
            }
        }
        self.version.keep_alive_by_default()
    }
}
