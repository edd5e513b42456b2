//! Header name tables and the storage for headers outside of them.

use smallvec::SmallVec;
use std::fmt;

/// Header names that get a dedicated slot in a parsed request.
///
/// Lookups for these are O(1) through [`KnownHeader::index`]; every other name lands in
/// [`DynamicHeaders`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownHeader {
    Connection,
    ContentLength,
    ContentType,
    Host,
    UserAgent,
}

impl KnownHeader {
    pub const COUNT: usize = 5;

    /// Matches a header name by length first, then by ASCII case-insensitive comparison.
    pub fn parse(name: &[u8]) -> Option<Self> {
        match name.len() {
            4 => name.eq_ignore_ascii_case(b"Host").then_some(Self::Host),
            10 => {
                if name.eq_ignore_ascii_case(b"User-Agent") {
                    Some(Self::UserAgent)
                } else if name.eq_ignore_ascii_case(b"Connection") {
                    Some(Self::Connection)
                } else {
                    None
                }
            }
            12 => name.eq_ignore_ascii_case(b"Content-Type").then_some(Self::ContentType),
            14 => name.eq_ignore_ascii_case(b"Content-Length").then_some(Self::ContentLength),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "Connection",
            Self::ContentLength => "Content-Length",
            Self::ContentType => "Content-Type",
            Self::Host => "Host",
            Self::UserAgent => "User-Agent",
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for KnownHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const INLINE_HEADERS: usize = 64;

/// Name to value mapping for headers without a fixed slot.
///
/// Names are unique under ASCII case-insensitive comparison; inserting a name that is
/// already present replaces its value. Both sides borrow from the receive buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicHeaders<'buf> {
    entries: SmallVec<[(&'buf str, &'buf str); INLINE_HEADERS]>,
}

impl<'buf> DynamicHeaders<'buf> {
    /// Entries held inline before the mapping spills to the heap.
    pub const INLINE_CAPACITY: usize = INLINE_HEADERS;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'buf str, value: &'buf str) {
        match self.entries.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'buf str> {
        self.entries.iter().find(|(existing, _)| existing.eq_ignore_ascii_case(name)).map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'buf str, &'buf str)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True while every entry is still stored inline.
    pub fn is_inline(&self) -> bool {
        !self.entries.spilled()
    }
}
