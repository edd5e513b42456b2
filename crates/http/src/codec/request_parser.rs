//! Zero-copy HTTP/1.x request parser.
//!
//! The parser scans the unconsumed tail of a receive buffer and either produces a borrowed
//! [`Request`] view, reports that more bytes are needed, or rejects the input. It never copies
//! or owns the bytes it looks at, never allocates, and keeps no state between calls: retrying on a longer buffer
//! simply rescans from the start, which makes a retry on any superset of an incomplete input
//! reach the same or a more complete result.
//!
//! # Grammar
//!
//! ```text
//! METHOD SP REQUEST-TARGET SP "HTTP/" MAJOR "." MINOR CRLF
//! *( HEADER-NAME ":" OWS VALUE OWS CRLF )
//! CRLF
//! ```
//!
//! Every field is validated against a byte class table from [`char_class`](super::char_class);
//! a byte outside the permitted class is a [`ParseError`], never silently skipped. Body framing
//! is left to the caller: on success the parser reports how many bytes the request line and
//! header section took, and anything after that offset is untouched.

use std::str;

use tracing::trace;

use crate::codec::char_class::{self, ByteClass, DIGITS, HEADER_NAME_CHARS, HEADER_VALUE_CHARS, LETTERS, URI_CHARS, WHITESPACE};
use crate::ensure;
use crate::protocol::{DynamicHeaders, Method, ParseError, Request, Version};

/// Default maximum size in bytes of the request line plus header section.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Default maximum number of header lines. Never above [`DynamicHeaders::INLINE_CAPACITY`], so
/// a parsed request stays off the heap.
pub const DEFAULT_MAX_HEADERS: usize = 64;

const HTTP_PREFIX: &[u8] = b"HTTP/";

/// Outcome of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<'buf> {
    /// A full request head was found. `consumed` is the offset just past the empty line that
    /// terminates the header section.
    Complete { request: Request<'buf>, consumed: usize },
    /// The input ended before a required terminator; retry once more bytes have arrived.
    Incomplete,
}

impl<'buf> Parsed<'buf> {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    pub fn into_complete(self) -> Option<(Request<'buf>, usize)> {
        match self {
            Self::Complete { request, consumed } => Some((request, consumed)),
            Self::Incomplete => None,
        }
    }
}

/// Request parser with bounds on the header section size and on the number of header lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestParser {
    max_header_bytes: usize,
    max_headers: usize,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub const fn new() -> Self {
        Self { max_header_bytes: DEFAULT_MAX_HEADER_BYTES, max_headers: DEFAULT_MAX_HEADERS }
    }

    pub const fn with_max_header_bytes(max_header_bytes: usize) -> Self {
        Self { max_header_bytes, max_headers: DEFAULT_MAX_HEADERS }
    }

    /// Replaces the header count limit, capped at [`DynamicHeaders::INLINE_CAPACITY`].
    pub const fn limit_headers(self, max_headers: usize) -> Self {
        let max_headers =
            if max_headers > DynamicHeaders::INLINE_CAPACITY { DynamicHeaders::INLINE_CAPACITY } else { max_headers };
        Self { max_headers, ..self }
    }

    pub fn max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    pub fn max_headers(&self) -> usize {
        self.max_headers
    }

    /// Attempts to parse one request head from the start of `bytes`.
    ///
    /// # Returns
    ///
    /// - `Ok(Parsed::Complete { .. })`: a request head was parsed
    /// - `Ok(Parsed::Incomplete)`: need more data to proceed
    /// - `Err(_)`: the input can never become a valid request
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if a byte violates the grammar or the header section grows past
    /// the configured size or count limit.
    pub fn parse<'buf>(&self, bytes: &'buf [u8]) -> Result<Parsed<'buf>, ParseError> {
        match scan(bytes, self.max_headers)? {
            Some((request, consumed)) => {
                trace!(header_size = consumed, "parsed request head");
                ensure!(consumed <= self.max_header_bytes, ParseError::too_large_header(consumed, self.max_header_bytes));
                Ok(Parsed::Complete { request, consumed })
            }
            None => {
                ensure!(bytes.len() <= self.max_header_bytes, ParseError::too_large_header(bytes.len(), self.max_header_bytes));
                Ok(Parsed::Incomplete)
            }
        }
    }
}

/// Parses with the default header size limit, see [`RequestParser::parse`].
///
/// # Errors
///
/// Returns `ParseError` when `bytes` can never become a valid request.
pub fn try_parse(bytes: &[u8]) -> Result<Parsed<'_>, ParseError> {
    RequestParser::new().parse(bytes)
}

/// Yields the byte under the cursor, or reports the input as incomplete.
macro_rules! next_byte {
    ($cursor:expr) => {
        match $cursor.peek() {
            Some(byte) => byte,
            None => return Ok(None),
        }
    };
}

struct Cursor<'buf> {
    bytes: &'buf [u8],
    pos: usize,
}

impl<'buf> Cursor<'buf> {
    fn new(bytes: &'buf [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.pos += 1;
    }

    /// Advances over the longest run of bytes in `class` and returns it.
    #[inline]
    fn take_while(&mut self, class: &ByteClass) -> &'buf [u8] {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if !char_class::contains(class, byte) {
                break;
            }
            self.bump();
        }
        &self.bytes[start..self.pos]
    }
}

fn scan(bytes: &[u8], max_headers: usize) -> Result<Option<(Request<'_>, usize)>, ParseError> {
    let mut cursor = Cursor::new(bytes);

    // method
    let method = cursor.take_while(&LETTERS);
    ensure!(method.len() <= Method::MAX_LEN, ParseError::InvalidMethod { offset: Method::MAX_LEN });
    let byte = next_byte!(cursor);
    ensure!(byte == b' ', ParseError::InvalidMethod { offset: cursor.pos });
    let method = Method::parse(method).ok_or(ParseError::InvalidMethod { offset: 0 })?;
    cursor.bump();

    // request target
    let target_start = cursor.pos;
    let target = cursor.take_while(&URI_CHARS);
    let byte = next_byte!(cursor);
    ensure!(!target.is_empty() && byte == b' ', ParseError::InvalidTarget { offset: cursor.pos });
    let target = ascii_str(target, target_start, |offset| ParseError::InvalidTarget { offset })?;
    cursor.bump();

    // version
    for &expected in HTTP_PREFIX {
        let byte = next_byte!(cursor);
        ensure!(byte == expected, ParseError::InvalidVersion { offset: cursor.pos });
        cursor.bump();
    }
    let major_start = cursor.pos;
    let major = cursor.take_while(&DIGITS);
    let byte = next_byte!(cursor);
    ensure!(!major.is_empty() && byte == b'.', ParseError::InvalidVersion { offset: cursor.pos });
    let major = parse_version_number(major).ok_or(ParseError::InvalidVersion { offset: major_start })?;
    ensure!(major == 1, ParseError::InvalidVersion { offset: major_start });
    cursor.bump();

    let minor_start = cursor.pos;
    let minor = cursor.take_while(&DIGITS);
    let byte = next_byte!(cursor);
    ensure!(!minor.is_empty(), ParseError::InvalidVersion { offset: cursor.pos });
    let minor = parse_version_number(minor).ok_or(ParseError::InvalidVersion { offset: minor_start })?;
    ensure!(byte == b'\r', ParseError::InvalidLineEnding { offset: cursor.pos });
    cursor.bump();
    let byte = next_byte!(cursor);
    ensure!(byte == b'\n', ParseError::InvalidLineEnding { offset: cursor.pos });
    cursor.bump();

    let mut request = Request::new(method, target, Version::new(major, minor));

    // headers, until the empty line
    let mut header_count = 0;
    loop {
        let byte = next_byte!(cursor);
        if byte == b'\r' {
            cursor.bump();
            let byte = next_byte!(cursor);
            ensure!(byte == b'\n', ParseError::InvalidLineEnding { offset: cursor.pos });
            cursor.bump();
            return Ok(Some((request, cursor.pos)));
        }

        ensure!(header_count < max_headers, ParseError::too_many_headers(cursor.pos, max_headers));
        header_count += 1;

        let name_start = cursor.pos;
        let name = cursor.take_while(&HEADER_NAME_CHARS);
        let byte = next_byte!(cursor);
        ensure!(!name.is_empty() && byte == b':', ParseError::InvalidHeaderName { offset: cursor.pos });
        cursor.bump();

        cursor.take_while(&WHITESPACE);
        let value_start = cursor.pos;
        let value = cursor.take_while(&HEADER_VALUE_CHARS);
        let byte = next_byte!(cursor);
        ensure!(byte == b'\r', ParseError::InvalidHeaderValue { offset: cursor.pos });
        cursor.bump();
        let byte = next_byte!(cursor);
        ensure!(byte == b'\n', ParseError::InvalidLineEnding { offset: cursor.pos });
        cursor.bump();

        let value = value.trim_ascii_end();
        ensure!(!value.is_empty(), ParseError::EmptyHeaderValue { offset: value_start });

        let name = ascii_str(name, name_start, |offset| ParseError::InvalidHeaderName { offset })?;
        let value = ascii_str(value, value_start, |offset| ParseError::InvalidHeaderValue { offset })?;
        request.insert_header(name, value);
    }
}

/// Parses a run of ASCII digits, rejecting values that do not fit in a `u8`.
fn parse_version_number(digits: &[u8]) -> Option<u8> {
    digits.iter().try_fold(0u8, |acc, digit| acc.checked_mul(10)?.checked_add(digit - b'0'))
}

/// Views class-checked bytes as `str`; every table admits ASCII only, so this cannot fail on
/// bytes the scanner accepted.
fn ascii_str(bytes: &[u8], start: usize, error: impl FnOnce(usize) -> ParseError) -> Result<&str, ParseError> {
    str::from_utf8(bytes).map_err(|e| error(start + e.valid_up_to()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::KnownHeader;
    use indoc::indoc;

    /// Turns an `indoc!` literal into wire format.
    fn crlf(text: &str) -> String {
        text.replace('\n', "\r\n")
    }

    fn complete(bytes: &[u8]) -> (Request<'_>, usize) {
        try_parse(bytes).unwrap().into_complete().expect("request should be complete")
    }

    const HELLO: &str = "GET /hello HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test\r\n\r\n";

    #[test]
    fn parse_single_read() {
        let (request, consumed) = complete(HELLO.as_bytes());

        assert_eq!(consumed, HELLO.len());
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.target(), "/hello");
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.host(), Some("example.com"));
        assert_eq!(request.user_agent(), Some("test"));
        assert!(request.dynamic_headers().is_empty());
    }

    #[test]
    fn parse_split_across_reads() {
        let mut buffer = b"GET /hel".to_vec();
        assert_eq!(try_parse(&buffer), Ok(Parsed::Incomplete));

        buffer.extend_from_slice(b"lo HTTP/1.1\r\nHost: example.com\r\n\r\n");
        let (request, consumed) = complete(&buffer);
        assert_eq!(consumed, buffer.len());
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.target(), "/hello");
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.host(), Some("example.com"));
    }

    #[test]
    fn every_strict_prefix_is_incomplete() {
        let bytes = HELLO.as_bytes();
        for end in 0..bytes.len() {
            assert_eq!(try_parse(&bytes[..end]), Ok(Parsed::Incomplete), "prefix of {end} bytes");
        }
    }

    #[test]
    fn incremental_delivery_matches_single_read() {
        let text = crlf(indoc! {r##"
        POST /api/items?id=7 HTTP/1.0
        Host: 127.0.0.1:8080
        Content-Type: application/json
        Content-Length: 2
        X-Request-Id: abc-123
        Accept:   */*

        {}"##});
        let bytes = text.as_bytes();

        for split in 1..bytes.len() {
            let mut buffer = Vec::with_capacity(bytes.len());
            let expected = complete(bytes);
            buffer.extend_from_slice(&bytes[..split]);
            let first_complete = try_parse(&buffer).unwrap().is_complete();
            if !first_complete {
                buffer.extend_from_slice(&bytes[split..]);
            }
            let (request, consumed) = complete(&buffer);
            assert_eq!(request, expected.0, "split at {split}");
            assert_eq!(consumed, expected.1, "split at {split}");
        }
    }

    #[test]
    fn consumed_stops_at_header_terminator() {
        let text = crlf(indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        123"##});

        let (request, consumed) = complete(text.as_bytes());
        assert_eq!(&text.as_bytes()[consumed..], b"123");
        assert_eq!(request.get("accept"), Some("*/*"));
    }

    #[test]
    fn from_edge() {
        let text = crlf(indoc! {r##"
        GET /index/?a=1&b=2&a=3 HTTP/1.1
        Host: 127.0.0.1:8080
        Connection: keep-alive
        Cache-Control: max-age=0
        sec-ch-ua: "#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109"
        sec-ch-ua-mobile: ?0
        sec-ch-ua-platform: "macOS"
        Upgrade-Insecure-Requests: 1
        User-Agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36 Edg/109.0.1518.52
        Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9
        Sec-Fetch-Site: none
        Sec-Fetch-Mode: navigate
        Sec-Fetch-User: ?1
        Sec-Fetch-Dest: document
        Accept-Encoding: gzip, deflate, br
        Accept-Language: zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7

        "##});

        let (request, _) = complete(text.as_bytes());

        assert_eq!(request.path(), "/index/");
        assert_eq!(request.query(), Some("a=1&b=2&a=3"));
        assert_eq!(request.header(KnownHeader::Connection), Some("keep-alive"));
        assert_eq!(request.dynamic_headers().len(), 12);
        assert_eq!(request.get("sec-ch-ua"), Some(r##""#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109""##));
        assert_eq!(request.get("sec-ch-ua-platform"), Some("\"macOS\""));
        assert_eq!(request.get("Accept-Language"), Some("zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"));
        assert!(request.user_agent().is_some_and(|ua| ua.ends_with("Edg/109.0.1518.52")));
    }

    #[test]
    fn duplicate_headers_overwrite() {
        let bytes = b"GET / HTTP/1.1\r\nHost: a\r\nX-Id: 1\r\nhost: b\r\nx-id: 2\r\n\r\n";
        let (request, _) = complete(bytes);
        assert_eq!(request.host(), Some("b"));
        assert_eq!(request.get("X-Id"), Some("2"));
        assert_eq!(request.dynamic_headers().len(), 1);
    }

    #[test]
    fn values_are_trimmed() {
        let bytes = b"GET / HTTP/1.1\r\nHost:\t example.com \t\r\n\r\n";
        let (request, _) = complete(bytes);
        assert_eq!(request.host(), Some("example.com"));
    }

    #[test]
    fn fields_borrow_from_input() {
        let bytes = HELLO.as_bytes();
        let (request, _) = complete(bytes);
        let range = bytes.as_ptr_range();
        for field in [request.target(), request.host().unwrap(), request.user_agent().unwrap()] {
            assert!(range.contains(&field.as_ptr()));
        }
    }

    #[test]
    fn space_before_colon_is_malformed() {
        let result = try_parse(b"GET /hello HTTP/1.1\r\nHost : bad\r\n\r\n");
        assert_eq!(result, Err(ParseError::InvalidHeaderName { offset: 25 }));
    }

    #[test]
    fn unknown_method_is_malformed() {
        assert_eq!(try_parse(b"GETS / HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidMethod { offset: 0 }));
        assert_eq!(try_parse(b"get / HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidMethod { offset: 0 }));
        assert!(matches!(try_parse(b"G3T / HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidMethod { .. })));
        assert!(matches!(try_parse(b"CONNECTED"), Err(ParseError::InvalidMethod { .. })));
        assert_eq!(try_parse(b" / HTTP/1.1\r\n\r\n").unwrap_err().http_error(), crate::protocol::HttpError::MethodNotAllowed);
    }

    #[test]
    fn invalid_target_bytes() {
        assert_eq!(try_parse(b"GET /a\"b HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidTarget { offset: 6 }));
        assert_eq!(try_parse(b"GET /a\xffb HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidTarget { offset: 6 }));
        assert_eq!(try_parse(b"GET  HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidTarget { offset: 4 }));
    }

    #[test]
    fn invalid_versions() {
        assert!(matches!(try_parse(b"GET / HTTP1.1\r\n\r\n"), Err(ParseError::InvalidVersion { .. })));
        assert!(matches!(try_parse(b"GET / HTTP/2.0\r\n\r\n"), Err(ParseError::InvalidVersion { .. })));
        assert!(matches!(try_parse(b"GET / HTTP/.1\r\n\r\n"), Err(ParseError::InvalidVersion { .. })));
        assert!(matches!(try_parse(b"GET / HTTP/1.\r\n\r\n"), Err(ParseError::InvalidVersion { .. })));
        assert!(matches!(try_parse(b"GET / HTTP/1.256\r\n\r\n"), Err(ParseError::InvalidVersion { .. })));
        assert!(matches!(try_parse(b"GET / http/1.1\r\n\r\n"), Err(ParseError::InvalidVersion { .. })));
    }

    #[test]
    fn bare_line_feed_is_malformed() {
        assert!(matches!(try_parse(b"GET / HTTP/1.1\n\n"), Err(ParseError::InvalidLineEnding { .. })));
        assert!(matches!(try_parse(b"GET / HTTP/1.1\r\nHost: a\n\r\n"), Err(ParseError::InvalidHeaderValue { .. })));
        assert!(matches!(try_parse(b"GET / HTTP/1.1\r\n\n"), Err(ParseError::InvalidHeaderName { .. })));
        assert!(matches!(try_parse(b"GET / HTTP/1.1\r\nHost: a\r\r\n"), Err(ParseError::InvalidLineEnding { .. })));
    }

    #[test]
    fn empty_value_is_malformed() {
        assert_eq!(try_parse(b"GET / HTTP/1.1\r\nHost:   \r\n\r\n"), Err(ParseError::EmptyHeaderValue { offset: 24 }));
        assert!(matches!(try_parse(b"GET / HTTP/1.1\r\nHost:\r\n\r\n"), Err(ParseError::EmptyHeaderValue { .. })));
    }

    #[test]
    fn out_of_class_bytes_never_yield_a_request() {
        let bytes = HELLO.as_bytes();
        // positions of every byte inside a validated field of HELLO
        let fields = [0..3, 4..10, 21..25, 27..38, 40..50, 52..56];
        let values = [27..38, 52..56];
        for range in fields {
            for position in range {
                for bad in [b'\x00', b'\x7f', b'\x80', b'{'] {
                    if bad == b'{' && values.iter().any(|value| value.contains(&position)) {
                        // '{' is a legal header value byte
                        continue;
                    }
                    let mut corrupted = bytes.to_vec();
                    corrupted[position] = bad;
                    assert!(try_parse(&corrupted).is_err(), "byte {bad:#04x} at {position} should be rejected");
                }
            }
        }
    }

    #[test]
    fn header_size_limit() {
        let parser = RequestParser::with_max_header_bytes(32);
        assert_eq!(parser.parse(HELLO.as_bytes()), Err(ParseError::too_large_header(HELLO.len(), 32)));

        let unterminated = format!("GET /{} HTTP/1.1", "a".repeat(40));
        assert_eq!(parser.parse(unterminated.as_bytes()), Err(ParseError::too_large_header(unterminated.len(), 32)));

        assert!(RequestParser::new().parse(HELLO.as_bytes()).unwrap().is_complete());
    }

    fn head_with_headers(count: usize) -> String {
        let mut head = String::from("GET / HTTP/1.1\r\n");
        for i in 0..count {
            head.push_str(&format!("h{i}:v\r\n"));
        }
        head
    }

    #[test]
    fn header_count_limit() {
        let mut at_limit = head_with_headers(DEFAULT_MAX_HEADERS);
        let over_at = at_limit.len();
        at_limit.push_str("\r\n");
        let (request, _) = complete(at_limit.as_bytes());
        assert_eq!(request.dynamic_headers().len(), DEFAULT_MAX_HEADERS);
        assert!(request.dynamic_headers().is_inline());

        let over = format!("{}\r\n", head_with_headers(DEFAULT_MAX_HEADERS + 1));
        assert_eq!(try_parse(over.as_bytes()), Err(ParseError::too_many_headers(over_at, DEFAULT_MAX_HEADERS)));
    }

    #[test]
    fn header_flood_fails_before_the_head_ends() {
        // small lines stay under the byte limit long after the count limit is gone
        let flood = head_with_headers(1000);
        assert!(flood.len() <= DEFAULT_MAX_HEADER_BYTES);
        assert!(matches!(try_parse(flood.as_bytes()), Err(ParseError::TooManyHeaders { max_num: DEFAULT_MAX_HEADERS, .. })));
    }

    #[test]
    fn custom_header_count_limit() {
        let parser = RequestParser::new().limit_headers(2);
        assert_eq!(parser.max_headers(), 2);

        let two = format!("{}\r\n", head_with_headers(2));
        assert!(parser.parse(two.as_bytes()).unwrap().is_complete());

        let three = format!("{}\r\n", head_with_headers(3));
        assert!(matches!(parser.parse(three.as_bytes()), Err(ParseError::TooManyHeaders { max_num: 2, .. })));

        assert_eq!(RequestParser::new().limit_headers(10_000).max_headers(), DynamicHeaders::INLINE_CAPACITY);
    }

    #[test]
    fn agrees_with_httparse() {
        let inputs = [
            HELLO.to_string(),
            crlf(indoc! {r##"
            DELETE /items/42 HTTP/1.1
            Host: api.example.com
            Authorization: Bearer abc.def
            Content-Length: 0

            "##}),
            crlf(indoc! {r##"
            OPTIONS * HTTP/1.0
            X-A: 1
            X-B: two words

            "##}),
        ];

        for input in &inputs {
            let (request, consumed) = complete(input.as_bytes());

            let mut headers = [httparse::EMPTY_HEADER; 16];
            let mut expected = httparse::Request::new(&mut headers);
            let status = expected.parse(input.as_bytes()).unwrap();

            assert_eq!(status, httparse::Status::Complete(consumed));
            assert_eq!(expected.method, Some(request.method().as_str()));
            assert_eq!(expected.path, Some(request.target()));
            assert_eq!(expected.version, Some(request.version().minor()));
            for header in expected.headers.iter() {
                assert_eq!(request.get(header.name).map(str::as_bytes), Some(header.value), "header {}", header.name);
            }
        }
    }
}
