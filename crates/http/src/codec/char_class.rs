//! Byte classification tables used by the request parser.
//!
//! Each table has one entry per byte value and is built at compile time, so a class check is a
//! single indexed load.

pub(crate) type ByteClass = [bool; 256];

/// Expands a const predicate into a lookup table at compile time.
macro_rules! byte_class {
    ($predicate:ident) => {{
        let mut table = [false; 256];
        let mut index = 0;
        while index < table.len() {
            table[index] = $predicate(index as u8);
            index += 1;
        }
        table
    }};
}

/// `A-Z a-z`, the only bytes a method token may contain.
pub(crate) static LETTERS: ByteClass = byte_class!(is_letter);

/// `0-9`
pub(crate) static DIGITS: ByteClass = byte_class!(is_digit);

/// Visible ASCII allowed in a request target: everything in `0x21..=0x7e` except double quote,
/// angle brackets, backslash, caret, backtick, braces and pipe.
pub(crate) static URI_CHARS: ByteClass = byte_class!(is_uri_char);

/// RFC 9110 `tchar`: the bytes a header field name may contain.
pub(crate) static HEADER_NAME_CHARS: ByteClass = byte_class!(is_header_name_char);

/// Visible ASCII plus SP and HTAB; obs-text and control bytes are rejected.
pub(crate) static HEADER_VALUE_CHARS: ByteClass = byte_class!(is_header_value_char);

/// Optional whitespace between a header colon and its value.
pub(crate) static WHITESPACE: ByteClass = byte_class!(is_whitespace);

const fn is_letter(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

const fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

const fn is_uri_char(b: u8) -> bool {
    matches!(b, 0x21..=0x7e) && !matches!(b, b'"' | b'<' | b'>' | b'\\' | b'^' | b'`' | b'{' | b'|' | b'}')
}

const fn is_header_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~')
}

const fn is_header_value_char(b: u8) -> bool {
    matches!(b, 0x21..=0x7e) || is_whitespace(b)
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t')
}

#[inline]
pub(crate) fn contains(class: &ByteClass, byte: u8) -> bool {
    class[usize::from(byte)]
}
