use http::StatusCode;
use thiserror::Error;

/// Reasons a request is rejected by the parser.
///
/// Every variant carries the byte offset (relative to the start of the parsed slice) of the
/// first byte that broke the grammar, so a handler can log exactly where a peer went wrong.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("more than {max_num} headers, the first one over the limit starts at byte {offset}")]
    TooManyHeaders { offset: usize, max_num: usize },

    #[error("invalid http method at byte {offset}")]
    InvalidMethod { offset: usize },

    #[error("invalid request target at byte {offset}")]
    InvalidTarget { offset: usize },

    #[error("invalid http version at byte {offset}")]
    InvalidVersion { offset: usize },

    #[error("invalid header name at byte {offset}")]
    InvalidHeaderName { offset: usize },

    #[error("invalid header value at byte {offset}")]
    InvalidHeaderValue { offset: usize },

    #[error("empty header value at byte {offset}")]
    EmptyHeaderValue { offset: usize },

    #[error("expected CRLF at byte {offset}")]
    InvalidLineEnding { offset: usize },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(offset: usize, max_num: usize) -> Self {
        Self::TooManyHeaders { offset, max_num }
    }

    /// The HTTP status a server should answer with before dropping the connection.
    pub fn http_error(&self) -> HttpError {
        match self {
            Self::InvalidMethod { .. } => HttpError::MethodNotAllowed,
            _ => HttpError::BadRequest,
        }
    }
}

/// Error category for failures that map directly onto an HTTP status.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpError {
    #[error("Bad request")]
    BadRequest,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl HttpError {
    /// Name of the error category, as reported next to the numeric code.
    pub const CATEGORY: &'static str = "http";

    pub fn category(self) -> &'static str {
        Self::CATEGORY
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::BadRequest => "Bad request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not found",
            Self::MethodNotAllowed => "Method not allowed",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn code(self) -> u16 {
        self.status().as_u16()
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            400 => Some(Self::BadRequest),
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            405 => Some(Self::MethodNotAllowed),
            _ => None,
        }
    }
}

impl From<HttpError> for StatusCode {
    fn from(error: HttpError) -> Self {
        error.status()
    }
}
