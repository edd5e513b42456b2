use std::fmt;

/// The closed set of request methods the parser accepts.
///
/// Anything outside this set is rejected at parse time rather than carried through as an
/// extension method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// Length of the longest method token, used to fail fast on oversized tokens.
    pub const MAX_LEN: usize = 7;

    /// Matches a method token by length first, then by literal comparison.
    pub fn parse(token: &[u8]) -> Option<Self> {
        match token.len() {
            3 => {
                if token == b"GET" {
                    Some(Self::Get)
                } else if token == b"PUT" {
                    Some(Self::Put)
                } else {
                    None
                }
            }
            4 => {
                if token == b"POST" {
                    Some(Self::Post)
                } else if token == b"HEAD" {
                    Some(Self::Head)
                } else {
                    None
                }
            }
            5 => {
                if token == b"PATCH" {
                    Some(Self::Patch)
                } else if token == b"TRACE" {
                    Some(Self::Trace)
                } else {
                    None
                }
            }
            6 => (token == b"DELETE").then_some(Self::Delete),
            7 => {
                if token == b"OPTIONS" {
                    Some(Self::Options)
                } else if token == b"CONNECT" {
                    Some(Self::Connect)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Head => http::Method::HEAD,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Connect => http::Method::CONNECT,
            Method::Options => http::Method::OPTIONS,
            Method::Trace => http::Method::TRACE,
            Method::Patch => http::Method::PATCH,
        }
    }
}
