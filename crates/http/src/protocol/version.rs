use std::fmt;

/// Protocol version from the request line, `HTTP/<major>.<minor>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    major: u8,
    minor: u8,
}

impl Version {
    pub const HTTP_10: Version = Version::new(1, 0);
    pub const HTTP_11: Version = Version::new(1, 1);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub const fn major(self) -> u8 {
        self.major
    }

    pub const fn minor(self) -> u8 {
        self.minor
    }

    /// Whether connections default to persistent for this version (HTTP/1.1 and later minors).
    pub const fn keep_alive_by_default(self) -> bool {
        self.major == 1 && self.minor >= 1
    }

    pub fn to_http(self) -> Option<http::Version> {
        match (self.major, self.minor) {
            (1, 0) => Some(http::Version::HTTP_10),
            (1, 1) => Some(http::Version::HTTP_11),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}
