//! Request fixtures shared by the benchmarks.

/// A request exactly as it would sit in a receive buffer, head and body included.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    name: &'static str,
    bytes: &'static [u8],
}

impl Fixture {
    pub const fn new(name: &'static str, bytes: &'static [u8]) -> Self {
        Self { name, bytes }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.bytes
    }

    /// Length of the request line plus header section, empty line included.
    pub fn head_len(&self) -> usize {
        self.bytes.windows(4).position(|window| window == b"\r\n\r\n").map_or(self.bytes.len(), |pos| pos + 4)
    }

    pub fn body(&self) -> &'static [u8] {
        &self.bytes[self.head_len()..]
    }
}

pub static GET_SMALL: Fixture = Fixture::new("get_small", b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");

pub static GET_LARGE: Fixture = Fixture::new(
    "get_large",
    concat!(
        "GET /wp-content/uploads/2010/03/hello-kitty-darth-vader-pink.jpg HTTP/1.1\r\n",
        "Host: www.kittyhell.com\r\n",
        "User-Agent: Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_8; ja-JP-mac; rv:1.9.2.3) Gecko/20100401 Firefox/3.6.3 Pathtraq/0.9\r\n",
        "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n",
        "Accept-Language: ja,en-us;q=0.7,en;q=0.3\r\n",
        "Accept-Encoding: gzip,deflate\r\n",
        "Accept-Charset: Shift_JIS,utf-8;q=0.7,*;q=0.7\r\n",
        "Keep-Alive: 115\r\n",
        "Connection: keep-alive\r\n",
        "Cookie: wp_ozh_wsa_visits=2; wp_ozh_wsa_visit_lasttime=xxxxxxxxxx; ",
        "__utma=xxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx.xxxxxxxxxx.x; ",
        "__utmz=xxxxxxxxx.xxxxxxxxxx.x.x.utmccn=(referral)|utmcsr=reader.livedoor.com|utmcct=/reader/|utmcmd=referral\r\n",
        "\r\n",
    )
    .as_bytes(),
);

pub static POST_WITH_BODY: Fixture = Fixture::new(
    "post_with_body",
    b"POST /submit HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 13\r\n\r\n{\"ok\": true}\n",
);

/// Every well-formed fixture, smallest first.
pub static FIXTURES: [&Fixture; 3] = [&GET_SMALL, &POST_WITH_BODY, &GET_LARGE];

