//! Request Parsing
//!
//! Reads the client's request head, decomposes the request URI and builds
//! the HTTP/1.0 request forwarded upstream.

use std::borrow::Cow;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use url::{Host, Url};

use crate::error::{ProxyError, Result};

/// Longest accepted request or header line, in bytes
pub const MAX_LINE: usize = 8192;

/// Most header lines accepted in one request
pub const MAX_HEADERS: usize = 100;

const DEFAULT_PORT: u16 = 80;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

/// Headers the proxy always rewrites
const REPLACED_HEADERS: [&str; 4] = ["host", "connection", "proxy-connection", "user-agent"];

// == Request Head ==
/// Request line and headers sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub uri: String,
    pub version: String,
    /// Header name/value pairs in arrival order
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    // == Read ==
    /// Reads the request line and headers, up to and including the blank
    /// line. EOF in the header block ends it.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncBufRead + Unpin,
    {
        let line = read_line(reader).await?;
        if line.is_empty() {
            return Err(ProxyError::BadRequest("empty request".to_string()));
        }
        let (method, uri, version) = parse_request_line(&line)?;

        let mut headers = Vec::new();
        loop {
            let line = read_line(reader).await?;
            if line.is_empty() {
                break;
            }
            if headers.len() == MAX_HEADERS {
                return Err(ProxyError::BadRequest("too many headers".to_string()));
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ProxyError::BadRequest(format!("malformed header: {}", line)))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self {
            method,
            uri,
            version,
            headers,
        })
    }

    /// True for `GET`, case-insensitively.
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// First header with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Reads one line with its terminator stripped. Returns an empty string on
/// EOF or on a bare CRLF.
async fn read_line<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE as u64)
        .read_until(b'\n', &mut raw)
        .await?;
    if read == MAX_LINE && !raw.ends_with(b"\n") {
        return Err(ProxyError::BadRequest("line too long".to_string()));
    }

    let mut line = String::from_utf8(raw)
        .map_err(|_| ProxyError::BadRequest("request is not valid UTF-8".to_string()))?;
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

// == Request Line ==
/// Splits `METHOD URI [VERSION]`. A missing version defaults to HTTP/1.0.
pub fn parse_request_line(line: &str) -> Result<(String, String, String)> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(uri), version) => Ok((
            method.to_string(),
            uri.to_string(),
            version.unwrap_or("HTTP/1.0").to_string(),
        )),
        _ => Err(ProxyError::BadRequest(format!("malformed request line: {}", line))),
    }
}

// == Target ==
/// Upstream host, port and path extracted from an absolute request URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// Path plus query string
    pub path: String,
}

impl Target {
    /// Decomposes `uri`. A missing scheme is read as `http://`; only plain
    /// HTTP is proxied.
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.starts_with('/') {
            return Err(ProxyError::BadRequest(format!(
                "absolute URI required, got {}",
                uri
            )));
        }

        let absolute: Cow<'_, str> = if has_scheme(uri) {
            Cow::Borrowed(uri)
        } else {
            Cow::Owned(format!("http://{}", uri))
        };

        let url = Url::parse(&absolute)
            .map_err(|err| ProxyError::BadRequest(format!("invalid URI {}: {}", uri, err)))?;

        if url.scheme() != "http" {
            return Err(ProxyError::BadRequest(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(ProxyError::BadRequest(format!("missing host in {}", uri))),
        };

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            host,
            port: url.port_or_known_default().unwrap_or(DEFAULT_PORT),
            path,
        })
    }

    /// `host` or `host:port` for a non-default port.
    pub fn authority(&self) -> String {
        let host: Cow<'_, str> = if self.host.contains(':') {
            Cow::Owned(format!("[{}]", self.host))
        } else {
            Cow::Borrowed(self.host.as_str())
        };

        if self.port == DEFAULT_PORT {
            host.into_owned()
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

/// True if `uri` starts with `scheme://`. A `://` after the first `/` (in
/// the path or query) does not count.
fn has_scheme(uri: &str) -> bool {
    uri.split_once("://")
        .is_some_and(|(scheme, _)| !scheme.is_empty() && !scheme.contains('/'))
}

// == Upstream Request ==
/// Builds the HTTP/1.0 request sent to the origin server.
///
/// The client's `Host` header is kept (or synthesised from the target);
/// `Connection`, `Proxy-Connection` and `User-Agent` are replaced; every
/// other client header is forwarded unchanged.
pub fn build_upstream_request(head: &RequestHead, target: &Target) -> String {
    let host = head
        .header("host")
        .map(str::to_string)
        .unwrap_or_else(|| target.authority());

    let mut request = format!(
        "GET {} HTTP/1.0\r\nHost: {}\r\nConnection: close\r\nProxy-Connection: close\r\nUser-Agent: {}\r\n",
        target.path, host, USER_AGENT
    );

    for (name, value) in &head.headers {
        let lowered = name.to_ascii_lowercase();
        if !REPLACED_HEADERS.contains(&lowered.as_str()) {
            request.push_str(&format!("{}: {}\r\n", name, value));
        }
    }

    request.push_str("\r\n");
    request
}
