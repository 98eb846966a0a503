// Minimal HTTP/1.1 framing for the local control plane: one request per
// connection, `Connection: close` on every response.

use serde::Serialize;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::GateError;

/// Permissive CORS headers attached to every response.
pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

const READ_CHUNK: usize = 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: String,
    pub target: String, // Path plus optional query
    pub body: Vec<u8>,
}

impl Request {
    pub fn path(&self) -> &str {
        self.target.split_once('?').map_or(self.target.as_str(), |(path, _)| path)
    }

    /// First value of `key` in the query string, percent-decoded.
    pub fn query_param(&self, key: &str) -> Option<String> {
        let (_, query) = self.target.split_once('?')?;
        let raw = query.split('&').find_map(|pair| match pair.split_once('=') {
            Some((name, value)) if name == key => Some(value),
            None if pair == key => Some(""),
            _ => None,
        })?;
        // Form encoding writes spaces as '+'
        urlencoding::decode(&raw.replace('+', " ")).ok().map(|value| value.into_owned())
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("connection closed before a request arrived")]
    Closed,
    #[error("timed out waiting for request")]
    Timeout,
    #[error("request exceeds {0} bytes")]
    TooLarge(usize),
    #[error("{0}")]
    Malformed(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl RequestError {
    /// Status to answer with, if the connection is still worth answering.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Closed | RequestError::Io(_) => None,
            RequestError::Timeout => Some(408),
            RequestError::TooLarge(_) => Some(413),
            RequestError::Malformed(_) => Some(400),
        }
    }
}

impl From<RequestError> for GateError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Io(source) => GateError::Io(source),
            RequestError::Closed => GateError::Io(io::ErrorKind::UnexpectedEof.into()),
            RequestError::Timeout => GateError::Io(io::ErrorKind::TimedOut.into()),
            other => GateError::MalformedRequest(other.to_string()),
        }
    }
}

/// Reads one request. The whole read (headers and body) must finish within
/// `timeout` and fit in `max_bytes`.
pub async fn read_request<R>(reader: &mut R, max_bytes: usize, timeout: Duration) -> Result<Request, RequestError>
where
    R: AsyncRead + Unpin,
{
    match tokio::time::timeout(timeout, read_request_inner(reader, max_bytes)).await {
        Ok(result) => result,
        Err(_) => Err(RequestError::Timeout),
    }
}

async fn read_request_inner<R>(reader: &mut R, max_bytes: usize) -> Result<Request, RequestError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];
    let mut scanned = 0;

    let body_start = loop {
        if let Some(end) = head_end(&buf, scanned) {
            break end;
        }
        // The terminator may straddle two reads
        scanned = buf.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        if buf.len() >= max_bytes {
            return Err(RequestError::TooLarge(max_bytes));
        }
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(if buf.is_empty() {
                RequestError::Closed
            } else {
                RequestError::Malformed("connection closed inside headers".to_string())
            });
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = RequestHead::parse(&buf[..body_start - HEAD_TERMINATOR.len()])?;
    let content_length = match head.content_length {
        Some(len) => len,
        None if head.method == "POST" || head.method == "PUT" => {
            return Err(RequestError::Malformed("missing Content-Length".to_string()));
        }
        None => 0,
    };

    // A huge declared length must not wrap around the limit check
    body_start
        .checked_add(content_length)
        .filter(|&body_end| body_end <= max_bytes)
        .ok_or(RequestError::TooLarge(max_bytes))?;

    let mut body = buf.split_off(body_start);
    while body.len() < content_length {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(RequestError::Malformed("connection closed inside body".to_string()));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(Request { method: head.method, target: head.target, body })
}

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

// Offset just past the blank line ending the head, searching from `from`.
fn head_end(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
        .map(|at| from + at + HEAD_TERMINATOR.len())
}

// Request line plus the one header the control plane cares about.
#[derive(Debug, PartialEq)]
struct RequestHead {
    method: String,
    target: String,
    content_length: Option<usize>,
}

impl RequestHead {
    fn parse(raw: &[u8]) -> Result<Self, RequestError> {
        let malformed = |what: &str| RequestError::Malformed(what.to_string());
        let text = std::str::from_utf8(raw).map_err(|_| malformed("headers are not valid UTF-8"))?;
        let mut lines = text.split("\r\n");

        let request_line = lines.next().unwrap_or_default();
        let (method, target, version) = match request_line.split(' ').collect::<Vec<_>>()[..] {
            [method, target, version] => (method, target, version),
            _ => return Err(malformed("bad request line")),
        };
        if method.is_empty() || !(target.starts_with('/') || target == "*") || !version.starts_with("HTTP/1.") {
            return Err(malformed("bad request line"));
        }

        let mut content_length = None;
        for line in lines {
            let (name, value) = line.split_once(':').ok_or_else(|| malformed("header without ':'"))?;
            if !name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            if content_length.is_some() {
                return Err(malformed("duplicate Content-Length"));
            }
            let value = value.trim();
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed("invalid Content-Length"));
            }
            // All digits, so a parse failure can only mean overflow
            content_length = Some(value.parse::<usize>().unwrap_or(usize::MAX));
        }

        Ok(RequestHead {
            method: method.to_ascii_uppercase(),
            target: target.to_string(),
            content_length,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn empty(status: u16) -> Self {
        Response { status, content_type: None, body: Vec::new() }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> crate::error::Result<Self> {
        Ok(Response {
            status,
            content_type: Some("application/json"),
            body: serde_json::to_vec(value)?,
        })
    }

    pub fn html(body: String) -> Self {
        Response {
            status: 200,
            content_type: Some("text/html; charset=utf-8"),
            body: body.into_bytes(),
        }
    }

    pub fn bytes(content_type: &'static str, body: Vec<u8>) -> Self {
        Response { status: 200, content_type: Some(content_type), body }
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

pub async fn write_response<W>(writer: &mut W, response: &Response) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, reason_phrase(response.status));
    if let Some(content_type) = response.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    for (name, value) in CORS_HEADERS {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("Connection: close\r\n\r\n");

    writer.write_all(head.as_bytes()).await?;
    writer.write_all(&response.body).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 64 * 1024;
    const TIMEOUT: Duration = Duration::from_secs(1);

    async fn parse(raw: &[u8]) -> Result<Request, RequestError> {
        let mut reader = raw;
        read_request(&mut reader, LIMIT, TIMEOUT).await
    }

    #[tokio::test]
    async fn reads_post_with_body() {
        let req = parse(b"POST /complete HTTP/1.1\r\nHost: x\r\ncontent-length: 4\r\n\r\ntrue").await.unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.path(), "/complete");
        assert_eq!(req.body, b"true");
    }

    #[tokio::test]
    async fn post_without_length_is_malformed() {
        let err = parse(b"POST /complete HTTP/1.1\r\nHost: x\r\n\r\n{}").await.unwrap_err();
        assert_eq!(err.status(), Some(400));

        let err = parse(b"POST /complete HTTP/1.1\r\nContent-Length: abc\r\n\r\n").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn empty_connection_is_closed_not_malformed() {
        let err = parse(b"").await.unwrap_err();
        assert!(matches!(err, RequestError::Closed));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let raw = format!("POST /complete HTTP/1.1\r\nContent-Length: {}\r\n\r\n", LIMIT);
        let err = parse(raw.as_bytes()).await.unwrap_err();
        assert_eq!(err.status(), Some(413));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_client_times_out() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
        let err = read_request(&mut server, LIMIT, TIMEOUT).await.unwrap_err();
        assert_eq!(err.status(), Some(408));
    }

    #[test]
    fn query_params_are_decoded() {
        let req = Request {
            method: "GET".into(),
            target: "/?x=1&resource=My%20Doc%2Fv2".into(),
            body: Vec::new(),
        };
        assert_eq!(req.path(), "/");
        assert_eq!(req.query_param("resource").as_deref(), Some("My Doc/v2"));
        assert_eq!(req.query_param("missing"), None);
    }

    #[tokio::test]
    async fn responses_carry_cors_and_length() {
        let mut out = Vec::new();
        write_response(&mut out, &Response::empty(200)).await.unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("Connection: close\r\n\r\n"));
    }

    #[tokio::test]
    async fn content_length_near_usize_max_is_too_large() {
        for declared in [usize::MAX.to_string(), (usize::MAX - 10).to_string(), "99999999999999999999999".to_string()] {
            let raw = format!("POST /complete HTTP/1.1\r\nContent-Length: {}\r\n\r\n{{}}", declared);
            let err = parse(raw.as_bytes()).await.unwrap_err();
            assert!(matches!(err, RequestError::TooLarge(LIMIT)), "{}: {:?}", declared, err);
            assert_eq!(err.status(), Some(413));
        }
    }

    #[tokio::test]
    async fn body_exactly_at_limit_is_accepted() {
        let head = "POST /complete HTTP/1.1\r\nContent-Length: ";
        // Pad the body so head + body lands exactly on the limit
        let digits = 5;
        let body_len = LIMIT - head.len() - digits - 4;
        let raw = format!("{}{:05}\r\n\r\n{}", head, body_len, "x".repeat(body_len));
        assert_eq!(raw.len(), LIMIT);
        let req = parse(raw.as_bytes()).await.unwrap();
        assert_eq!(req.body.len(), body_len);
    }

    #[tokio::test]
    async fn head_split_across_reads_is_found() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let reader = tokio::spawn(async move { read_request(&mut server, LIMIT, TIMEOUT).await });
        client.write_all(b"GET /health HTTP/1.1\r\nHost: x\r").await.unwrap();
        tokio::task::yield_now().await;
        client.write_all(b"\n\r\n").await.unwrap();
        let req = reader.await.unwrap().unwrap();
        assert_eq!(req.path(), "/health");
        assert!(req.body.is_empty());
    }

    #[tokio::test]
    async fn bad_heads_are_malformed() {
        let cases: [&[u8]; 5] = [
            b"GET\r\n\r\n",
            b"GET / HTTP/1.1 extra\r\n\r\n",
            b"GET / SPDY/3\r\n\r\n",
            b"GET / HTTP/1.1\r\nno colon here\r\n\r\n",
            b"POST / HTTP/1.1\r\nContent-Length: 2\r\ncontent-length: 2\r\n\r\n{}",
        ];
        for raw in cases {
            let err = parse(raw).await.unwrap_err();
            assert_eq!(err.status(), Some(400), "{:?}", String::from_utf8_lossy(raw));
        }
    }

    #[test]
    fn query_plus_decodes_to_space() {
        let req = Request { method: "GET".into(), target: "/?resource=a+b&flag".into(), body: Vec::new() };
        assert_eq!(req.query_param("resource").as_deref(), Some("a b"));
        assert_eq!(req.query_param("flag").as_deref(), Some(""));
    }
}
