//! HTTP/1.x request decoding.
//!
//! A request is decoded in two steps. [`parse_head`] reads the request line
//! and headers as soon as the blank line has arrived, and checks the declared
//! body length against [`MAX_BODY_BYTES`] before any body byte is buffered.
//! The body is then sliced out of the same buffer once it is complete.

use std::collections::HashMap;
use std::fmt;

use crate::http::request::{Method, Request};

/// Largest request line plus header block accepted.
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Largest declared `Content-Length` accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const BLANK_LINE: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// More bytes are needed.
    Incomplete,
    InvalidRequestLine,
    InvalidMethod,
    UnsupportedVersion,
    InvalidHeader,
    InvalidContentLength,
    HeadTooLarge,
    BodyTooLarge { declared: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Incomplete => write!(f, "incomplete request"),
            ParseError::InvalidRequestLine => write!(f, "malformed request line"),
            ParseError::InvalidMethod => write!(f, "unsupported method"),
            ParseError::UnsupportedVersion => write!(f, "unsupported HTTP version"),
            ParseError::InvalidHeader => write!(f, "malformed header"),
            ParseError::InvalidContentLength => write!(f, "invalid Content-Length"),
            ParseError::HeadTooLarge => {
                write!(f, "request head exceeds {MAX_HEAD_BYTES} bytes")
            }
            ParseError::BodyTooLarge { declared } => {
                write!(f, "declared body of {declared} bytes exceeds {MAX_BODY_BYTES}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Request line and headers of a request whose body may still be in flight.
#[derive(Debug, Clone)]
pub struct Head {
    pub method: Method,
    pub target: String,
    pub version: String,
    pub headers: HashMap<String, String>,
    /// Offset of the first body byte in the buffer the head was read from.
    pub body_offset: usize,
    pub content_length: usize,
}

impl Head {
    /// Total bytes the request occupies, head and body.
    pub fn request_len(&self) -> usize {
        self.body_offset + self.content_length
    }

    /// The body, once `buf` holds all of it.
    pub fn body<'a>(&self, buf: &'a [u8]) -> Option<&'a [u8]> {
        buf.get(self.body_offset..self.request_len())
    }

    pub fn into_request(self, body: Vec<u8>) -> Request {
        Request {
            method: self.method,
            path: self.target,
            version: self.version,
            headers: self.headers,
            body,
        }
    }
}

/// Parses the request line and headers at the front of `buf`.
pub fn parse_head(buf: &[u8]) -> Result<Head, ParseError> {
    let head_end = match find_blank_line(buf) {
        Some(end) if end <= MAX_HEAD_BYTES => end,
        Some(_) => return Err(ParseError::HeadTooLarge),
        None if buf.len() > MAX_HEAD_BYTES => return Err(ParseError::HeadTooLarge),
        None => return Err(ParseError::Incomplete),
    };

    let text = std::str::from_utf8(&buf[..head_end]).map_err(|_| ParseError::InvalidHeader)?;
    let mut lines = text.split("\r\n");

    let (method, target, version) = parse_request_line(lines.next().unwrap_or_default())?;

    let mut headers: HashMap<String, String> = HashMap::new();
    for line in lines {
        let (name, value) = parse_header_line(line)?;
        // repeated fields fold into one comma-separated value
        match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                headers.insert(name.to_string(), value.to_string());
            }
        }
    }

    let content_length = declared_length(&headers)?;
    if content_length > MAX_BODY_BYTES {
        return Err(ParseError::BodyTooLarge {
            declared: content_length,
        });
    }

    Ok(Head {
        method,
        target: target.to_string(),
        version: version.to_string(),
        headers,
        body_offset: head_end + BLANK_LINE.len(),
        content_length,
    })
}

/// Parses one complete request from the front of `buf`.
///
/// Returns the request and the number of bytes it occupied, or
/// [`ParseError::Incomplete`] when more data is needed.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let head = parse_head(buf)?;
    let body = head.body(buf).ok_or(ParseError::Incomplete)?.to_vec();
    let consumed = head.request_len();
    Ok((head.into_request(body), consumed))
}

fn parse_request_line(line: &str) -> Result<(Method, &str, &str), ParseError> {
    let mut parts = line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::InvalidRequestLine);
    };

    if !(target.starts_with('/') || target.contains("://")) {
        return Err(ParseError::InvalidRequestLine);
    }
    if !matches!(version, "HTTP/1.0" | "HTTP/1.1") {
        return Err(ParseError::UnsupportedVersion);
    }
    let method = Method::from_str(method).ok_or(ParseError::InvalidMethod)?;

    Ok((method, target, version))
}

fn parse_header_line(line: &str) -> Result<(&str, &str), ParseError> {
    let (name, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
    if name.is_empty() || name.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(ParseError::InvalidHeader);
    }
    Ok((name, value.trim()))
}

fn declared_length(headers: &HashMap<String, String>) -> Result<usize, ParseError> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .map_or(Ok(0), |(_, v)| {
            v.parse().map_err(|_| ParseError::InvalidContentLength)
        })
}

fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(BLANK_LINE.len()).position(|w| w == BLANK_LINE)
}
