//! Tokio codec for HTTP/1.1 message framing.
//!
//! `HttpCodec` implements [`Decoder`] for [`Request`] and [`Encoder`] for
//! [`Response`], so a connection is a `Framed<TcpStream, HttpCodec>`.
//!
//! # Framing
//!
//! - The head ends at the first blank line (`\r\n\r\n`)
//! - The body is exactly `Content-Length` bytes; no header means no body
//! - `Transfer-Encoding` is refused with [`Error::Unsupported`]
//!
//! # Limits
//!
//! Heads larger than [`DEFAULT_MAX_HEAD_SIZE`] and bodies larger than
//! [`DEFAULT_MAX_BODY_SIZE`] fail with [`Error::RequestTooLarge`] before any
//! further buffering.
//!
//! ```
//! use bytes::BytesMut;
//! use tokio_util::codec::Decoder;
//! use homestation_api::{HttpCodec, Method};
//!
//! let mut codec = HttpCodec::new();
//! let mut buffer = BytesMut::from(&b"GET /data HTTP/1.1\r\nHost: station\r\n\r\n"[..]);
//!
//! let request = codec.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.method, Method::Get);
//! assert_eq!(request.path, "/data");
//! assert!(buffer.is_empty());
//! ```

use std::fmt::Write as _;

use bytes::{BufMut, BytesMut};
use chrono::Utc;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::http::{Method, Request, Response, Status, Version};
use homestation_core::{Error, Result, VERSION};

/// Default limit for the request line plus headers (8 KiB).
pub const DEFAULT_MAX_HEAD_SIZE: usize = 8 * 1024;

/// Default limit for a request body (16 KiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 16 * 1024;

/// Maximum number of header fields per request.
const MAX_HEADERS: usize = 64;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Head parsed while the body is still arriving.
#[derive(Debug)]
struct PendingHead {
    request: Request,
    content_length: usize,
}

/// Tokio codec for HTTP/1.1 requests and responses.
#[derive(Debug)]
pub struct HttpCodec {
    max_head_size: usize,
    max_body_size: usize,
    pending: Option<PendingHead>,
}

impl HttpCodec {
    /// Create a codec with the default limits.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_HEAD_SIZE, DEFAULT_MAX_BODY_SIZE)
    }

    /// Create a codec with custom head and body limits.
    pub fn with_limits(max_head_size: usize, max_body_size: usize) -> Self {
        Self {
            max_head_size,
            max_body_size,
            pending: None,
        }
    }

    pub fn max_head_size(&self) -> usize {
        self.max_head_size
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    fn parse_head(&self, head: &[u8]) -> Result<PendingHead> {
        let head = std::str::from_utf8(head)
            .map_err(|_| Error::MalformedRequest("request head is not UTF-8".into()))?;
        let mut lines = head.split("\r\n");

        let request_line = lines.next().unwrap_or_default();
        let mut parts = request_line.split(' ');
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::MalformedRequest(format!(
                "bad request line {request_line:?}"
            )));
        };
        if method.is_empty() || !target.starts_with('/') {
            return Err(Error::MalformedRequest(format!(
                "bad request line {request_line:?}"
            )));
        }
        let version = Version::parse(version)?;

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };

        let mut headers = Vec::new();
        for line in lines.filter(|line| !line.is_empty()) {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::MalformedRequest(format!("bad header line {line:?}")))?;
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(Error::MalformedRequest(format!("bad header name {name:?}")));
            }
            headers.push((name.to_string(), value.trim().to_string()));
        }
        if headers.len() > MAX_HEADERS {
            return Err(Error::MalformedRequest(format!(
                "{} header fields exceed the limit of {MAX_HEADERS}",
                headers.len()
            )));
        }

        let request = Request {
            method: Method::parse(method),
            path,
            query,
            version,
            headers,
            body: Default::default(),
        };

        if request.header("transfer-encoding").is_some() {
            return Err(Error::Unsupported("transfer-encoding".into()));
        }

        let content_length = match request.header("content-length") {
            Some(value) => value
                .parse::<usize>()
                .map_err(|_| Error::MalformedRequest(format!("bad content-length {value:?}")))?,
            None => 0,
        };
        if content_length > self.max_body_size {
            return Err(Error::RequestTooLarge {
                size: content_length,
                max_size: self.max_body_size,
            });
        }

        Ok(PendingHead {
            request,
            content_length,
        })
    }
}

impl Default for HttpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for HttpCodec {
    type Item = Request;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Request>> {
        if self.pending.is_none() {
            let Some(end) = find_terminator(src) else {
                if src.len() > self.max_head_size {
                    return Err(Error::RequestTooLarge {
                        size: src.len(),
                        max_size: self.max_head_size,
                    });
                }
                return Ok(None);
            };

            let head_len = end + HEAD_TERMINATOR.len();
            if head_len > self.max_head_size {
                return Err(Error::RequestTooLarge {
                    size: head_len,
                    max_size: self.max_head_size,
                });
            }

            let head = src.split_to(head_len);
            self.pending = Some(self.parse_head(&head)?);
        }

        let Some(pending) = self.pending.as_ref() else {
            return Ok(None);
        };
        if src.len() < pending.content_length {
            src.reserve(pending.content_length - src.len());
            return Ok(None);
        }

        let Some(PendingHead {
            mut request,
            content_length,
        }) = self.pending.take()
        else {
            return Ok(None);
        };
        request.body = src.split_to(content_length).freeze();
        trace!(method = %request.method, path = %request.path, body = content_length, "Decoded request");
        Ok(Some(request))
    }
}

impl Encoder<Response> for HttpCodec {
    type Error = Error;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<()> {
        let mut head = String::with_capacity(256);

        // Writing into a String cannot fail
        let _ = write!(head, "HTTP/1.1 {} {}\r\n", item.status.code(), item.status.reason());
        let _ = write!(
            head,
            "Date: {}\r\n",
            Utc::now().format("%a, %d %b %Y %H:%M:%S GMT")
        );
        let _ = write!(head, "Server: homestation/{VERSION}\r\n");
        for (name, value) in &item.headers {
            let _ = write!(head, "{name}: {value}\r\n");
        }
        if item.status != Status::NoContent {
            let _ = write!(head, "Content-Length: {}\r\n", item.body.len());
        }
        if item.close {
            head.push_str("Connection: close\r\n");
        }
        head.push_str("\r\n");

        dst.reserve(head.len() + item.body.len());
        dst.put_slice(head.as_bytes());
        dst.put_slice(&item.body);
        Ok(())
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Result<Option<Request>> {
        let mut codec = HttpCodec::new();
        let mut buffer = BytesMut::from(bytes);
        codec.decode(&mut buffer)
    }

    #[test]
    fn test_codec_default_limits() {
        let codec = HttpCodec::default();
        assert_eq!(codec.max_head_size(), DEFAULT_MAX_HEAD_SIZE);
        assert_eq!(codec.max_body_size(), DEFAULT_MAX_BODY_SIZE);
    }

    #[test]
    fn test_decode_post_with_body() {
        let request = decode_all(
            b"POST /led HTTP/1.1\r\n\
              Content-Type: application/x-www-form-urlencoded\r\n\
              Content-Length: 8\r\n\r\n\
              state=on",
        )
        .unwrap()
        .unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "/led");
        assert_eq!(&request.body[..], b"state=on");
    }

    #[test]
    fn test_decode_splits_query() {
        let request = decode_all(b"GET /data?x=1 HTTP/1.1\r\n\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(request.path, "/data");
        assert_eq!(request.query.as_deref(), Some("x=1"));
    }

    #[test]
    fn test_decode_partial_head_then_body() {
        let mut codec = HttpCodec::new();
        let mut buffer = BytesMut::from(&b"POST /door HTTP/1.1\r\nContent-Le"[..]);
        assert!(codec.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(b"ngth: 10\r\n\r\nstate=");
        assert!(codec.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(b"open");
        let request = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&request.body[..], b"state=open");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_pipelined_requests() {
        let mut codec = HttpCodec::new();
        let mut buffer =
            BytesMut::from(&b"GET /data HTTP/1.1\r\n\r\nGET /style.css HTTP/1.1\r\n\r\n"[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap().unwrap().path, "/data");
        assert_eq!(codec.decode(&mut buffer).unwrap().unwrap().path, "/style.css");
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_rejects_bad_request_line() {
        assert!(matches!(
            decode_all(b"GARBAGE\r\n\r\n"),
            Err(Error::MalformedRequest(_))
        ));
        assert!(matches!(
            decode_all(b"GET data HTTP/1.1\r\n\r\n"),
            Err(Error::MalformedRequest(_))
        ));
        assert!(matches!(
            decode_all(b"GET /data HTTP/2\r\n\r\n"),
            Err(Error::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        assert!(matches!(
            decode_all(b"GET /data HTTP/1.1\r\nno colon here\r\n\r\n"),
            Err(Error::MalformedRequest(_))
        ));
        assert!(matches!(
            decode_all(b"POST /led HTTP/1.1\r\nContent-Length: lots\r\n\r\n"),
            Err(Error::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_decode_refuses_transfer_encoding() {
        let result = decode_all(b"POST /led HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n");
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_decode_head_limit() {
        let mut codec = HttpCodec::with_limits(64, 64);
        let mut buffer = BytesMut::from(&b"GET /data HTTP/1.1\r\n"[..]);
        buffer.extend_from_slice(&[b'x'; 80]);

        assert!(matches!(
            codec.decode(&mut buffer),
            Err(Error::RequestTooLarge { max_size: 64, .. })
        ));
    }

    #[test]
    fn test_decode_body_limit() {
        let mut codec = HttpCodec::with_limits(1024, 4);
        let mut buffer = BytesMut::from(&b"POST /led HTTP/1.1\r\nContent-Length: 5\r\n\r\n"[..]);

        assert!(matches!(
            codec.decode(&mut buffer),
            Err(Error::RequestTooLarge { size: 5, max_size: 4 })
        ));
    }

    #[test]
    fn test_encode_response() {
        let mut codec = HttpCodec::new();
        let mut buffer = BytesMut::new();
        let response = Response::text(Status::BadRequest, "nope").closing();

        codec.encode(response, &mut buffer).unwrap();
        let text = std::str::from_utf8(&buffer).unwrap();

        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.contains("Date: "));
        assert!(text.ends_with("\r\n\r\nnope"));
    }

    #[test]
    fn test_encode_no_content() {
        let mut codec = HttpCodec::new();
        let mut buffer = BytesMut::new();

        codec.encode(Response::new(Status::NoContent), &mut buffer).unwrap();
        let text = std::str::from_utf8(&buffer).unwrap();

        assert!(text.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(!text.contains("Content-Length"));
        assert!(!text.contains("Connection: close"));
    }
}
