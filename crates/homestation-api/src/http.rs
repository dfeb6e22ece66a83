//! HTTP/1.1 request and response types.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use homestation_core::{Error, Result};

/// Request method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Options,
    Other(String),
}

impl Method {
    /// Parse a request-line method token. Methods are case-sensitive.
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Options => "OPTIONS",
            Method::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol version from the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    /// Parse the version token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRequest`] for anything but `HTTP/1.0` or
    /// `HTTP/1.1`.
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "HTTP/1.0" => Ok(Version::Http10),
            "HTTP/1.1" => Ok(Version::Http11),
            other => Err(Error::MalformedRequest(format!(
                "unsupported version {other:?}"
            ))),
        }
    }
}

/// A decoded request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,

    /// Path component of the request target, without the query.
    pub path: String,

    /// Raw query string, if the target had one.
    pub query: Option<String>,

    pub version: Version,

    /// Header fields in arrival order; names keep their original case.
    pub headers: Vec<(String, String)>,

    pub body: Bytes,
}

impl Request {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Media type of the body without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// The client wants the connection kept open after this exchange.
    pub fn keep_alive(&self) -> bool {
        let connection = self.header("connection").map(str::to_ascii_lowercase);
        match self.version {
            Version::Http11 => connection.as_deref() != Some("close"),
            Version::Http10 => connection.as_deref() == Some("keep-alive"),
        }
    }
}

/// Response status codes the station emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NoContent,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    InternalServerError,
    NotImplemented,
    ServiceUnavailable,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NoContent => 204,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::PayloadTooLarge => 413,
            Status::InternalServerError => 500,
            Status::NotImplemented => 501,
            Status::ServiceUnavailable => 503,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NoContent => "No Content",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::PayloadTooLarge => "Payload Too Large",
            Status::InternalServerError => "Internal Server Error",
            Status::NotImplemented => "Not Implemented",
            Status::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// Status a client sees for a request-level error.
    pub fn for_error(error: &Error) -> Self {
        match error {
            Error::MalformedRequest(_) => Status::BadRequest,
            Error::RequestTooLarge { .. } => Status::PayloadTooLarge,
            Error::Unsupported(_) => Status::NotImplemented,
            Error::ActuatorNotFitted(_) => Status::NotFound,
            _ => Status::InternalServerError,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// A response to encode.
///
/// `Content-Length`, `Date` and `Connection` are added by the codec.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,

    /// Close the connection after this response.
    pub close: bool,
}

impl Response {
    /// Empty response with the given status.
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
            close: false,
        }
    }

    /// Response with a body of the given media type.
    pub fn with_body(status: Status, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self::new(status)
            .with_header("Content-Type", content_type)
            .with_body_bytes(body)
    }

    /// `text/plain` response.
    pub fn text(status: Status, message: impl Into<String>) -> Self {
        Self::with_body(status, "text/plain", message.into())
    }

    /// `application/json` response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if `value` fails to serialise.
    pub fn json<T: Serialize>(status: Status, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::with_body(status, "application/json", body))
    }

    /// Plain-text response for a request-level error.
    pub fn from_error(error: &Error) -> Self {
        let status = Status::for_error(error);
        Self::text(status, status.reason())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    fn with_body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Mark the response as the last one on its connection.
    pub fn closing(mut self) -> Self {
        self.close = true;
        self
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
