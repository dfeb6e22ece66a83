//! HTTP API for the station.
//!
//! This crate serves the device store over HTTP/1.1 on the local network:
//! a JSON snapshot at `GET /data`, actuator commands as form posts, and the
//! web UI's static files.
//!
//! # Components
//!
//! - **HttpCodec**: request/response framing for `tokio_util::codec::Framed`
//! - **FormData**: urlencoded form bodies
//! - **Router**: routes, CORS headers and handlers
//! - **ApiServer**: listener and per-connection tasks

mod codec;
mod form;
mod http;
mod router;
mod server;

pub use codec::{DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_HEAD_SIZE, HttpCodec};
pub use form::FormData;
pub use http::{Method, Request, Response, Status, Version};
pub use router::Router;
pub use server::{ApiServer, HttpServerError};
