//! HTTP echo server implementation
//!
//! This module provides an HTTP/1.x server that answers every GET, POST,
//! PUT and DELETE request with a JSON document describing the request:
//! method, target, headers, raw body and the body parsed as JSON.

pub mod client;
pub mod codec;
pub mod config;
pub mod echo;
pub mod request;
pub mod response;
pub mod server;


pub use client::{ClientConfig, ClientResponse, HttpEchoClient};
pub use codec::{HttpCodec, HttpProtocolError};
pub use config::HttpConfig;
pub use echo::{EchoResponse, handle, parse_json_body};
pub use request::Request;
pub use response::Response;
pub use server::HttpEchoServer;
