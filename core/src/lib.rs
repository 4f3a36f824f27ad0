//! Typed REST client over a pluggable HTTP transport.
//!
//! # Overview
//! Every call runs one pipeline: resolve the URI against the base address,
//! serialize the JSON body, add default headers, run the request hook,
//! dispatch through the transport, run the response hook or validate the
//! status, then deserialize the body. Failures come back as a single `Error`
//! carrying the status code and a structured `Problem`.
//!
//! # Design
//! - The crate performs no network I/O itself; a `Transport` (async) or
//!   `BlockingTransport` (sync) does. `ReqwestTransport` and `UreqTransport`
//!   are bundled behind the `reqwest` and `ureq` features.
//! - `RestApiClient` is async; `blocking::RestApiClient` runs the same
//!   pipeline synchronously on the calling thread.
//! - Typed calls (`get`, `post`, ...) validate and deserialize; `*_status`
//!   calls return only the status code.
//! - Non-success responses are turned into a `Problem` by
//!   `problem_from_response`, which understands problem documents, plain JSON
//!   and plain text.
//! - A `CancellationToken` is checked at every step and ends a call with
//!   `Error::Cancelled`.

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod interceptor;
pub mod json;
mod pipeline;
pub mod problem;
pub mod transport;

pub use client::{RestApiClient, NO_BODY};
pub use config::{BaseUri, ClientBuilder, ClientConfig, DEFAULT_ACCEPT};
pub use error::{BoxError, Error, RestApiError};
pub use extract::problem_from_response;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::{LoggingInterceptor, RequestInterceptor, ResponseInterceptor};
pub use json::JsonSettings;
pub use problem::{Problem, APPLICATION_PROBLEM_JSON};
pub use tokio_util::sync::CancellationToken;
pub use transport::{BlockingTransport, Transport};

#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
