//! The network seam.
//!
//! # Design
//! The client never performs I/O itself. A `Transport` (async) or
//! `BlockingTransport` (sync) turns an `HttpRequest` into an `HttpResponse`
//! and owns connection pooling, TLS, redirects, proxies and timeouts. Every
//! status code comes back as a response; an `Err` means no response exists.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::http::{HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, BoxError>;
}

pub trait BlockingTransport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, BoxError>;
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;
#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use super::*;
    use crate::http::HttpMethod;

    /// Async transport backed by a `reqwest::Client`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(
            &self,
            request: HttpRequest,
            _cancel: &CancellationToken,
        ) -> Result<HttpResponse, BoxError> {
            let method = match request.method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
                HttpMethod::Put => reqwest::Method::PUT,
                HttpMethod::Delete => reqwest::Method::DELETE,
            };
            let mut builder = self.client.request(method, request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let request_uri = response.url().to_string();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response.bytes().await?;

            Ok(HttpResponse {
                status,
                headers,
                body,
                request_uri: Some(request_uri),
            })
        }
    }
}

#[cfg(feature = "ureq")]
mod ureq_transport {
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::error::Error;

    /// How often a blocked caller looks at its cancellation token.
    const CANCEL_POLL: Duration = Duration::from_millis(20);

    /// Blocking transport backed by a `ureq::Agent`.
    ///
    /// The agent must not treat 4xx/5xx as errors; `new` configures that.
    /// Each request runs on a helper thread so the caller can stop waiting as
    /// soon as the token fires. The abandoned request finishes in the
    /// background and its response is dropped.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        pub fn with_agent(agent: ureq::Agent) -> Self {
            Self { agent }
        }
    }

    impl BlockingTransport for UreqTransport {
        fn send(
            &self,
            request: HttpRequest,
            cancel: &CancellationToken,
        ) -> Result<HttpResponse, BoxError> {
            if cancel.is_cancelled() {
                return Err(Box::new(Error::Cancelled));
            }

            let agent = self.agent.clone();
            let (tx, rx) = mpsc::channel();
            thread::Builder::new()
                .name("ureq-transport".to_string())
                .spawn(move || {
                    // The caller may have given up already.
                    let _ = tx.send(execute(&agent, request));
                })?;

            loop {
                match rx.recv_timeout(CANCEL_POLL) {
                    Ok(result) => return result,
                    Err(RecvTimeoutError::Timeout) if cancel.is_cancelled() => {
                        tracing::debug!("abandoning in-flight request after cancellation");
                        return Err(Box::new(Error::Cancelled));
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err("transport thread exited without a response".into());
                    }
                }
            }
        }
    }

    fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let request_uri = request.url.clone();

        let mut response = match request.body {
            Some(body) => agent.run(builder.body(body)?)?,
            None => agent.run(builder.body(())?)?,
        };
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.into(),
            request_uri: Some(request_uri),
        })
    }

}
