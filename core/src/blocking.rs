//! Blocking REST client.
//!
//! # Design
//! Runs the same pipeline as the async client over a `BlockingTransport`,
//! entirely on the calling thread. It never enters an async runtime, so it can
//! be called from anywhere, including from inside synchronous code that a
//! runtime worker is already executing, without waiting on that worker.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::NO_BODY;
use crate::config::{BaseUri, ClientBuilder, ClientConfig};
use crate::error::Error;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::pipeline::{checkpoint, with_request_uri, Call, Failure};
use crate::transport::BlockingTransport;

/// Blocking client for a JSON REST API.
#[derive(Clone)]
pub struct RestApiClient {
    transport: Arc<dyn BlockingTransport>,
    config: ClientConfig,
}

impl RestApiClient {
    pub fn new(transport: Arc<dyn BlockingTransport>, base_uri: Option<&str>) -> Self {
        Self {
            transport,
            config: ClientConfig::new(base_uri),
        }
    }

    pub fn builder() -> ClientBuilder<dyn BlockingTransport> {
        ClientBuilder::new()
    }

    pub fn base_uri(&self) -> &BaseUri {
        self.config.base_uri()
    }

    pub fn default_headers(&self) -> &HashMap<String, String> {
        self.config.default_headers()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    pub fn get<T>(&self, uri: &str, cancel: &CancellationToken) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        self.send(HttpMethod::Get, uri, NO_BODY, cancel)
    }

    pub fn get_status(
        &self,
        uri: &str,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error> {
        self.send_status(HttpMethod::Get, uri, NO_BODY, validate, cancel)
    }

    pub fn post<T, B>(
        &self,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        self.send(HttpMethod::Post, uri, body, cancel)
    }

    pub fn post_status<B>(
        &self,
        uri: &str,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error>
    where
        B: Serialize + ?Sized,
    {
        self.send_status(HttpMethod::Post, uri, body, validate, cancel)
    }

    pub fn put<T, B>(
        &self,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        self.send(HttpMethod::Put, uri, body, cancel)
    }

    pub fn put_status<B>(
        &self,
        uri: &str,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error>
    where
        B: Serialize + ?Sized,
    {
        self.send_status(HttpMethod::Put, uri, body, validate, cancel)
    }

    pub fn delete<T, B>(
        &self,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        self.send(HttpMethod::Delete, uri, body, cancel)
    }

    pub fn delete_status<B>(
        &self,
        uri: &str,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error>
    where
        B: Serialize + ?Sized,
    {
        self.send_status(HttpMethod::Delete, uri, body, validate, cancel)
    }

    pub fn send<T, B>(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        let mut call = Call::new(method, uri);
        self.run(&mut call, body, true, cancel, |config, response| config.decode(response))
            .map_err(|failure| call.fail(failure))
    }

    pub fn send_status<B>(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error>
    where
        B: Serialize + ?Sized,
    {
        let mut call = Call::new(method, uri);
        self.run(&mut call, body, validate, cancel, |_, response| Ok(response.status))
            .map_err(|failure| call.fail(failure))
    }

    /// Dispatch a prepared request as-is, without headers, hooks or validation.
    pub fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, Error> {
        let url = request.url.clone();
        let call = Call::new(request.method, &url);
        checkpoint(cancel)
            .and_then(|()| self.dispatch(request, cancel))
            .map_err(|failure| call.fail(failure))
    }

    fn run<B, R, F>(
        &self,
        call: &mut Call<'_>,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
        read: F,
    ) -> Result<R, Failure>
    where
        B: Serialize + ?Sized,
        F: FnOnce(&ClientConfig, &HttpResponse) -> Result<R, Failure>,
    {
        let request = self.config.prepare(call.method, call.uri, body, cancel)?;
        let response = self.dispatch(request, cancel)?;
        call.status = Some(response.status);
        self.config.inspect(&response, validate, cancel)?;
        read(&self.config, &response)
    }

    fn dispatch(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, Failure> {
        let url = request.url.clone();
        tracing::debug!(method = %request.method, url = %url, "sending request");

        let response = self.transport.send(request, cancel)?;
        checkpoint(cancel)?;

        tracing::debug!(status = response.status, url = %url, "response received");
        Ok(with_request_uri(response, url))
    }
}

impl ClientBuilder<dyn BlockingTransport> {
    pub fn transport(self, transport: impl BlockingTransport + 'static) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    /// Fails with `Error::MissingArgument("transport")` when no transport was set.
    pub fn build(self) -> Result<RestApiClient, Error> {
        let (transport, config) = self.into_parts()?;
        Ok(RestApiClient { transport, config })
    }
}
