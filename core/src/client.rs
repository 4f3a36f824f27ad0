//! Asynchronous REST client.
//!
//! # Design
//! `RestApiClient` holds a shared transport and a `ClientConfig`; it carries
//! no per-call state, so one client can serve many concurrent calls. Each verb
//! has two entry points: a typed one that validates the status and
//! deserializes the body, and a `*_status` one that returns the status code
//! without reading the body.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::{BaseUri, ClientBuilder, ClientConfig};
use crate::error::Error;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::pipeline::{checkpoint, with_request_uri, Call, Failure};
use crate::transport::Transport;

/// Pass as the body of a call that sends none.
pub const NO_BODY: Option<&'static ()> = None;

/// Async client for a JSON REST API.
#[derive(Clone)]
pub struct RestApiClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl RestApiClient {
    /// Create a client. A `base_uri` that is absent or not absolute disables
    /// resolution; every call must then pass an absolute URI.
    pub fn new(transport: Arc<dyn Transport>, base_uri: Option<&str>) -> Self {
        Self {
            transport,
            config: ClientConfig::new(base_uri),
        }
    }

    pub fn builder() -> ClientBuilder<dyn Transport> {
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

    /// Mutable access to headers, hooks and codec settings between calls.
    pub fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub async fn get<T>(&self, uri: &str, cancel: &CancellationToken) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        self.send(HttpMethod::Get, uri, NO_BODY, cancel).await
    }

    pub async fn get_status(
        &self,
        uri: &str,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error> {
        self.send_status(HttpMethod::Get, uri, NO_BODY, validate, cancel).await
    }

    pub async fn post<T, B>(
        &self,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized + Sync,
    {
        self.send(HttpMethod::Post, uri, body, cancel).await
    }

    pub async fn post_status<B>(
        &self,
        uri: &str,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send_status(HttpMethod::Post, uri, body, validate, cancel).await
    }

    pub async fn put<T, B>(
        &self,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized + Sync,
    {
        self.send(HttpMethod::Put, uri, body, cancel).await
    }

    pub async fn put_status<B>(
        &self,
        uri: &str,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send_status(HttpMethod::Put, uri, body, validate, cancel).await
    }

    pub async fn delete<T, B>(
        &self,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized + Sync,
    {
        self.send(HttpMethod::Delete, uri, body, cancel).await
    }

    pub async fn delete_status<B>(
        &self,
        uri: &str,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send_status(HttpMethod::Delete, uri, body, validate, cancel).await
    }

    /// Run a validated call and deserialize the response body.
    ///
    /// An empty body yields `T::default()`.
    pub async fn send<T, B>(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized + Sync,
    {
        let mut call = Call::new(method, uri);
        let result = self
            .run(&mut call, body, true, cancel, |config, response| config.decode(response))
            .await;
        result.map_err(|failure| call.fail(failure))
    }

    /// Run a call and return only the response status code.
    pub async fn send_status<B>(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<u16, Error>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut call = Call::new(method, uri);
        let result = self
            .run(&mut call, body, validate, cancel, |_, response| Ok(response.status))
            .await;
        result.map_err(|failure| call.fail(failure))
    }

    /// Dispatch a prepared request as-is.
    ///
    /// Default headers, hooks and validation are skipped; only transport
    /// failures and cancellation are reported as errors.
    pub async fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, Error> {
        let method = request.method;
        let url = request.url.clone();
        let call = Call::new(method, &url);
        let result = match checkpoint(cancel) {
            Ok(()) => self.dispatch(request, cancel).await,
            Err(failure) => Err(failure),
        };
        result.map_err(|failure| call.fail(failure))
    }

    async fn run<B, R, F>(
        &self,
        call: &mut Call<'_>,
        body: Option<&B>,
        validate: bool,
        cancel: &CancellationToken,
        read: F,
    ) -> Result<R, Failure>
    where
        B: Serialize + ?Sized + Sync,
        F: FnOnce(&ClientConfig, &HttpResponse) -> Result<R, Failure>,
    {
        let request = self.config.prepare(call.method, call.uri, body, cancel)?;
        let response = self.dispatch(request, cancel).await?;
        call.status = Some(response.status);
        self.config.inspect(&response, validate, cancel)?;
        read(&self.config, &response)
    }

    async fn dispatch(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, Failure> {
        let url = request.url.clone();
        tracing::debug!(method = %request.method, url = %url, "sending request");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Failure::Cancelled),
            result = self.transport.send(request, cancel) => result?,
        };
        checkpoint(cancel)?;

        tracing::debug!(status = response.status, url = %url, "response received");
        Ok(with_request_uri(response, url))
    }
}

impl ClientBuilder<dyn Transport> {
    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    /// Fails with `Error::MissingArgument("transport")` when no transport was set.
    pub fn build(self) -> Result<RestApiClient, Error> {
        let (transport, config) = self.into_parts()?;
        Ok(RestApiClient { transport, config })
    }
}
