//! Client configuration: base address, default headers, hooks and codec.
//!
//! # Design
//! Both clients carry the same `ClientConfig`; only the transport differs.
//! The config is read, never written, while a call is in flight. Mutation
//! goes through `&mut` access on the owning client, so the borrow checker
//! keeps it out of concurrent calls on that client value.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::Error;
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::json::JsonSettings;

/// Value of the `Accept` header every client starts with.
pub const DEFAULT_ACCEPT: &str = "application/json, application/problem+json";

/// The address relative request URIs are resolved against.
///
/// Only an absolute base takes part in resolution; with a relative or empty
/// base every call must pass an absolute URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUri {
    Absolute(Url),
    Relative(String),
}

impl BaseUri {
    pub fn parse(uri: Option<&str>) -> Self {
        let uri = uri.unwrap_or_default();
        match Url::parse(uri) {
            Ok(url) => BaseUri::Absolute(url),
            Err(_) => BaseUri::Relative(uri.to_string()),
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, BaseUri::Absolute(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            BaseUri::Absolute(url) => url.as_str(),
            BaseUri::Relative(uri) => uri,
        }
    }

    /// Combine with a request URI using RFC 3986 reference resolution.
    pub fn resolve(&self, uri: &str) -> Result<Url, url::ParseError> {
        match self {
            BaseUri::Absolute(base) => base.join(uri),
            BaseUri::Relative(_) => Url::parse(uri),
        }
    }
}

impl fmt::Display for BaseUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every call a client makes.
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) base_uri: BaseUri,
    pub(crate) default_headers: HashMap<String, String>,
    pub(crate) request_interceptor: Option<Arc<dyn RequestInterceptor>>,
    pub(crate) response_interceptor: Option<Arc<dyn ResponseInterceptor>>,
    pub(crate) json: JsonSettings,
}

impl ClientConfig {
    pub fn new(base_uri: Option<&str>) -> Self {
        Self {
            base_uri: BaseUri::parse(base_uri),
            default_headers: default_headers(),
            request_interceptor: None,
            response_interceptor: None,
            json: JsonSettings::default(),
        }
    }

    pub fn base_uri(&self) -> &BaseUri {
        &self.base_uri
    }

    pub fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    pub fn default_headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.default_headers
    }

    pub fn set_default_headers(&mut self, headers: HashMap<String, String>) {
        self.default_headers = headers;
    }

    pub fn request_interceptor(&self) -> Option<&Arc<dyn RequestInterceptor>> {
        self.request_interceptor.as_ref()
    }

    pub fn set_request_interceptor(&mut self, interceptor: Option<Arc<dyn RequestInterceptor>>) {
        self.request_interceptor = interceptor;
    }

    pub fn response_interceptor(&self) -> Option<&Arc<dyn ResponseInterceptor>> {
        self.response_interceptor.as_ref()
    }

    pub fn set_response_interceptor(&mut self, interceptor: Option<Arc<dyn ResponseInterceptor>>) {
        self.response_interceptor = interceptor;
    }

    pub fn json_settings(&self) -> &JsonSettings {
        &self.json
    }

    pub fn set_json_settings(&mut self, settings: JsonSettings) {
        self.json = settings;
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_uri", &self.base_uri)
            .field("default_headers", &self.default_headers)
            .field("request_interceptor", &self.request_interceptor.is_some())
            .field("response_interceptor", &self.response_interceptor.is_some())
            .field("json", &self.json)
            .finish()
    }
}

fn default_headers() -> HashMap<String, String> {
    HashMap::from([("Accept".to_string(), DEFAULT_ACCEPT.to_string())])
}

/// Builder shared by the async and blocking clients.
///
/// `T` is the transport trait object the finished client dispatches through.
pub struct ClientBuilder<T: ?Sized> {
    transport: Option<Arc<T>>,
    config: ClientConfig,
}

impl<T: ?Sized> ClientBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            transport: None,
            config: ClientConfig::new(None),
        }
    }

    /// Use an already shared transport handle.
    pub fn shared_transport(mut self, transport: Arc<T>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn base_uri(mut self, uri: &str) -> Self {
        self.config.base_uri = BaseUri::parse(Some(uri));
        self
    }

    /// Add or replace one default header.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(name.into(), value.into());
        self
    }

    /// Replace the whole default header map, including `Accept`.
    pub fn default_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.config.default_headers = headers;
        self
    }

    pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.config.request_interceptor = Some(Arc::new(interceptor));
        self
    }

    pub fn response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.config.response_interceptor = Some(Arc::new(interceptor));
        self
    }

    pub fn json_settings(mut self, settings: JsonSettings) -> Self {
        self.config.json = settings;
        self
    }

    pub(crate) fn into_parts(self) -> Result<(Arc<T>, ClientConfig), Error> {
        let transport = self.transport.ok_or(Error::MissingArgument("transport"))?;
        Ok((transport, self.config))
    }
}
