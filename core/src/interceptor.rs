//! Request and response hooks.
//!
//! A request interceptor runs after default headers are applied and before
//! dispatch; whatever it changes on the request is what the transport sends.
//! A response interceptor replaces status validation entirely: when one is
//! registered the call succeeds unless the interceptor returns an error.
//!
//! Hooks are synchronous so the async and blocking clients can share them.
//! Returning a boxed `RestApiError` or `Error` passes it through to the caller
//! unchanged; any other error is wrapped like a transport failure.

use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::http::{HttpRequest, HttpResponse};

pub trait RequestInterceptor: Send + Sync {
    fn on_request(
        &self,
        request: &mut HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<(), BoxError>;
}

pub trait ResponseInterceptor: Send + Sync {
    fn on_response(
        &self,
        response: &HttpResponse,
        cancel: &CancellationToken,
    ) -> Result<(), BoxError>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut HttpRequest, &CancellationToken) -> Result<(), BoxError> + Send + Sync,
{
    fn on_request(
        &self,
        request: &mut HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<(), BoxError> {
        self(request, cancel)
    }
}

impl<F> ResponseInterceptor for F
where
    F: Fn(&HttpResponse, &CancellationToken) -> Result<(), BoxError> + Send + Sync,
{
    fn on_response(
        &self,
        response: &HttpResponse,
        cancel: &CancellationToken,
    ) -> Result<(), BoxError> {
        self(response, cancel)
    }
}

/// Logs every request and response at debug level.
#[derive(Debug, Clone, Default)]
pub struct LoggingInterceptor;

impl RequestInterceptor for LoggingInterceptor {
    fn on_request(
        &self,
        request: &mut HttpRequest,
        _cancel: &CancellationToken,
    ) -> Result<(), BoxError> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            headers = request.headers.len(),
            has_body = request.body.is_some(),
            "outgoing request"
        );
        Ok(())
    }
}

impl ResponseInterceptor for LoggingInterceptor {
    fn on_response(
        &self,
        response: &HttpResponse,
        _cancel: &CancellationToken,
    ) -> Result<(), BoxError> {
        tracing::debug!(
            status = response.status,
            url = response.request_uri.as_deref().unwrap_or_default(),
            bytes = response.body.len(),
            "incoming response"
        );
        Ok(())
    }
}
