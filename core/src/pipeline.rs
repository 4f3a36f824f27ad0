//! Transport-independent steps of a REST call.
//!
//! # Design
//! A call runs: resolve URI, build request, inject default headers, request
//! hook, dispatch, response hook or validation, read result. Everything except
//! dispatch lives here so the async and blocking clients run the identical
//! sequence and differ only in how they wait on the transport. Failures travel
//! as `Failure` until the call boundary, where `Call::fail` turns them into
//! the public `Error`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{BoxError, Error, RestApiError, REQUEST_FAILED};
use crate::extract::problem_from_response;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, JSON_CONTENT_TYPE};
use crate::problem::Problem;

/// Failure inside the pipeline, before it is shaped for the caller.
#[derive(Debug)]
pub(crate) enum Failure {
    Cancelled,
    Api(RestApiError),
    Other(BoxError),
}

impl From<BoxError> for Failure {
    fn from(err: BoxError) -> Self {
        let err = match err.downcast::<RestApiError>() {
            Ok(api) => return Failure::Api(*api),
            Err(err) => err,
        };
        match err.downcast::<Error>() {
            Ok(err) => match *err {
                Error::Cancelled => Failure::Cancelled,
                Error::Api(api) => Failure::Api(api),
                other => Failure::Other(Box::new(other)),
            },
            Err(err) => Failure::Other(err),
        }
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Failure::Other(Box::new(err))
    }
}

impl From<url::ParseError> for Failure {
    fn from(err: url::ParseError) -> Self {
        Failure::Other(Box::new(err))
    }
}

/// Abort with `Failure::Cancelled` once the token has fired.
pub(crate) fn checkpoint(cancel: &CancellationToken) -> Result<(), Failure> {
    if cancel.is_cancelled() {
        Err(Failure::Cancelled)
    } else {
        Ok(())
    }
}

/// Identity of one call, used to shape its error.
pub(crate) struct Call<'a> {
    pub(crate) method: HttpMethod,
    pub(crate) uri: &'a str,
    /// Status code of the response, once one arrived.
    pub(crate) status: Option<u16>,
}

impl<'a> Call<'a> {
    pub(crate) fn new(method: HttpMethod, uri: &'a str) -> Self {
        Self {
            method,
            uri,
            status: None,
        }
    }

    pub(crate) fn fail(&self, failure: Failure) -> Error {
        let err = match failure {
            Failure::Cancelled => Error::Cancelled,
            Failure::Api(err) => Error::Api(err),
            Failure::Other(cause) => {
                let problem = Problem::new(self.status)
                    .with_title(REQUEST_FAILED)
                    .with_details(cause.to_string())
                    .with_type(self.method.as_str())
                    .with_instance(self.uri);
                Error::Api(RestApiError::from_problem(problem, Some(cause)))
            }
        };
        tracing::debug!(
            method = %self.method,
            uri = self.uri,
            status = ?self.status,
            error = %err,
            "request failed"
        );
        err
    }
}

/// Fill in the originating URI when the transport did not report one.
pub(crate) fn with_request_uri(mut response: HttpResponse, url: String) -> HttpResponse {
    if response.request_uri.is_none() {
        response.request_uri = Some(url);
    }
    response
}

impl ClientConfig {
    /// Resolve the URI and build the bare request, serializing `body` as JSON.
    pub(crate) fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<HttpRequest, Failure> {
        let url = self.base_uri.resolve(uri)?;
        let mut request = HttpRequest::new(method, url);
        if let Some(body) = body {
            request.body = Some(self.json.serialize(body)?);
            request.set_header("content-type", JSON_CONTENT_TYPE);
            checkpoint(cancel)?;
        }
        Ok(request)
    }

    /// Add default headers the request does not already carry.
    ///
    /// Values are passed through unvalidated.
    pub(crate) fn inject_headers(&self, request: &mut HttpRequest) {
        for (name, value) in &self.default_headers {
            request.try_add_header(name, value);
        }
    }

    /// Everything up to dispatch: build, headers, request hook.
    pub(crate) fn prepare<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        uri: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<HttpRequest, Failure> {
        let mut request = self.build_request(method, uri, body, cancel)?;
        checkpoint(cancel)?;
        self.inject_headers(&mut request);

        if let Some(interceptor) = &self.request_interceptor {
            checkpoint(cancel)?;
            interceptor.on_request(&mut request, cancel)?;
        }

        checkpoint(cancel)?;
        Ok(request)
    }

    /// Hand the response to the response hook, or validate its status.
    ///
    /// A registered hook alone decides whether the call failed.
    pub(crate) fn inspect(
        &self,
        response: &HttpResponse,
        validate: bool,
        cancel: &CancellationToken,
    ) -> Result<(), Failure> {
        checkpoint(cancel)?;
        match &self.response_interceptor {
            Some(interceptor) => interceptor.on_response(response, cancel)?,
            None if validate => validate_response(response)?,
            None => {}
        }
        checkpoint(cancel)
    }

    pub(crate) fn decode<T: DeserializeOwned + Default>(
        &self,
        response: &HttpResponse,
    ) -> Result<T, Failure> {
        Ok(self.json.deserialize(&response.body)?)
    }
}

fn validate_response(response: &HttpResponse) -> Result<(), Failure> {
    if response.is_success() {
        return Ok(());
    }
    let problem = problem_from_response(response);
    Err(Failure::Api(RestApiError::from_status(response.status, problem)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Deserialize;

    use super::*;
    use crate::interceptor::{RequestInterceptor, ResponseInterceptor};

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct NewOrder {
        customer_name: String,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Order {
        order_id: u32,
    }

    fn config() -> ClientConfig {
        ClientConfig::new(Some("http://api.local/v1/"))
    }

    #[test]
    fn build_request_serializes_body_as_json() {
        let body = NewOrder {
            customer_name: "Ada".to_string(),
        };
        let cancel = CancellationToken::new();
        let req = config().build_request(HttpMethod::Post, "orders", Some(&body), &cancel).unwrap();
        assert_eq!(req.url, "http://api.local/v1/orders");
        assert_eq!(req.body.as_deref(), Some(r#"{"customerName":"Ada"}"#));
        assert_eq!(req.header("Content-Type"), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn build_request_without_body_has_no_content_type() {
        let cancel = CancellationToken::new();
        let req = config()
            .build_request::<()>(HttpMethod::Get, "orders", None, &cancel)
            .unwrap();
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn default_headers_do_not_override_existing_ones() {
        let mut config = config();
        config
            .default_headers_mut()
            .insert("X-Tenant".to_string(), "blue".to_string());
        let mut req = HttpRequest::new(HttpMethod::Get, "http://api.local/");
        req.headers.push(("accept".to_string(), "text/csv".to_string()));
        config.inject_headers(&mut req);
        assert_eq!(req.header("Accept"), Some("text/csv"));
        assert_eq!(req.header("x-tenant"), Some("blue"));
    }

    #[test]
    fn request_interceptor_sees_default_headers_and_can_mutate() {
        let mut config = config();
        let interceptor =
            |request: &mut HttpRequest, _: &CancellationToken| -> Result<(), BoxError> {
                assert!(request.header("accept").is_some());
                request.set_header("Authorization", "Bearer t0ken");
                Ok(())
            };
        config.set_request_interceptor(Some(Arc::new(interceptor) as Arc<dyn RequestInterceptor>));
        let cancel = CancellationToken::new();
        let req = config.prepare::<()>(HttpMethod::Get, "orders", None, &cancel).unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer t0ken"));
    }

    #[test]
    fn prepare_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = config().prepare::<()>(HttpMethod::Get, "orders", None, &cancel);
        assert!(matches!(result, Err(Failure::Cancelled)));
    }

    #[test]
    fn inspect_rejects_non_success_with_extracted_problem() {
        let response = HttpResponse::new(404)
            .with_header("content-type", "text/plain")
            .with_body("no such order")
            .with_request_uri("http://api.local/v1/orders/9");
        let cancel = CancellationToken::new();
        match config().inspect(&response, true, &cancel) {
            Err(Failure::Api(err)) => {
                assert_eq!(err.status_code(), Some(404));
                assert_eq!(err.problem().unwrap().details(), Some("no such order"));
                assert_eq!(err.message(), "no such order");
            }
            other => panic!("expected api failure, got {other:?}"),
        }
    }

    #[test]
    fn inspect_skips_validation_when_not_requested() {
        let cancel = CancellationToken::new();
        assert!(config().inspect(&HttpResponse::new(500), false, &cancel).is_ok());
    }

    #[test]
    fn response_interceptor_supersedes_validation() {
        let mut config = config();
        let accept_all =
            |_: &HttpResponse, _: &CancellationToken| -> Result<(), BoxError> { Ok(()) };
        config.set_response_interceptor(Some(Arc::new(accept_all) as Arc<dyn ResponseInterceptor>));
        let cancel = CancellationToken::new();
        assert!(config.inspect(&HttpResponse::new(500), true, &cancel).is_ok());
    }

    #[test]
    fn decode_blank_body_is_default() {
        let order: Order = config().decode(&HttpResponse::new(204)).unwrap();
        assert_eq!(order, Order::default());
    }

    #[test]
    fn boxed_api_error_passes_through_conversion() {
        let boxed: BoxError = Box::new(RestApiError::from_status(409, None));
        assert!(matches!(
            Failure::from(boxed),
            Failure::Api(err) if err.status_code() == Some(409)
        ));

        let boxed: BoxError = Box::new(Error::Cancelled);
        assert!(matches!(Failure::from(boxed), Failure::Cancelled));

        let boxed: BoxError = "disk full".into();
        assert!(matches!(Failure::from(boxed), Failure::Other(_)));
    }

    #[test]
    fn call_fail_synthesizes_problem_from_cause() {
        let mut call = Call::new(HttpMethod::Put, "orders/7");
        call.status = Some(200);
        let err = call.fail(Failure::Other("expected value at line 1".into()));
        let problem = err.problem().unwrap();
        assert_eq!(err.status_code(), Some(200));
        assert_eq!(problem.title(), Some(REQUEST_FAILED));
        assert_eq!(problem.details(), Some("expected value at line 1"));
        assert_eq!(problem.kind(), Some("PUT"));
        assert_eq!(problem.instance(), Some("orders/7"));
        assert_eq!(err.to_string(), REQUEST_FAILED);
    }

    #[test]
    fn call_fail_keeps_cancellation_distinct() {
        let err = Call::new(HttpMethod::Get, "orders").fail(Failure::Cancelled);
        assert!(err.is_cancelled());
    }
}
