//! HTTP data types exchanged with a transport.
//!
//! # Design
//! Requests and responses are plain data. The pipeline builds an
//! `HttpRequest`, hands it to a `Transport`, and inspects the `HttpResponse`
//! that comes back; the transport owns every network concern. Header lists are
//! kept as ordered `(name, value)` pairs and looked up case-insensitively, so
//! values the pipeline never validated survive untouched until the transport.

use std::fmt;

use bytes::Bytes;

/// Content type attached to serialized request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by the client pipeline and passed, possibly after a request
/// interceptor mutated it, to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// First value of the named header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Append a header unless one with the same name is already present.
    ///
    /// The value is not checked against header syntax. Returns whether the
    /// header was added.
    pub fn try_add_header(&mut self, name: &str, value: &str) -> bool {
        if self.header(name).is_some() {
            return false;
        }
        self.headers.push((name.to_string(), value.to_string()));
        true
    }

    /// Replace every value of the named header with `value`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }
}

/// An HTTP response described as plain data.
///
/// Transports return every status code as a response; only failures to get a
/// response at all are transport errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// URI of the request that produced this response, when known.
    pub request_uri: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
            request_uri: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_request_uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = Some(uri.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True for 200-299.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Lower-cased media type of the `content-type` header, parameters removed.
    pub fn media_type(&self) -> Option<String> {
        let raw = self.header("content-type")?;
        let media = raw.split(';').next().unwrap_or_default().trim();
        if media.is_empty() {
            None
        } else {
            Some(media.to_ascii_lowercase())
        }
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_add_header_keeps_existing_value() {
        let mut req = HttpRequest::new(HttpMethod::Get, "http://localhost/");
        assert!(req.try_add_header("Accept", "text/plain"));
        assert!(!req.try_add_header("accept", "application/json"));
        assert_eq!(req.header("ACCEPT"), Some("text/plain"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn try_add_header_accepts_malformed_values() {
        let mut req = HttpRequest::new(HttpMethod::Get, "http://localhost/");
        assert!(req.try_add_header("X-Odd", "line\nbreak"));
        assert_eq!(req.header("x-odd"), Some("line\nbreak"));
    }

    #[test]
    fn set_header_replaces_all_values() {
        let mut req = HttpRequest::new(HttpMethod::Post, "http://localhost/");
        req.headers.push(("X-Id".to_string(), "1".to_string()));
        req.headers.push(("x-id".to_string(), "2".to_string()));
        req.set_header("X-ID", "3");
        assert_eq!(req.headers, vec![("X-ID".to_string(), "3".to_string())]);
    }

    #[test]
    fn media_type_strips_parameters_and_lowercases() {
        let response =
            HttpResponse::new(200).with_header("Content-Type", "Application/JSON; charset=utf-8");
        assert_eq!(response.media_type().as_deref(), Some("application/json"));
    }

    #[test]
    fn media_type_absent_without_header() {
        assert_eq!(HttpResponse::new(200).media_type(), None);
    }

    #[test]
    fn success_range_is_200_to_299() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(299).is_success());
        assert!(!HttpResponse::new(199).is_success());
        assert!(!HttpResponse::new(300).is_success());
    }

    #[test]
    fn method_display_is_uppercase() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
