//! Normalized description of a failed call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Media type of RFC 7807 style problem documents.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// A failure description surfaced to callers.
///
/// Built by the extractor from a live response, or by the pipeline when the
/// call failed before any usable response existed. Every field is optional
/// because servers rarely fill all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<String>,
}

impl Problem {
    pub fn new(status_code: Option<u16>) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// A content type or problem-type URI.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.title(), self.details()) {
            (Some(title), Some(details)) => write!(f, "{title}: {details}"),
            (Some(text), None) | (None, Some(text)) => f.write_str(text),
            (None, None) => match self.status_code {
                Some(status) => write!(f, "problem with status code {status}"),
                None => f.write_str("problem"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_skips_missing_fields() {
        let problem = Problem::new(Some(409)).with_title("Conflict").with_type("urn:conflict");
        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"statusCode": 409, "title": "Conflict", "type": "urn:conflict"})
        );
    }

    #[test]
    fn display_joins_title_and_details() {
        let problem = Problem::new(None).with_title("Bad input").with_details("name is required");
        assert_eq!(problem.to_string(), "Bad input: name is required");
    }

    #[test]
    fn display_falls_back_to_status_code() {
        assert_eq!(Problem::new(Some(502)).to_string(), "problem with status code 502");
    }
}
