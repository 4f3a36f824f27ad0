//! Build a `Problem` from whatever a server sent back.
//!
//! # Design
//! Servers disagree on error formats. The extractor keys off the response
//! media type: problem documents and plain JSON are parsed for problem-shaped
//! fields, plain text becomes the details of a synthesized problem, anything
//! else is not treated as a problem. Parsing never fails outward; a body that
//! cannot be read becomes a problem whose details carry the parse error.

use serde::Deserialize;
use serde_json::Value;

use crate::error::default_title;
use crate::http::HttpResponse;
use crate::json::CaseInsensitive;
use crate::problem::{Problem, APPLICATION_PROBLEM_JSON};

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain";

/// Problem-shaped fields a server may send.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProblemBody {
    /// Read wide so an out-of-range code does not discard the other fields.
    status_code: Option<i64>,
    title: Option<String>,
    details: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    instance: Option<String>,
}

impl ProblemBody {
    fn is_empty(&self) -> bool {
        self.status_code.is_none()
            && self.title.is_none()
            && self.details.is_none()
            && self.kind.is_none()
            && self.instance.is_none()
    }
}

/// Inspect a response and describe it as a `Problem`.
///
/// Returns `None` when the response should not be treated as a problem: an
/// unsupported media type, or an `application/json` body that has none of the
/// problem fields.
pub fn problem_from_response(response: &HttpResponse) -> Option<Problem> {
    let media_type = response.media_type();
    let status_code = response.status;

    let parsed = match media_type.as_deref() {
        Some(APPLICATION_PROBLEM_JSON) => parse_json(response, true),
        Some(APPLICATION_JSON) => parse_json(response, false),
        Some(TEXT_PLAIN) => parse_text(response),
        _ => return None,
    };

    let mut problem = match parsed {
        Ok(Parsed::NotAProblem) => return None,
        Ok(Parsed::Json(body)) => {
            let status_code = body
                .status_code
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(status_code);
            let mut problem = Problem::new(Some(status_code));
            if let Some(title) = body.title {
                problem = problem.with_title(title);
            }
            if let Some(details) = body.details {
                problem = problem.with_details(details);
            }
            match body.kind.or(media_type) {
                Some(kind) => problem.with_type(kind),
                None => problem,
            }
        }
        Ok(Parsed::Text(text)) => with_media_type(
            Problem::new(Some(status_code))
                .with_title(default_title(status_code))
                .with_details(text),
            media_type,
        ),
        Err(err) => {
            tracing::trace!(status = status_code, error = %err, "problem body could not be parsed");
            with_media_type(
                Problem::new(Some(status_code))
                    .with_title(default_title(status_code))
                    .with_details(err),
                media_type,
            )
        }
    };

    if let Some(instance) = &response.request_uri {
        problem = problem.with_instance(instance.clone());
    }
    Some(problem)
}

enum Parsed {
    NotAProblem,
    Json(ProblemBody),
    Text(String),
}

fn parse_json(response: &HttpResponse, is_problem: bool) -> Result<Parsed, String> {
    let body = &response.body;
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(body).map_err(|e| e.to_string())?
    };
    let parsed = match value {
        Value::Null => ProblemBody::default(),
        value => ProblemBody::deserialize(CaseInsensitive(value)).map_err(|e| e.to_string())?,
    };
    if !is_problem && parsed.is_empty() {
        return Ok(Parsed::NotAProblem);
    }
    Ok(Parsed::Json(parsed))
}

fn parse_text(response: &HttpResponse) -> Result<Parsed, String> {
    std::str::from_utf8(&response.body)
        .map(|text| Parsed::Text(text.to_string()))
        .map_err(|e| format!("response body is not valid UTF-8: {e}"))
}

fn with_media_type(problem: Problem, media_type: Option<String>) -> Problem {
    match media_type {
        Some(kind) => problem.with_type(kind),
        None => problem,
    }
}
