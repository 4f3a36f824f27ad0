//! Error types for the REST client.
//!
//! # Design
//! Callers see a single `Error` enum. Construction mistakes and cancellation
//! get their own variants so they can be told apart without inspecting
//! messages; everything that went wrong while talking to the server lands in
//! `Api` as a `RestApiError` carrying the status code observed so far, the
//! structured `Problem`, and the underlying cause.

use crate::problem::Problem;

/// Boxed cause used at every transport and interceptor seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Title of problems synthesized for failures that were not HTTP errors.
pub const REQUEST_FAILED: &str = "RESTful api request failed.";

/// Errors returned by the REST clients.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required constructor argument was not supplied.
    #[error("missing required argument `{0}`")]
    MissingArgument(&'static str),

    /// The caller cancelled the operation.
    #[error("operation was cancelled")]
    Cancelled,

    /// The request failed; see the carried status code and problem.
    #[error(transparent)]
    Api(#[from] RestApiError),
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(err) => err.status_code(),
            _ => None,
        }
    }

    pub fn problem(&self) -> Option<&Problem> {
        match self {
            Error::Api(err) => err.problem(),
            _ => None,
        }
    }
}

/// A failed REST call.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RestApiError {
    status_code: Option<u16>,
    problem: Option<Problem>,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl RestApiError {
    pub fn with_message(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self {
            status_code: None,
            problem: None,
            message: message.into(),
            source,
        }
    }

    /// Wrap a problem; the message is the problem's title.
    pub fn from_problem(problem: Problem, source: Option<BoxError>) -> Self {
        let message = problem.title().unwrap_or(REQUEST_FAILED).to_string();
        Self {
            status_code: problem.status_code(),
            problem: Some(problem),
            message,
            source,
        }
    }

    /// Failure for a response whose status code was rejected.
    ///
    /// The message is the problem's details, or a sentence naming the status
    /// code when the response carried no problem.
    pub fn from_status(status_code: u16, problem: Option<Problem>) -> Self {
        let message = problem
            .as_ref()
            .and_then(|p| p.details())
            .map(str::to_string)
            .unwrap_or_else(|| default_title(status_code));
        Self {
            status_code: Some(status_code),
            problem,
            message,
            source: None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// `"Request completed with status code {status}"`.
pub(crate) fn default_title(status_code: u16) -> String {
    format!("Request completed with status code {status_code}")
}
