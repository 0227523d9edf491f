use std::borrow::Cow;
use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::AppError;

/// Any failure that can surface while processing a request
///
/// The variant is the discriminant the dispatcher classifies on. Collaborator
/// failures (validation, serialization, rate limiting) are reported here
/// unwrapped; turning them into an [`AppError`] is the dispatcher's job.
#[derive(Debug, Clone, Error)]
pub enum Failure {
    /// Raised by business logic at the point of detection
    #[error(transparent)]
    Structured(AppError),

    /// The request did not match its declared schema
    #[error("request validation failed with {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    /// A handler produced a payload that does not match its declared output
    #[error("response does not match its declared contract")]
    ResponseMismatch(Vec<Value>),

    /// A collaborator signalled a failure through an HTTP status
    #[error("{message} (status {status})")]
    Status { status: StatusCode, message: String },

    /// Anything else
    #[error("{error}")]
    Unclassified {
        /// Type name of the original failure
        name: Cow<'static, str>,
        error: Arc<anyhow::Error>,
    },
}

impl Failure {
    pub const fn validation(issues: Vec<ValidationIssue>) -> Self {
        Self::Validation(issues)
    }

    pub const fn response_mismatch(issues: Vec<Value>) -> Self {
        Self::ResponseMismatch(issues)
    }

    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error, remembering its type name for diagnostics
    pub fn unclassified<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unclassified {
            name: Cow::Borrowed(std::any::type_name::<E>()),
            error: Arc::new(anyhow::Error::new(error)),
        }
    }
}

impl From<AppError> for Failure {
    fn from(error: AppError) -> Self {
        Self::Structured(error)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        // A structured error that travelled through anyhow is still structured
        match error.downcast::<AppError>() {
            Ok(app_error) => Self::Structured(app_error),
            Err(error) => Self::Unclassified {
                name: Cow::Borrowed("anyhow::Error"),
                error: Arc::new(error),
            },
        }
    }
}

/// One problem reported by request schema validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub message: String,
    pub path: Vec<PathSegment>,
}

impl ValidationIssue {
    pub fn new<P, S>(message: impl Into<String>, path: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            message: message.into(),
            path: path.into_iter().map(Into::into).collect(),
        }
    }
}

/// Location of a value inside a request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("socket closed")]
    struct SocketClosed;

    #[test]
    fn app_error_converts_to_structured() {
        let failure: Failure = AppError::forbidden().into();
        assert!(matches!(failure, Failure::Structured(_)));
    }

    #[test]
    fn app_error_inside_anyhow_stays_structured() {
        let failure: Failure = anyhow::Error::new(AppError::not_found()).into();
        assert!(matches!(failure, Failure::Structured(ref e) if e.status() == StatusCode::NOT_FOUND));
    }

    #[test]
    fn plain_anyhow_is_unclassified() {
        let failure: Failure = anyhow::anyhow!("boom").into();
        match failure {
            Failure::Unclassified { name, error } => {
                assert_eq!(name, "anyhow::Error");
                assert_eq!(error.to_string(), "boom");
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn unclassified_records_type_name() {
        let failure = Failure::unclassified(SocketClosed);
        match failure {
            Failure::Unclassified { name, .. } => assert!(name.ends_with("SocketClosed")),
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn path_segments_serialize_verbatim() {
        let issue = ValidationIssue::new("Required", [PathSegment::from("items"), 0.into(), "sku".into()]);
        let json = serde_json::to_value(&issue.path).unwrap();
        assert_eq!(json, serde_json::json!(["items", 0, "sku"]));
    }
}
