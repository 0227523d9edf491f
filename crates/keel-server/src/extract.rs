use axum::Json;
use axum::extract::{FromRequest, Request};
use keel_core::sanitize::sanitize_value;
use keel_core::{Failure, PathSegment, ValidationIssue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_path_to_error::Segment;

use crate::reply::ApiError;

/// Schema rules beyond what deserialization already enforces
pub trait Validate {
    /// Report every problem at once; an empty result is success
    fn validate(&self) -> Vec<ValidationIssue> {
        Vec::new()
    }
}

/// JSON body extractor that sanitizes strings and validates the payload
///
/// Malformed bodies, missing fields and [`Validate`] issues all surface as
/// [`Failure::Validation`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(request, state)
            .await
            .map_err(|rejection| single_issue(rejection.body_text(), Vec::new()))?;

        let payload: T =
            serde_path_to_error::deserialize(sanitize_value(body)).map_err(|e| deserialize_issue(&e))?;

        let issues = payload.validate();
        if !issues.is_empty() {
            return Err(Failure::validation(issues).into());
        }

        Ok(Self(payload))
    }
}

/// Serialize a handler result after checking it against its own contract
///
/// A payload that fails validation is a server bug and is reported as
/// [`Failure::ResponseMismatch`] instead of being sent.
///
/// # Errors
///
/// Returns an error when the payload does not validate
pub fn checked_json<T>(payload: T) -> Result<Json<T>, ApiError>
where
    T: Serialize + Validate,
{
    let issues = payload.validate();
    if issues.is_empty() {
        return Ok(Json(payload));
    }

    let issues = issues
        .into_iter()
        .map(|issue| serde_json::to_value(issue).unwrap_or(Value::Null))
        .collect();

    Err(Failure::response_mismatch(issues).into())
}

fn deserialize_issue(error: &serde_path_to_error::Error<serde_json::Error>) -> ApiError {
    let mut path: Vec<PathSegment> = error
        .path()
        .iter()
        .filter_map(|segment| match segment {
            Segment::Seq { index } => Some(PathSegment::Index(*index)),
            Segment::Map { key } => Some(PathSegment::Key(key.clone())),
            Segment::Enum { variant } => Some(PathSegment::Key(variant.clone())),
            Segment::Unknown => None,
        })
        .collect();

    let message = error.inner().to_string();

    // serde reports absent fields as "missing field `name`" against the
    // enclosing object
    if let Some(rest) = message.strip_prefix("missing field `")
        && let Some((field, _)) = rest.split_once('`')
    {
        path.push(PathSegment::from(field));
        return single_issue("Required".to_string(), path);
    }

    single_issue(message, path)
}

fn single_issue(message: String, path: Vec<PathSegment>) -> ApiError {
    Failure::validation(vec![ValidationIssue { message, path }]).into()
}
