use std::borrow::Cow;
use std::sync::Arc;

use http::StatusCode;
use keel_core::{AppError, Environment, ErrorCode, ErrorResponse, Failure, RequestInfo, ValidationIssue};
use serde_json::{Value, json};

use crate::diagnostics::{Classification, DiagnosticRecord, DiagnosticSink, TracingSink};

const RESPONSE_MISMATCH_MESSAGE: &str = "Response doesn't match the schema";

/// Turns any [`Failure`] into the status and body sent to the client
///
/// Classification is first-match-wins over the failure variant:
/// structured errors pass through, validation issues become 400, response
/// contract mismatches become 500, a 429 status becomes
/// `TOO_MANY_REQUESTS`, and anything else becomes a generic 500 whose
/// diagnostic details are only disclosed outside production.
#[derive(Clone)]
pub struct Dispatcher {
    environment: Environment,
    sink: Arc<dyn DiagnosticSink>,
}

impl Dispatcher {
    pub fn new(environment: Environment, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { environment, sink }
    }

    /// Dispatcher that reports through `tracing`
    pub fn with_tracing(environment: Environment) -> Self {
        Self::new(environment, Arc::new(TracingSink))
    }

    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Classify `failure` and render the wire response
    ///
    /// Deterministic for a given failure and environment. Diagnostic sink
    /// errors are dropped.
    pub fn dispatch(&self, failure: &Failure, request: &RequestInfo) -> (StatusCode, ErrorResponse) {
        let (classification, error) = self.classify(failure);

        if self.should_record(classification) {
            let record = DiagnosticRecord {
                classification,
                failure,
                request,
            };
            if let Err(e) = self.sink.record(&record) {
                tracing::debug!(error = %e, "diagnostic sink rejected record");
            }
        }

        (error.status(), error.to_response(self.environment))
    }

    /// Map a failure to its class and the structured error it becomes
    pub fn classify(&self, failure: &Failure) -> (Classification, AppError) {
        match failure {
            Failure::Structured(error) => (Classification::Structured, error.clone()),
            Failure::Validation(issues) => (Classification::Validation, self.validation_error(issues)),
            Failure::ResponseMismatch(issues) => (
                Classification::ResponseMismatch,
                self.class_error(ErrorCode::INTERNAL_SERVER_ERROR)
                    .with_message(RESPONSE_MISMATCH_MESSAGE)
                    .with_detail("issues", Value::Array(issues.clone())),
            ),
            Failure::Status { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS => {
                (Classification::RateLimited, self.class_error(ErrorCode::TOO_MANY_REQUESTS))
            }
            Failure::Status { .. } | Failure::Unclassified { .. } => {
                (Classification::Unhandled, self.unhandled_error(failure))
            }
        }
    }

    fn should_record(&self, classification: Classification) -> bool {
        match classification {
            Classification::Structured => false,
            Classification::ResponseMismatch => true,
            Classification::Validation | Classification::RateLimited | Classification::Unhandled => {
                !self.environment.is_production()
            }
        }
    }

    fn unhandled_error(&self, failure: &Failure) -> AppError {
        let (name, cause) = match failure {
            Failure::Unclassified { name, error } => (name.clone(), Arc::clone(error)),
            other => (
                Cow::Borrowed("Status"),
                Arc::new(anyhow::anyhow!(other.to_string())),
            ),
        };

        let error = self
            .class_error(ErrorCode::INTERNAL_SERVER_ERROR)
            .with_shared_cause(Arc::clone(&cause));

        if self.environment.is_production() {
            return error;
        }

        error.with_detail(
            "error",
            json!({
                "name": name,
                "message": cause.to_string(),
            }),
        )
    }

    fn validation_error(&self, issues: &[ValidationIssue]) -> AppError {
        let issues: Vec<Value> = issues
            .iter()
            .map(|issue| json!({ "message": issue.message, "field": issue.path }))
            .collect();

        self.class_error(ErrorCode::BAD_REQUEST).with_detail("issues", issues)
    }

    /// Production responses never render a stack, so skip capturing one
    fn class_error(&self, code: ErrorCode) -> AppError {
        if self.environment.is_production() {
            AppError::untraced(code)
        } else {
            AppError::of_class(code)
        }
    }
}
