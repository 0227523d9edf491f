use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;

use crate::{Environment, ErrorCode, ErrorResponse};

/// Structured, safe-to-expose context attached to an error response
pub type Details = serde_json::Map<String, Value>;

/// Canonical in-process representation of a request failure
///
/// Built where a failure is recognized, either by business logic through one
/// of the class factories or by the dispatcher from a collaborator failure.
/// Construction never fails and performs no I/O.
///
/// `details` ends up on the wire in every environment, so it must never carry
/// secrets. The `cause` is kept for diagnostics only and is never serialized
/// in production.
#[derive(Debug, Clone)]
pub struct AppError {
    code: ErrorCode,
    message: String,
    status: StatusCode,
    details: Option<Details>,
    cause: Option<Arc<anyhow::Error>>,
    trace: Option<Arc<Backtrace>>,
}

impl AppError {
    /// Create an error with an arbitrary code and the default 400 status
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(code, message.into(), StatusCode::BAD_REQUEST, Some(Backtrace::capture()))
    }

    /// Error of the class named by `code`, with its default message and status
    pub fn of_class(code: ErrorCode) -> Self {
        let (message, status) = (code.default_message(), code.default_status());
        Self::build(code, message.to_owned(), status, Some(Backtrace::capture()))
    }

    /// Same as [`AppError::of_class`] without capturing a construction trace
    ///
    /// For errors whose stack is never rendered, such as the ones built while
    /// dispatching in production.
    pub fn untraced(code: ErrorCode) -> Self {
        let (message, status) = (code.default_message(), code.default_status());
        Self::build(code, message.to_owned(), status, None)
    }

    fn build(code: ErrorCode, message: String, status: StatusCode, trace: Option<Backtrace>) -> Self {
        Self {
            code,
            message,
            status,
            details: None,
            cause: None,
            trace: trace.map(Arc::new),
        }
    }

    pub fn bad_request() -> Self {
        Self::of_class(ErrorCode::BAD_REQUEST)
    }

    pub fn unauthorized() -> Self {
        Self::of_class(ErrorCode::UNAUTHORIZED)
    }

    pub fn forbidden() -> Self {
        Self::of_class(ErrorCode::FORBIDDEN)
    }

    pub fn not_found() -> Self {
        Self::of_class(ErrorCode::NOT_FOUND)
    }

    pub fn conflict() -> Self {
        Self::of_class(ErrorCode::CONFLICT)
    }

    pub fn too_many_requests() -> Self {
        Self::of_class(ErrorCode::TOO_MANY_REQUESTS)
    }

    pub fn internal() -> Self {
        Self::of_class(ErrorCode::INTERNAL_SERVER_ERROR)
    }

    /// Replace the code, keeping the status of the originating class
    #[must_use]
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = Some(details);
        self
    }

    /// Add a single entry to the details map
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Details::new)
            .insert(key.into(), value.into());
        self
    }

    /// Attach the underlying failure for diagnostics
    #[must_use]
    pub fn with_cause(self, cause: impl Into<anyhow::Error>) -> Self {
        self.with_shared_cause(Arc::new(cause.into()))
    }

    /// Attach an underlying failure that is also referenced elsewhere
    #[must_use]
    pub fn with_shared_cause(mut self, cause: Arc<anyhow::Error>) -> Self {
        self.cause = Some(cause);
        self
    }

    pub const fn code(&self) -> &ErrorCode {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn details(&self) -> Option<&Details> {
        self.details.as_ref()
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }

    /// Trace captured where this error was built, if any
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.trace.as_deref()
    }

    /// Wire representation of this error
    ///
    /// In production the stack is always omitted. Elsewhere it is rendered
    /// from the cause when there is one, or from this error's own
    /// construction trace otherwise.
    pub fn to_response(&self, environment: Environment) -> ErrorResponse {
        ErrorResponse {
            code: self.code.clone(),
            message: self.message.clone(),
            details: self.details.clone(),
            stack: (!environment.is_production()).then(|| self.render_stack()),
        }
    }

    fn render_stack(&self) -> String {
        if let Some(cause) = &self.cause {
            // anyhow's debug format carries the cause chain and, when
            // captured, the backtrace
            return format!("{cause:?}");
        }

        let mut stack = self.to_string();
        if let Some(trace) = self.backtrace()
            && trace.status() == BacktraceStatus::Captured
        {
            stack.push_str("\n\nStack backtrace:\n");
            stack.push_str(&trace.to_string());
        }
        stack
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| -> &(dyn std::error::Error + 'static) { cause.as_ref() })
    }
}
