use std::fmt;
#[cfg(any(test, feature = "test-util"))]
use std::sync::Mutex;

use keel_core::{Failure, RequestInfo};

/// Which dispatcher rule classified a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Raised as an `AppError` and passed through
    Structured,
    /// Request payload did not match its schema
    Validation,
    /// Handler output did not match its declared contract
    ResponseMismatch,
    /// A collaborator signalled 429
    RateLimited,
    /// Everything else, reported as an internal error
    Unhandled,
}

impl Classification {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Validation => "validation",
            Self::ResponseMismatch => "response_mismatch",
            Self::RateLimited => "rate_limited",
            Self::Unhandled => "unhandled",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the dispatcher reports about one classified failure
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticRecord<'a> {
    pub classification: Classification,
    pub failure: &'a Failure,
    pub request: &'a RequestInfo,
}

/// Destination for dispatcher diagnostics
///
/// Called synchronously on the request path. Errors are ignored by the
/// dispatcher, so implementations must not rely on them for control flow.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, record: &DiagnosticRecord<'_>) -> anyhow::Result<()>;
}

/// Sink that emits one `tracing` event per record
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, record: &DiagnosticRecord<'_>) -> anyhow::Result<()> {
        let request = record.request;
        let failure = record.failure;

        match record.classification {
            Classification::ResponseMismatch | Classification::Unhandled => tracing::error!(
                classification = %record.classification,
                request_id = %request.id,
                method = %request.method,
                path = %request.path,
                params = %request.params,
                query = %request.query,
                error = ?failure,
                "unhandled error"
            ),
            Classification::Structured | Classification::Validation | Classification::RateLimited => {
                tracing::warn!(
                    classification = %record.classification,
                    request_id = %request.id,
                    method = %request.method,
                    path = %request.path,
                    params = %request.params,
                    query = %request.query,
                    error = %failure,
                    "request failed"
                );
            }
        }

        Ok(())
    }
}

/// A record captured by [`MemorySink`]
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone)]
pub struct CapturedRecord {
    pub classification: Classification,
    pub failure: Failure,
    pub request_id: String,
    pub path: String,
}

/// Sink that keeps records in memory, for assertions in tests
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CapturedRecord>>,
}

#[cfg(any(test, feature = "test-util"))]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl DiagnosticSink for MemorySink {
    fn record(&self, record: &DiagnosticRecord<'_>) -> anyhow::Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("diagnostic buffer poisoned"))?;

        records.push(CapturedRecord {
            classification: record.classification,
            failure: record.failure.clone(),
            request_id: record.request.id.clone(),
            path: record.request.path.clone(),
        });

        Ok(())
    }
}
