use serde::{Deserialize, Serialize};

use crate::{Details, ErrorCode};

/// Error body sent to API clients
///
/// `details` and `stack` are omitted from the JSON when absent. A missing
/// `stack` is part of the contract: production responses never carry one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}
