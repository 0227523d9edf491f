use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error identifier exposed to API clients
///
/// The baseline codes cover the common HTTP failure classes. Domain code can
/// mint more specific ones (e.g. `PASSWORD_TOO_LONG`) with [`ErrorCode::new`]
/// so clients can branch on them while the response shape stays the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(Cow<'static, str>);

/// Rejected attempt to build an empty error code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error code must not be empty")]
pub struct InvalidErrorCode;

impl ErrorCode {
    pub const INTERNAL_SERVER_ERROR: Self = Self::from_static("INTERNAL_SERVER_ERROR");
    pub const BAD_REQUEST: Self = Self::from_static("BAD_REQUEST");
    pub const UNAUTHORIZED: Self = Self::from_static("UNAUTHORIZED");
    pub const FORBIDDEN: Self = Self::from_static("FORBIDDEN");
    pub const NOT_FOUND: Self = Self::from_static("NOT_FOUND");
    pub const CONFLICT: Self = Self::from_static("CONFLICT");
    pub const TOO_MANY_REQUESTS: Self = Self::from_static("TOO_MANY_REQUESTS");

    const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    /// Create a domain-specific error code
    ///
    /// # Errors
    ///
    /// Returns [`InvalidErrorCode`] if the code is empty or whitespace only
    pub fn new(code: impl Into<String>) -> Result<Self, InvalidErrorCode> {
        let code = code.into();

        if code.trim().is_empty() {
            return Err(InvalidErrorCode);
        }

        Ok(Self(Cow::Owned(code)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// HTTP status a failure with this code reports unless overridden
    ///
    /// Custom codes carry no class of their own and default to 400.
    pub fn default_status(&self) -> StatusCode {
        match self.as_str() {
            "INTERNAL_SERVER_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            "TOO_MANY_REQUESTS" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message a failure with this code reports unless overridden
    pub fn default_message(&self) -> &'static str {
        match self.as_str() {
            "INTERNAL_SERVER_ERROR" => "Internal server error",
            "UNAUTHORIZED" => "Unauthorized",
            "FORBIDDEN" => "Forbidden",
            "NOT_FOUND" => "Not found",
            "CONFLICT" => "Conflict",
            "TOO_MANY_REQUESTS" => "Too many requests",
            _ => "Bad request",
        }
    }

    /// Whether this is one of the predefined baseline codes
    pub fn is_builtin(&self) -> bool {
        matches!(
            self.as_str(),
            "INTERNAL_SERVER_ERROR"
                | "BAD_REQUEST"
                | "UNAUTHORIZED"
                | "FORBIDDEN"
                | "NOT_FOUND"
                | "CONFLICT"
                | "TOO_MANY_REQUESTS"
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ErrorCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for ErrorCode {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ErrorCode {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl FromStr for ErrorCode {
    type Err = InvalidErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_codes_map_to_their_status() {
        let cases = [
            (ErrorCode::BAD_REQUEST, 400, "Bad request"),
            (ErrorCode::UNAUTHORIZED, 401, "Unauthorized"),
            (ErrorCode::FORBIDDEN, 403, "Forbidden"),
            (ErrorCode::NOT_FOUND, 404, "Not found"),
            (ErrorCode::CONFLICT, 409, "Conflict"),
            (ErrorCode::TOO_MANY_REQUESTS, 429, "Too many requests"),
            (ErrorCode::INTERNAL_SERVER_ERROR, 500, "Internal server error"),
        ];

        for (code, status, message) in cases {
            assert_eq!(code.default_status().as_u16(), status, "{code}");
            assert_eq!(code.default_message(), message);
            assert!(code.is_builtin());
        }
    }

    #[test]
    fn custom_code_defaults_to_bad_request() {
        let code = ErrorCode::new("PASSWORD_TOO_LONG").unwrap();
        assert_eq!(code, "PASSWORD_TOO_LONG");
        assert_eq!(code.default_status(), StatusCode::BAD_REQUEST);
        assert!(!code.is_builtin());
    }

    #[test]
    fn empty_code_is_rejected() {
        assert_eq!(ErrorCode::new(""), Err(InvalidErrorCode));
        assert_eq!(ErrorCode::new("   "), Err(InvalidErrorCode));
        assert!(serde_json::from_str::<ErrorCode>("\"\"").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&ErrorCode::NOT_FOUND).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");

        let parsed: ErrorCode = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert_eq!(parsed, ErrorCode::NOT_FOUND);
    }
}
