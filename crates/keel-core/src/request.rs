use http::Method;
use serde_json::Value;

use crate::sanitize::sanitize_value;

/// Request metadata attached to diagnostic records
///
/// Params and query are sanitized on the way in, so whatever reaches a log
/// sink has already been escaped.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// Request identifier echoed in the `x-request-id` header
    pub id: String,
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Path parameters captured by the router
    pub params: Value,
    /// Parsed query string
    pub query: Value,
}

impl RequestInfo {
    pub fn new(id: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method,
            path: path.into(),
            params: Value::Null,
            query: Value::Null,
        }
    }

    /// Placeholder for failures raised outside any HTTP request
    pub fn detached() -> Self {
        Self::new("-", Method::GET, "/")
    }

    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = sanitize_value(params);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = sanitize_value(query);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn detached_info_has_no_params() {
        let info = RequestInfo::detached();
        assert_eq!(info.params, Value::Null);
        assert_eq!(info.query, Value::Null);
    }

    #[test]
    fn params_and_query_are_sanitized() {
        let info = RequestInfo::new("req-1", Method::POST, "/v1/users")
            .with_params(json!({ "id": " <1> " }))
            .with_query(json!({ "q": "a/b" }));

        assert_eq!(info.params, json!({ "id": "&lt;1&gt;" }));
        assert_eq!(info.query, json!({ "q": "a&#x2F;b" }));
    }
}
