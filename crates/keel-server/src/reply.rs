use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, Query, RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{Method, StatusCode, Uri};
use keel_core::{Failure, RequestInfo};
use serde_json::{Map, Value};
use tower_http::request_id::RequestId;

use crate::dispatch::Dispatcher;

/// Handler error type
///
/// Anything convertible into a [`Failure`] converts into `ApiError` with
/// `?`. The response it produces is a placeholder carrying the failure; the
/// error layer replaces it with the dispatched body.
#[derive(Debug, Clone)]
pub struct ApiError(pub Failure);

impl ApiError {
    pub const fn failure(&self) -> &Failure {
        &self.0
    }
}

impl<E> From<E> for ApiError
where
    E: Into<Failure>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self.0);
        response
    }
}

/// Request fields kept around in case the response turns out to be a failure
struct RequestSnapshot {
    id: String,
    method: Method,
    uri: Uri,
    params: Vec<(String, String)>,
}

impl RequestSnapshot {
    async fn capture(request: Request) -> (Self, Request) {
        let (mut parts, body) = request.into_parts();

        let id = parts
            .extensions
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .unwrap_or("-")
            .to_string();

        // Unmatched routes carry no path parameters
        let params = RawPathParams::from_request_parts(&mut parts, &())
            .await
            .map(|params| {
                params
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let snapshot = Self {
            id,
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            params,
        };

        (snapshot, Request::from_parts(parts, body))
    }

    fn into_info(self) -> RequestInfo {
        let params: Map<String, Value> = self
            .params
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();

        let query: Map<String, Value> = Query::<Vec<(String, String)>>::try_from_uri(&self.uri)
            .map(|Query(pairs)| {
                pairs
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect()
            })
            .unwrap_or_default();

        RequestInfo::new(self.id, self.method, self.uri.path())
            .with_params(Value::Object(params))
            .with_query(Value::Object(query))
    }
}

/// Middleware that renders every failure through the dispatcher
///
/// Headers set by inner layers (rate limit counters, request id) survive;
/// status and body are replaced.
pub async fn error_layer(State(dispatcher): State<Arc<Dispatcher>>, request: Request, next: Next) -> Response {
    let (snapshot, request) = RequestSnapshot::capture(request).await;

    let mut response = next.run(request).await;
    let Some(failure) = response.extensions_mut().remove::<Failure>() else {
        return response;
    };

    let (status, body) = dispatcher.dispatch(&failure, &snapshot.into_info());

    let mut reply = (status, Json(body)).into_response();
    for (name, value) in response.headers() {
        if name != CONTENT_TYPE && name != CONTENT_LENGTH {
            reply.headers_mut().append(name.clone(), value.clone());
        }
    }

    reply
}

/// Panic handler for `CatchPanicLayer`, hands the panic to the dispatcher
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "handler panicked".to_string()
    };

    ApiError(Failure::Unclassified {
        name: Cow::Borrowed("panic"),
        error: Arc::new(anyhow::anyhow!(message)),
    })
    .into_response()
}
