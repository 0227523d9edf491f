use axum::extract::Request;
use keel_core::{AppError, Environment, ErrorCode};

use crate::reply::ApiError;

/// Fallback for unknown routes and unsupported methods
pub async fn not_found(environment: Environment, request: Request) -> ApiError {
    if environment.is_production() {
        return AppError::untraced(ErrorCode::NOT_FOUND).into();
    }

    tracing::warn!(
        method = %request.method(),
        uri = %request.uri(),
        "route {}:{} not found",
        request.method(),
        request.uri().path()
    );

    AppError::not_found().into()
}
