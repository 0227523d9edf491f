//! Error taxonomy and request-failure model shared by every Keel crate
//!
//! Nothing here depends on the HTTP framework; the server crate turns these
//! types into responses.

#![allow(clippy::must_use_candidate)]

mod code;
mod environment;
mod error;
mod failure;
mod request;
mod response;
pub mod sanitize;

pub use code::{ErrorCode, InvalidErrorCode};
pub use environment::{Environment, UnknownEnvironment};
pub use error::{AppError, Details};
pub use failure::{Failure, PathSegment, ValidationIssue};
pub use request::RequestInfo;
pub use response::ErrorResponse;
