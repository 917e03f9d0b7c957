//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use users_api::{Response, Status};
//!
//! // status-only, no body
//! Response::status(Status::Ok);
//!
//! // plain-text error, the way the users handlers report failures
//! Response::builder()
//!     .status(Status::NotFound)
//!     .text("user not found");
//! ```

/// The status codes this service emits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    NotFound,            // 404
    MethodNotAllowed,    // 405

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    ServiceUnavailable,  // 503
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        match s {
            Status::Ok                  => http::StatusCode::OK,
            Status::BadRequest          => http::StatusCode::BAD_REQUEST,
            Status::NotFound            => http::StatusCode::NOT_FOUND,
            Status::MethodNotAllowed    => http::StatusCode::METHOD_NOT_ALLOWED,
            Status::InternalServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
            Status::ServiceUnavailable  => http::StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
