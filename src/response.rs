//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. The server converts it
//! into a hyper response on the way out.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

use crate::status::Status;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use users_api::{Response, Status};
///
/// Response::json(br#"{"id":"1"}"#.to_vec());
/// Response::text("hello");
/// Response::status(Status::Ok);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use users_api::{Response, Status};
///
/// Response::builder()
///     .status(Status::BadRequest)
///     .header("x-reason", "decode")
///     .text("expected value at line 1 column 1");
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Bytes,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::bytes_raw(JSON, body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw(TEXT, body.into().into_bytes())
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Bytes::new(), headers: Vec::new(), status: code.into() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok.into() }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn bytes_raw(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            body: body.into(),
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            status: Status::Ok.into(),
        }
    }

    /// Converts into the hyper response the server writes to the wire.
    /// Headers whose name or value is not valid HTTP are dropped.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        let headers = res.headers_mut();
        for (name, value) in self.headers {
            match (
                http::HeaderName::try_from(name),
                http::HeaderValue::try_from(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::warn!("dropping invalid response header"),
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(JSON, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(TEXT, body.into().into_bytes())
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body: body.into(), headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

/// Return a [`Status`] directly from a handler: `return Status::NotFound`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

/// `200 OK` with `T` serialised by serde_json. A serialisation failure
/// becomes `500` with the error text.
///
/// ```rust
/// use users_api::{IntoResponse, Json};
///
/// #[derive(serde::Serialize)]
/// struct Pong { ok: bool }
///
/// let res = Json(Pong { ok: true }).into_response();
/// assert_eq!(res.body(), br#"{"ok":true}"#);
/// ```
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => Response::json(bytes),
            Err(e) => {
                tracing::error!("response serialisation failed: {e}");
                Response::builder()
                    .status(Status::InternalServerError)
                    .text(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_sets_content_type() {
        let res = Response::text("ok");
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("Content-Type"), Some(TEXT));
        assert_eq!(res.body(), b"ok");
    }

    #[test]
    fn builder_keeps_content_type_first() {
        let res = Response::builder()
            .status(Status::NotFound)
            .header("x-trace", "1")
            .text("missing");
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers[0].0, "content-type");
        assert_eq!(res.header("x-trace"), Some("1"));
    }

    #[test]
    fn status_has_empty_body() {
        let res = Status::MethodNotAllowed.into_response();
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(res.body().is_empty());
        assert_eq!(res.header("content-type"), None);
    }

    #[test]
    fn into_inner_copies_status_and_headers() {
        let inner = Response::builder()
            .status(Status::BadRequest)
            .header("bad header", "dropped")
            .json(b"{}".to_vec())
            .into_inner();
        assert_eq!(inner.status(), StatusCode::BAD_REQUEST);
        assert_eq!(inner.headers()["content-type"], JSON);
        assert_eq!(inner.headers().len(), 1);
    }
}
