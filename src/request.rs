//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

/// An incoming HTTP request with its body fully read and path parameters
/// resolved by the router.
pub struct Request {
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        path: String,
        headers: Vec<(String, String)>,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Self {
        Self { path, headers, body, params }
    }

    /// Collects the body of a hyper request. Header values that are not
    /// visible ASCII are skipped.
    pub(crate) async fn from_hyper<B>(
        req: http::Request<B>,
        params: HashMap<String, String>,
    ) -> Result<Self, B::Error>
    where
        B: http_body::Body<Data = Bytes>,
    {
        use http_body_util::BodyExt;

        let (parts, body) = req.into_parts();
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();
        let body = body.collect().await?.to_bytes();
        Ok(Self::new(parts.uri.path().to_owned(), headers, body, params))
    }

    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decodes the body as JSON. The content-type header is not consulted.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
