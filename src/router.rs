//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a path, you
//! get a handler.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;

/// Result of resolving a method + path pair.
pub(crate) enum Route {
    Found(BoxedHandler, HashMap<String, String>),
    /// The path exists, but under a different method.
    MethodNotAllowed,
    NotFound,
}

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use users_api::{Method, Request, Response, Router};
    /// # async fn read_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get,  "/users/{id}", read_user)
    ///     .on(Method::Post, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with an already registered
    /// route for the same method. Routes are static, so this is a startup bug.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    /// `HEAD` falls back to the `GET` route when no `HEAD` route matches.
    pub(crate) fn lookup(&self, method: Method, path: &str) -> Route {
        let matched = self.routes.get(&method)
            .and_then(|tree| tree.at(path).ok())
            .or_else(|| match method {
                Method::Head => self.routes.get(&Method::Get).and_then(|tree| tree.at(path).ok()),
                _ => None,
            });

        if let Some(matched) = matched {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Route::Found(Arc::clone(matched.value), params);
        }

        if self.routes.values().any(|tree| tree.at(path).is_ok()) {
            Route::MethodNotAllowed
        } else {
            Route::NotFound
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
