//! Handler trait and type erasure.
//!
//! The router stores handlers of different concrete types in one map, so
//! each one is boxed behind `dyn ErasedHandler`:
//!
//! ```text
//! async fn read_user(req: Request) -> Response { … }
//!        ↓ router.on(Method::Get, "/users/{id}", read_user)
//! read_user.into_boxed_handler()                   ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(read_user))                   ← stored as BoxedHandler
//!        ↓
//! handler.call(req)  at request time               ← one vtable dispatch
//! ```
//!
//! Handlers that need shared state (a gateway, a pool) are built with
//! [`with_state`], which clones the state into every call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Automatically satisfied for any `async fn` (or closure returning a
/// future) with the shape:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── State binding ─────────────────────────────────────────────────────────────

/// Binds `state` to a two-argument handler function.
///
/// The state is cloned once per request, so wrap anything expensive in an
/// [`Arc`].
///
/// ```rust
/// use std::sync::Arc;
/// use users_api::{Method, Request, Response, Router, with_state};
///
/// struct Greeter { greeting: String }
///
/// async fn greet(g: Arc<Greeter>, req: Request) -> Response {
///     Response::text(format!("{} {}", g.greeting, req.param("name").unwrap_or("you")))
/// }
///
/// let greeter = Arc::new(Greeter { greeting: "hi".to_owned() });
/// let app = Router::new().on(Method::Get, "/hello/{name}", with_state(greeter, greet));
/// ```
pub fn with_state<S, F, Fut, R>(state: S, f: F) -> impl Handler
where
    S: Clone + Send + Sync + 'static,
    F: Fn(S, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    move |req: Request| f(state.clone(), req)
}
