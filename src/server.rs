//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Stops calling `listener.accept()`, so no new connections are made.
//! 2. Asks every open connection to finish its in-flight request and close
//!    (keep-alive connections are told to stop after the current exchange).
//! 3. Waits up to the grace period (5 s by default) for that to happen, then
//!    aborts whatever is left. For HTTP/1 the handler future runs inside the
//!    connection task, so aborting it also cancels the database statement
//!    it was awaiting. HTTP/2 streams run on their own executor tasks; those
//!    are only cancelled when the client resets the stream or the runtime
//!    shuts down.
//! 4. Returns from [`Server::serve`], so `main` can close the pool and exit.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Route, Router};
use crate::status::Status;

/// Default time in-flight connections get to finish after a shutdown signal.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Default limit for a client to send the full HTTP/1 request head.
pub const DEFAULT_HEADER_READ_TIMEOUT: Duration = Duration::from_secs(30);

enum Bind {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// The HTTP server.
pub struct Server {
    bind: Bind,
    grace_period: Duration,
    header_read_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use users_api::Server;
    /// let server = Server::bind(([0, 0, 0, 0], 8888).into());
    /// ```
    pub fn bind(addr: SocketAddr) -> Self {
        Self::with_bind(Bind::Addr(addr))
    }

    /// Serves on an already-bound listener. Useful with port `0`, where the
    /// caller needs the chosen address before the server starts.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self::with_bind(Bind::Listener(listener))
    }

    fn with_bind(bind: Bind) -> Self {
        Self {
            bind,
            grace_period: DEFAULT_GRACE_PERIOD,
            header_read_timeout: DEFAULT_HEADER_READ_TIMEOUT,
        }
    }

    /// How long open connections may keep running after shutdown begins.
    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// How long an HTTP/1 client may take to send its request head.
    pub fn header_read_timeout(mut self, timeout: Duration) -> Self {
        self.header_read_timeout = timeout;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a graceful shutdown triggered by SIGTERM or Ctrl-C.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but shuts down when `signal` resolves
    /// instead of on an OS signal.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr).await?,
            Bind::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;

        let router = Arc::new(router);

        let mut builder = ConnBuilder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.header_read_timeout);

        let graceful = GracefulShutdown::new();
        let mut tasks = JoinSet::new();

        info!(%addr, "users-api listening");

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting immediately,
                // even if more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { Ok::<_, Infallible>(dispatch(&router, req).await) }
                    });

                    let conn = builder.serve_connection(TokioIo::new(stream), svc).into_owned();
                    let conn = graceful.watch(conn);

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(%peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);

        if tokio::time::timeout(self.grace_period, graceful.shutdown()).await.is_err() {
            warn!(
                remaining = tasks.len(),
                grace_secs = self.grace_period.as_secs_f64(),
                "grace period elapsed, aborting open connections"
            );
            tasks.abort_all();
        }
        while tasks.join_next().await.is_some() {}

        info!("users-api stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request, produces one response, and logs the exchange.
async fn dispatch(router: &Router, req: hyper::Request<Incoming>) -> http::Response<Full<Bytes>> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = route(router, req).await;

    info!(
        %method,
        %path,
        status = response.status_code().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    response.into_inner()
}

async fn route(router: &Router, req: hyper::Request<Incoming>) -> Response {
    let Ok(method) = Method::try_from(req.method()) else {
        return Response::status(Status::MethodNotAllowed);
    };

    match router.lookup(method, req.uri().path()) {
        Route::Found(handler, params) => match Request::from_hyper(req, params).await {
            Ok(req) if method == Method::Head => {
                let mut res = handler.call(req).await;
                res.body = Bytes::new();
                res
            }
            Ok(req) => handler.call(req).await,
            Err(e) => Response::builder()
                .status(Status::BadRequest)
                .text(format!("failed to read request body: {e}")),
        },
        Route::MethodNotAllowed => Response::status(Status::MethodNotAllowed),
        Route::NotFound => Response::status(Status::NotFound),
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On Windows only Ctrl-C
/// is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => info!("received SIGINT"),
        () = sigterm => info!("received SIGTERM"),
    }
}
