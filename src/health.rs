//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can the database be reached? |

use std::sync::Arc;

use tracing::warn;

use crate::gateway::Gateway;
use crate::handler::with_state;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// Registers `/healthz` and `/readyz` on `router`.
pub fn routes(gateway: Arc<Gateway>, router: Router) -> Router {
    router
        .on(Method::Get, "/healthz", liveness)
        .on(Method::Get, "/readyz", with_state(gateway, readiness))
}

/// Liveness probe. Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// Readiness probe. `200 OK` with `"ready"` when the pool answers a
/// trivial query, `503 Service Unavailable` with the error text otherwise.
pub async fn readiness(gateway: Arc<Gateway>, _req: Request) -> Response {
    match gateway.ping().await {
        Ok(()) => Response::text("ready"),
        Err(e) => {
            warn!("readiness check failed: {e}");
            Response::builder()
                .status(Status::ServiceUnavailable)
                .text(e.to_string())
        }
    }
}
