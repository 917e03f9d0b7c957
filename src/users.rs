//! Users API handlers.
//!
//! ```text
//! POST   /users       {"name":"alice"}  → 200 {"user":{"id":"…","name":"alice"}}
//! GET    /users/{id}                    → 200 {"user":{"id":"…","name":"alice"}}
//! PUT    /users/{id}  {"name":"bob"}    → 200
//! DELETE /users/{id}                    → 200
//! ```
//!
//! Failures are reported as plain text carrying the error message: 400 for
//! an undecodable body, 500 when create fails, 404 when read, update, or
//! delete fails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::gateway::{
    CreateUserInput, DeleteUserInput, Gateway, GatewayError, ReadUserInput, UpdateUserInput,
};
use crate::handler::with_state;
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::status::Status;
use crate::user::User;

/// Body of `POST /users` and `PUT /users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub name: String,
}

/// Body returned by create and read.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub user: User,
}

/// Translates HTTP requests into gateway calls and back.
pub struct UserHandler {
    gateway: Gateway,
}

impl UserHandler {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Registers the four user routes on `router`.
    pub fn routes(self: Arc<Self>, router: Router) -> Router {
        router
            .on(Method::Post, "/users", with_state(Arc::clone(&self), |h: Arc<Self>, req| async move {
                h.create_user(req).await
            }))
            .on(Method::Get, "/users/{id}", with_state(Arc::clone(&self), |h: Arc<Self>, req| async move {
                h.read_user(req).await
            }))
            .on(Method::Put, "/users/{id}", with_state(Arc::clone(&self), |h: Arc<Self>, req| async move {
                h.update_user(req).await
            }))
            .on(Method::Delete, "/users/{id}", with_state(self, |h: Arc<Self>, req| async move {
                h.delete_user(req).await
            }))
    }

    pub async fn create_user(&self, req: Request) -> Response {
        let body: UserRequest = match req.json() {
            Ok(body) => body,
            Err(e) => return failure(Status::BadRequest, e),
        };

        match self.gateway.create_user(CreateUserInput { name: body.name }).await {
            Ok(out) => Json(UserResponse { user: out.user }).into_response(),
            Err(e) => {
                error!("{e}");
                failure(Status::InternalServerError, e)
            }
        }
    }

    pub async fn read_user(&self, req: Request) -> Response {
        let id = path_id(&req);

        match self.gateway.read_user(ReadUserInput { id }).await {
            Ok(out) => Json(UserResponse { user: out.user }).into_response(),
            Err(e) => gateway_failure(e),
        }
    }

    pub async fn update_user(&self, req: Request) -> Response {
        let id = path_id(&req);

        let body: UserRequest = match req.json() {
            Ok(body) => body,
            Err(e) => return failure(Status::BadRequest, e),
        };

        match self.gateway.update_user(UpdateUserInput { id, name: body.name }).await {
            Ok(_) => Response::status(Status::Ok),
            Err(e) => gateway_failure(e),
        }
    }

    pub async fn delete_user(&self, req: Request) -> Response {
        let id = path_id(&req);

        match self.gateway.delete_user(DeleteUserInput { id }).await {
            Ok(_) => Response::status(Status::Ok),
            Err(e) => gateway_failure(e),
        }
    }
}

/// The router only dispatches here when `{id}` matched, so it is always set.
fn path_id(req: &Request) -> String {
    req.param("id").unwrap_or_default().to_owned()
}

/// Read, update, and delete surface every gateway error as 404. Anything
/// other than a plain miss is still logged.
fn gateway_failure(e: GatewayError) -> Response {
    if !e.is_not_found() {
        error!("{e}");
    }
    failure(Status::NotFound, e)
}

fn failure(status: Status, e: impl std::fmt::Display) -> Response {
    Response::builder().status(status).text(e.to_string())
}
