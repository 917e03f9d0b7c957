//! The user record.

use serde::{Deserialize, Serialize};

/// A persisted user. `id` is assigned by the gateway at creation and never
/// changes; `name` is replaced wholesale by updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
}
