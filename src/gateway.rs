//! User gateway: the only code that talks SQL.
//!
//! One statement per operation, bound with positional (`$n`) parameters.
//! Every operation is a plain future; dropping it cancels the statement it
//! is waiting on. On HTTP/1 that happens when the client disconnects or a
//! shutdown outlives its grace period.

use sqlx::AnyPool;
use tracing::debug;
use uuid::Uuid;

use crate::user::User;

/// Gateway failure, tagged with the operation that failed.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to create user: {0}")]
    Create(#[source] sqlx::Error),

    #[error("failed to read user: {0}")]
    Read(#[source] sqlx::Error),

    #[error("failed to update user: {0}")]
    Update(#[source] sqlx::Error),

    #[error("failed to delete user: {0}")]
    Delete(#[source] sqlx::Error),

    /// No row has the given id. Returned by read, and by update/delete when
    /// the statement touched zero rows.
    #[error("user not found: {id}")]
    NotFound { id: String },

    #[error("database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub struct CreateUserInput {
    pub name: String,
}

#[derive(Debug)]
pub struct CreateUserOutput {
    pub user: User,
}

pub struct ReadUserInput {
    pub id: String,
}

#[derive(Debug)]
pub struct ReadUserOutput {
    pub user: User,
}

pub struct UpdateUserInput {
    pub id: String,
    pub name: String,
}

#[derive(Debug)]
pub struct UpdateUserOutput;

pub struct DeleteUserInput {
    pub id: String,
}

#[derive(Debug)]
pub struct DeleteUserOutput;

/// Data-access gateway for the `users` table.
///
/// Cheap to clone: the pool is a shared handle.
#[derive(Clone)]
pub struct Gateway {
    pool: AnyPool,
}

impl Gateway {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Insert a user under a freshly generated UUID v4.
    ///
    /// Returns the record as constructed here; the row is not read back.
    pub async fn create_user(&self, input: CreateUserInput) -> Result<CreateUserOutput, GatewayError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO users (id, name) VALUES ($1, $2)")
            .bind(&id)
            .bind(&input.name)
            .execute(&self.pool)
            .await
            .map_err(GatewayError::Create)?;

        debug!(%id, "user created");

        Ok(CreateUserOutput {
            user: User { id, name: input.name },
        })
    }

    pub async fn read_user(&self, input: ReadUserInput) -> Result<ReadUserOutput, GatewayError> {
        let user = sqlx::query_as::<_, User>("SELECT id, name FROM users WHERE id = $1")
            .bind(&input.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(GatewayError::Read)?
            .ok_or_else(|| GatewayError::NotFound { id: input.id.clone() })?;

        Ok(ReadUserOutput { user })
    }

    /// Replace the user's name. Fails with [`GatewayError::NotFound`] when
    /// no row matched `id`.
    pub async fn update_user(&self, input: UpdateUserInput) -> Result<UpdateUserOutput, GatewayError> {
        let result = sqlx::query(
            "UPDATE users SET name = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(&input.name)
        .bind(&input.id)
        .execute(&self.pool)
        .await
        .map_err(GatewayError::Update)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound { id: input.id });
        }

        debug!(id = %input.id, "user updated");
        Ok(UpdateUserOutput)
    }

    /// Remove the user permanently. Fails with [`GatewayError::NotFound`]
    /// when no row matched `id`.
    pub async fn delete_user(&self, input: DeleteUserInput) -> Result<DeleteUserOutput, GatewayError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(&input.id)
            .execute(&self.pool)
            .await
            .map_err(GatewayError::Delete)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound { id: input.id });
        }

        debug!(id = %input.id, "user deleted");
        Ok(DeleteUserOutput)
    }

    /// Round-trip a trivial statement; used by the readiness probe.
    pub async fn ping(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(GatewayError::Unavailable)?;
        Ok(())
    }
}
