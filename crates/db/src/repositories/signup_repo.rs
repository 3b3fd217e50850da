//! Repository for the `event_signups` table.
//!
//! The (event_id, email) unique constraint `uq_event_signups_event_email`
//! is the only atomically enforced signup invariant; capacity is advisory
//! and checked above this layer.

use repatlas_core::types::DbId;
use sqlx::PgPool;

use crate::models::signup::{CreateSignup, Signup};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, event_id, first_name, last_name, email, phone, signed_up_at";

/// Name of the (event_id, email) unique constraint, used by callers to
/// recognize duplicate-signup conflicts.
pub const UQ_EVENT_EMAIL: &str = "uq_event_signups_event_email";

/// Provides operations for event signups.
pub struct SignupRepo;

impl SignupRepo {
    /// List signups for one event, most recent first.
    pub async fn list_for_event(pool: &PgPool, event_id: DbId) -> Result<Vec<Signup>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM event_signups WHERE event_id = $1 ORDER BY signed_up_at DESC"
        );
        sqlx::query_as::<_, Signup>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// List all signups across events, most recent first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Signup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM event_signups ORDER BY signed_up_at DESC");
        sqlx::query_as::<_, Signup>(&query).fetch_all(pool).await
    }

    /// Insert a signup for an event, returning the created row.
    ///
    /// A duplicate (event, email) surfaces as a database error carrying the
    /// [`UQ_EVENT_EMAIL`] constraint name.
    pub async fn create(
        pool: &PgPool,
        event_id: DbId,
        input: &CreateSignup,
    ) -> Result<Signup, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_signups (event_id, first_name, last_name, email, phone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Signup>(&query)
            .bind(event_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .fetch_one(pool)
            .await
    }

    /// Delete a signup, echoing back the deleted row.
    /// Returns `None` if no row with the given `id` exists.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Signup>, sqlx::Error> {
        let query = format!("DELETE FROM event_signups WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Signup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Number of signups for one event.
    pub async fn count_for_event(pool: &PgPool, event_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_signups WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Signup counts for every event that has at least one signup.
    pub async fn counts_by_event(pool: &PgPool) -> Result<Vec<(DbId, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT event_id, COUNT(*) FROM event_signups GROUP BY event_id ORDER BY event_id",
        )
        .fetch_all(pool)
        .await
    }
}

/// Whether a sqlx error is the duplicate-signup unique violation.
pub fn is_duplicate_signup(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some(UQ_EVENT_EMAIL)
        }
        _ => false,
    }
}
