//! Repository for the `events` table.

use repatlas_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::{CreateEvent, Event, EventStatus};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, cover_image, event_date, event_time, location, \
                       category, capacity, signup_enabled, status, notification_emails, \
                       created_at, updated_at";

/// Provides CRUD and search operations for events.
pub struct EventRepo;

impl EventRepo {
    /// List all events ordered by date ascending (admin view).
    pub async fn list(pool: &PgPool) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events ORDER BY event_date ASC, id ASC");
        sqlx::query_as::<_, Event>(&query).fetch_all(pool).await
    }

    /// List published events ordered by date ascending (public view).
    /// Draft events never appear here regardless of date.
    pub async fn list_published(pool: &PgPool) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events WHERE status = $1 ORDER BY event_date ASC, id ASC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(EventStatus::Published)
            .fetch_all(pool)
            .await
    }

    /// Find an event by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive substring search over title and description.
    ///
    /// When `published_only` is true, results are additionally filtered to
    /// published events. No match is an empty vec, not an error.
    pub async fn search(
        pool: &PgPool,
        query_text: &str,
        published_only: bool,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let pattern = format!("%{query_text}%");
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE (title ILIKE $1 OR description ILIKE $1)
               AND ($2 = FALSE OR status = $3)
             ORDER BY event_date ASC, id ASC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(&pattern)
            .bind(published_only)
            .bind(EventStatus::Published)
            .fetch_all(pool)
            .await
    }

    /// Insert a new event, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateEvent) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events
                (title, description, cover_image, event_date, event_time, location,
                 category, capacity, signup_enabled, status, notification_emails)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.cover_image)
            .bind(input.event_date)
            .bind(input.event_time)
            .bind(&input.location)
            .bind(&input.category)
            .bind(input.capacity)
            .bind(input.signup_enabled)
            .bind(input.status)
            .bind(&input.notification_emails)
            .fetch_one(pool)
            .await
    }

    /// Fully replace an event's mutable fields.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &CreateEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET
                title = $2, description = $3, cover_image = $4, event_date = $5,
                event_time = $6, location = $7, category = $8, capacity = $9,
                signup_enabled = $10, status = $11, notification_emails = $12,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.cover_image)
            .bind(input.event_date)
            .bind(input.event_time)
            .bind(&input.location)
            .bind(&input.category)
            .bind(input.capacity)
            .bind(input.signup_enabled)
            .bind(input.status)
            .bind(&input.notification_emails)
            .fetch_optional(pool)
            .await
    }

    /// Delete an event, echoing back the deleted row.
    /// Returns `None` if no row with the given `id` exists.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("DELETE FROM events WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
