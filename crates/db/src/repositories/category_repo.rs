//! Repository for the `event_categories` table.

use repatlas_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::{CreateCategory, EventCategory};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, slug, label, sort_order";

/// Provides CRUD operations for the admin-managed category vocabulary.
pub struct CategoryRepo;

impl CategoryRepo {
    /// List categories by sort order.
    pub async fn list(pool: &PgPool) -> Result<Vec<EventCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM event_categories ORDER BY sort_order ASC, id ASC");
        sqlx::query_as::<_, EventCategory>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert a category, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCategory) -> Result<EventCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_categories (slug, label, sort_order)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventCategory>(&query)
            .bind(&input.slug)
            .bind(&input.label)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    /// Fully replace a category. Returns `None` if the id is absent.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &CreateCategory,
    ) -> Result<Option<EventCategory>, sqlx::Error> {
        let query = format!(
            "UPDATE event_categories SET slug = $2, label = $3, sort_order = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventCategory>(&query)
            .bind(id)
            .bind(&input.slug)
            .bind(&input.label)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    /// Delete a category. Non-cascading: events referencing the slug keep
    /// it as free text. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM event_categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
