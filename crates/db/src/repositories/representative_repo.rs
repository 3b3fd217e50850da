//! Repository for the `representatives` table.

use repatlas_core::types::DbId;
use sqlx::PgPool;

use crate::models::representative::{CreateRepresentative, Representative};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, regions, contact_url, email, phone, portrait, webhook_url, \
                       color, territory, show_in_grid, created_at, updated_at";

/// Provides CRUD operations for representatives.
pub struct RepresentativeRepo;

impl RepresentativeRepo {
    /// List all representatives ordered by identifier.
    pub async fn list(pool: &PgPool) -> Result<Vec<Representative>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM representatives ORDER BY id");
        sqlx::query_as::<_, Representative>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find a representative by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Representative>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM representatives WHERE id = $1");
        sqlx::query_as::<_, Representative>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new representative, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRepresentative,
    ) -> Result<Representative, sqlx::Error> {
        let query = format!(
            "INSERT INTO representatives
                (name, regions, contact_url, email, phone, portrait, webhook_url,
                 color, territory, show_in_grid)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Representative>(&query)
            .bind(&input.name)
            .bind(&input.regions)
            .bind(&input.contact_url)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.portrait)
            .bind(&input.webhook_url)
            .bind(&input.color)
            .bind(&input.territory)
            .bind(input.show_in_grid)
            .fetch_one(pool)
            .await
    }

    /// Fully replace a representative's mutable fields.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &CreateRepresentative,
    ) -> Result<Option<Representative>, sqlx::Error> {
        let query = format!(
            "UPDATE representatives SET
                name = $2, regions = $3, contact_url = $4, email = $5, phone = $6,
                portrait = $7, webhook_url = $8, color = $9, territory = $10,
                show_in_grid = $11, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Representative>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.regions)
            .bind(&input.contact_url)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.portrait)
            .bind(&input.webhook_url)
            .bind(&input.color)
            .bind(&input.territory)
            .bind(input.show_in_grid)
            .fetch_optional(pool)
            .await
    }

    /// Delete a representative, echoing back the deleted row.
    /// Returns `None` if no row with the given `id` exists.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Representative>, sqlx::Error> {
        let query = format!("DELETE FROM representatives WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Representative>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Destructively replace the entire collection with the given seed set.
    pub async fn reset(
        pool: &PgPool,
        seed: &[CreateRepresentative],
    ) -> Result<Vec<Representative>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM representatives")
            .execute(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO representatives
                (name, regions, contact_url, email, phone, portrait, webhook_url,
                 color, territory, show_in_grid)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );

        let mut inserted = Vec::with_capacity(seed.len());
        for rep in seed {
            let row = sqlx::query_as::<_, Representative>(&insert)
                .bind(&rep.name)
                .bind(&rep.regions)
                .bind(&rep.contact_url)
                .bind(&rep.email)
                .bind(&rep.phone)
                .bind(&rep.portrait)
                .bind(&rep.webhook_url)
                .bind(&rep.color)
                .bind(&rep.territory)
                .bind(rep.show_in_grid)
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
