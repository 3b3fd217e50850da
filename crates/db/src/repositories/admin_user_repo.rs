//! Repository for the `admin_users` allow-list table.

use sqlx::PgPool;

/// Provides the allow-list membership check.
pub struct AdminUserRepo;

impl AdminUserRepo {
    /// Whether `email` is on the admin allow-list. Case-insensitive;
    /// addresses are stored lowercase.
    pub async fn is_admin(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM admin_users WHERE email = LOWER($1)")
                .bind(email.trim())
                .fetch_optional(pool)
                .await?;
        Ok(row.is_some())
    }
}
