//! Admin allow-list model. Membership is binary access control for the
//! admin surfaces; there is no role hierarchy.

use repatlas_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `admin_users` table. Emails are stored lowercase.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: DbId,
    pub email: String,
    pub created_at: Timestamp,
}
