//! Event category model and DTO.
//!
//! Events reference a category by slug value, not by foreign key: deleting
//! a category does not cascade, and referencing events keep the orphaned
//! slug as free text.

use repatlas_core::error::CoreError;
use repatlas_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `event_categories` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCategory {
    pub id: DbId,
    /// Machine-readable slug, unique.
    pub slug: String,
    /// Human-readable label.
    pub label: String,
    pub sort_order: i32,
}

/// DTO for creating or fully replacing a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    pub slug: String,
    pub label: String,
    #[serde(default)]
    pub sort_order: i32,
}

impl CreateCategory {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.slug.trim().is_empty() {
            return Err(CoreError::Validation("Category slug is required".into()));
        }
        if self.label.trim().is_empty() {
            return Err(CoreError::Validation("Category label is required".into()));
        }
        Ok(())
    }
}
