//! Representative entity model and DTOs.
//!
//! Rows are snake_case in Postgres; the wire shape (and everything above the
//! repository layer) is camelCase. The translation happens once, here, via
//! serde renames.

use repatlas_core::coverage::RepCard;
use repatlas_core::error::CoreError;
use repatlas_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `representatives` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Representative {
    pub id: DbId,
    /// Display name; may encode co-assigned individuals ("Pat & Trina Tuel").
    pub name: String,
    /// Region codes covered. Never empty for an active representative.
    pub regions: Vec<String>,
    pub contact_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub portrait: Option<String>,
    /// Per-representative lead-delivery webhook endpoint.
    pub webhook_url: Option<String>,
    pub color: Option<String>,
    /// Free-text territory label ("Mountain & SW Region").
    pub territory: Option<String>,
    pub show_in_grid: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Representative {
    /// Project into the lightweight shape the coverage index stores.
    pub fn to_card(&self) -> RepCard {
        RepCard {
            name: self.name.clone(),
            regions: self.regions.clone(),
            contact_url: self.contact_url.clone(),
            portrait: self.portrait.clone(),
        }
    }
}

/// DTO for creating a representative. Mutations are full-replace, so the
/// update DTO is the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepresentative {
    pub name: String,
    pub regions: Vec<String>,
    #[serde(default)]
    pub contact_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub portrait: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default = "default_show_in_grid")]
    pub show_in_grid: bool,
}

fn default_show_in_grid() -> bool {
    true
}

impl CreateRepresentative {
    /// Validate required fields before any query is dispatched.
    ///
    /// A representative must have a non-empty name and a non-empty region
    /// set; region codes themselves must be non-blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Representative name is required".into(),
            ));
        }
        if self.regions.is_empty() {
            return Err(CoreError::Validation(
                "At least one region code is required".into(),
            ));
        }
        if self.regions.iter().any(|r| r.trim().is_empty()) {
            return Err(CoreError::Validation(
                "Region codes must not be blank".into(),
            ));
        }
        Ok(())
    }
}
