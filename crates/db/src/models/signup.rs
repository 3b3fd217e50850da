//! Event signup model and DTO. Signups are created by the public form,
//! deleted by admins, and never mutated.

use repatlas_core::csv_export::SignupRow;
use repatlas_core::error::CoreError;
use repatlas_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `event_signups` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    pub id: DbId,
    pub event_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub signed_up_at: Timestamp,
}

impl Signup {
    /// Render for CSV export.
    pub fn to_csv_row(&self) -> SignupRow {
        SignupRow {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone().unwrap_or_default(),
            signed_up_at: self.signed_up_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }
}

/// DTO for the public signup form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSignup {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CreateSignup {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(CoreError::Validation("First and last name are required".into()));
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(CoreError::Validation("A valid email address is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn csv_row_uses_empty_string_for_missing_phone() {
        let signup = Signup {
            id: 1,
            event_id: 2,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@x.com".into(),
            phone: None,
            signed_up_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let row = signup.to_csv_row();
        assert_eq!(row.phone, "");
        assert_eq!(row.signed_up_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn email_without_at_sign_is_rejected() {
        let input = CreateSignup {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "not-an-email".into(),
            phone: None,
        };
        assert!(input.validate().is_err());
    }
}
