//! Event entity model and DTOs.

use chrono::{NaiveDate, NaiveTime};
use repatlas_core::error::CoreError;
use repatlas_core::signup_policy::EventGate;
use repatlas_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Event lifecycle status. Draft events are never shown to public-facing
/// views regardless of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
}

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub location: Option<String>,
    /// Category slug; references the open category vocabulary by value,
    /// not by foreign key, so a deleted category leaves this as free text.
    pub category: String,
    /// Soft capacity bound; `None` means unlimited.
    pub capacity: Option<i32>,
    pub signup_enabled: bool,
    pub status: EventStatus,
    /// Comma-separated signup-notification recipients; empty/absent = no-op.
    pub notification_emails: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    /// The slice of this event that signup eligibility depends on.
    pub fn gate(&self) -> EventGate {
        EventGate {
            published: self.status == EventStatus::Published,
            signup_enabled: self.signup_enabled,
            capacity: self.capacity,
            date: self.event_date,
        }
    }

    /// Parse the comma-separated recipient list, dropping blanks.
    pub fn notification_recipients(&self) -> Vec<String> {
        self.notification_emails
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// DTO for creating an event. Updates are full-replace, so the update DTO
/// is the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub event_time: Option<NaiveTime>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub capacity: Option<i32>,
    #[serde(default = "default_signup_enabled")]
    pub signup_enabled: bool,
    #[serde(default = "default_status")]
    pub status: EventStatus,
    #[serde(default)]
    pub notification_emails: Option<String>,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_signup_enabled() -> bool {
    true
}

fn default_status() -> EventStatus {
    EventStatus::Draft
}

impl CreateEvent {
    /// Validate required fields before any query is dispatched.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Event title is required".into()));
        }
        if let Some(capacity) = self.capacity {
            if capacity <= 0 {
                return Err(CoreError::Validation(
                    "Capacity must be a positive integer".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn valid() -> CreateEvent {
        serde_json::from_value(serde_json::json!({
            "title": "Install Training",
            "eventDate": "2026-06-01"
        }))
        .unwrap()
    }

    #[test]
    fn defaults_apply_on_deserialization() {
        let event = valid();
        assert_eq!(event.category, "general");
        assert!(event.signup_enabled);
        assert_eq!(event.status, EventStatus::Draft);
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut event = valid();
        event.title = " ".into();
        assert_matches!(event.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_positive_capacity_is_rejected() {
        let mut event = valid();
        event.capacity = Some(0);
        assert_matches!(event.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn missing_date_fails_to_deserialize() {
        let result: Result<CreateEvent, _> =
            serde_json::from_value(serde_json::json!({ "title": "No date" }));
        assert!(result.is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EventStatus::Published).unwrap(),
            "\"published\""
        );
    }

    #[test]
    fn recipients_parse_and_skip_blanks() {
        let mut event_json = serde_json::to_value(valid()).unwrap();
        event_json["id"] = 1.into();
        event_json["createdAt"] = "2026-01-01T00:00:00Z".into();
        event_json["updatedAt"] = "2026-01-01T00:00:00Z".into();
        let mut event: Event = serde_json::from_value(event_json).unwrap();

        event.notification_emails = Some("a@x.com, , b@x.com".into());
        assert_eq!(event.notification_recipients(), ["a@x.com", "b@x.com"]);

        event.notification_emails = None;
        assert!(event.notification_recipients().is_empty());
    }
}
