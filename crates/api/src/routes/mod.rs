pub mod categories;
pub mod changes;
pub mod events;
pub mod health;
pub mod representatives;

use axum::routing::get;
use axum::Router;
use serde::Serialize;

use repatlas_core::change::{ChangeEvent, ChangeKind};

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /changes                                WebSocket change feed
///
/// /representatives                        list, create (admin)
/// /representatives/coverage               region -> representatives index
/// /representatives/reset                  restore defaults (admin, POST)
/// /representatives/{id}                   get, update, delete (admin)
///
/// /events                                 published list, create (admin)
/// /events/all                             full list incl. drafts (admin)
/// /events/search                          substring search (drafts admin-only)
/// /events/signup-counts                   signup count + spots left per event
/// /events/signups                         all signups (admin)
/// /events/{id}                            get, update, delete (admin)
/// /events/{id}/signups                    list (admin), sign up (POST, public)
/// /events/{id}/signups/export             CSV download (admin)
/// /events/{id}/signups/{signup_id}        delete (admin)
///
/// /categories                             list, create (admin)
/// /categories/{id}                        update, delete (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket change feed.
        .route("/changes", get(changes::changes_handler))
        // Representative roster and coverage index.
        .nest("/representatives", representatives::router())
        // Events, signups, and CSV export.
        .nest("/events", events::router())
        // Admin-managed event category vocabulary.
        .nest("/categories", categories::router())
}

/// Publish a row-level change on the bus. Serialization failures are logged
/// and dropped; a change notification is never worth failing the mutation
/// that already committed.
pub(crate) fn publish_row<T: Serialize>(
    state: &AppState,
    collection: &str,
    kind: ChangeKind,
    row: &T,
) {
    match serde_json::to_value(row) {
        Ok(value) => state
            .change_bus
            .publish(ChangeEvent::new(collection, kind, value)),
        Err(err) => {
            tracing::warn!(collection, error = %err, "Failed to serialize change payload");
        }
    }
}
