//! Domain error taxonomy.
//!
//! Every variant is a caller-visible outcome: a row addressed by an absent
//! id, input rejected before dispatch, a duplicate signup, a failed
//! authorization check. Transport and availability failures are not domain
//! errors — they belong to the layer that can recover from them (the sync
//! crate's fallback chain, the api crate's sqlx classification).

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The addressed row does not exist. `entity` is the user-facing noun
    /// ("Event", "Representative", "Signup", "Category").
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: DbId },

    /// Input rejected before any query was dispatched: blank names, empty
    /// region sets, malformed signup emails, non-positive capacities.
    #[error("{0}")]
    Validation(String),

    /// The operation collides with existing state, e.g. a duplicate signup
    /// or an already-taken category slug.
    #[error("{0}")]
    Conflict(String),

    /// No admin identity was presented.
    #[error("{0}")]
    Unauthorized(String),

    /// An identity was presented but is not on the allow-list.
    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
