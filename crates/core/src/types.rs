//! Primitive aliases shared by every layer of the workspace.

/// Row identifier for all entity collections.
///
/// Server-assigned ids come from Postgres BIGSERIAL sequences; rows created
/// offline by the sync client carry millisecond-clock ids, far above any
/// realistic sequence value, so the two ranges never collide.
pub type DbId = i64;

/// Instant in UTC. RFC 3339 on the wire, `timestamptz` in Postgres.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
