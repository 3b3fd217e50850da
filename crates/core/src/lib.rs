//! Pure domain logic for the repatlas platform: shared types, the error
//! taxonomy, change-event types, collection fingerprinting, the coverage
//! index, signup eligibility, and CSV export. No I/O lives here.

pub mod change;
pub mod coverage;
pub mod csv_export;
pub mod error;
pub mod fingerprint;
pub mod signup_policy;
pub mod types;
