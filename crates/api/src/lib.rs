//! repatlas API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes, the
//! change bus, and the WebSocket change feed) so integration tests and the
//! binary entrypoint can both access them.

pub mod bus;
pub mod config;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
