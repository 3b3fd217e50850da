use std::sync::Arc;

use crate::bus::ChangeBus;
use crate::config::ServerConfig;
use crate::notify::SignupNotifier;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: repatlas_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Change bus feeding the `/changes` WebSocket.
    pub change_bus: Arc<ChangeBus>,
    /// Signup email notifier. `None` when SMTP is not configured.
    pub notifier: Option<Arc<SignupNotifier>>,
}
