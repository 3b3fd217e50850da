//! Allow-list based admin extractor for Axum handlers.
//!
//! Admin access is binary: an email is either on the `admin_users` allow-list
//! or it is not. There are no roles or permission levels. The same extractor
//! guards every admin surface, so representative management and event
//! management cannot drift apart in how they authenticate.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use repatlas_core::error::CoreError;
use repatlas_db::repositories::AdminUserRepo;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the caller's asserted admin email.
pub const ADMIN_EMAIL_HEADER: &str = "x-admin-email";

/// Verified admin identity extracted from the `x-admin-email` header.
///
/// Use this as an extractor parameter in any handler that requires admin
/// access:
///
/// ```ignore
/// async fn my_handler(admin: AdminIdentity) -> AppResult<Json<()>> {
///     tracing::info!(email = %admin.email, "handling admin request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    /// The verified admin email, lowercased.
    pub email: String,
}

impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(ADMIN_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing x-admin-email header".into(),
                ))
            })?;

        let is_admin = AdminUserRepo::is_admin(&state.pool, &email).await?;
        if !is_admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Not an authorized admin".into(),
            )));
        }

        Ok(AdminIdentity { email })
    }
}

/// `Option<AdminIdentity>` for routes that are public but grant admins extra
/// reach (e.g. searching draft events). No header means an anonymous caller;
/// a header that fails verification is still rejected.
impl OptionalFromRequestParts<AppState> for AdminIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(ADMIN_EMAIL_HEADER) {
            return Ok(None);
        }
        <Self as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}
