//! Routes and handlers for the `/categories` resource.
//!
//! Categories are an admin-managed vocabulary; events reference the slug by
//! value, so deleting a category never touches existing events. An empty
//! table falls back to the bundled default vocabulary so the public filter
//! bar is never blank.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use repatlas_core::change::ChangeKind;
use repatlas_core::error::CoreError;
use repatlas_core::types::DbId;
use repatlas_db::models::{CreateCategory, EventCategory};
use repatlas_db::repositories::CategoryRepo;
use repatlas_db::seed;

use crate::error::{AppError, AppResult};
use crate::middleware::admin::AdminIdentity;
use crate::response::DataResponse;
use crate::routes::publish_row;
use crate::state::AppState;

const COLLECTION: &str = "event_categories";

/// GET /api/v1/categories
///
/// When no categories have been created yet, serves the bundled defaults
/// (with synthetic ids) instead of an empty list.
async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<EventCategory>>>> {
    let mut categories = CategoryRepo::list(&state.pool).await?;
    if categories.is_empty() {
        categories = seed::default_categories()
            .into_iter()
            .enumerate()
            .map(|(index, c)| EventCategory {
                id: (index + 1) as DbId,
                slug: c.slug,
                label: c.label,
                sort_order: c.sort_order,
            })
            .collect();
    }
    Ok(Json(DataResponse::new(categories)))
}

/// POST /api/v1/categories
async fn create(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<EventCategory>>)> {
    input.validate()?;
    let category = CategoryRepo::create(&state.pool, &input).await?;
    publish_row(&state, COLLECTION, ChangeKind::Insert, &category);
    Ok((StatusCode::CREATED, Json(DataResponse::new(category))))
}

/// PUT /api/v1/categories/{id}
async fn update(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateCategory>,
) -> AppResult<Json<DataResponse<EventCategory>>> {
    input.validate()?;
    let category = CategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))?;
    publish_row(&state, COLLECTION, ChangeKind::Update, &category);
    Ok(Json(DataResponse::new(category)))
}

/// DELETE /api/v1/categories/{id}
///
/// Events carrying the slug keep it; only the vocabulary entry goes away.
async fn delete(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = CategoryRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }));
    }
    state
        .change_bus
        .publish(repatlas_core::change::ChangeEvent::refresh(COLLECTION));
    Ok(StatusCode::NO_CONTENT)
}

/// Routes mounted at `/categories`.
///
/// ```text
/// GET    /       -> list
/// POST   /       -> create (admin)
/// PUT    /{id}   -> update (admin)
/// DELETE /{id}   -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", axum::routing::put(update).delete(delete))
}
