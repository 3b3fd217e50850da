//! Routes and handlers for the `/representatives` resource.
//!
//! Reads are public (the map and contact grid need them); every mutation
//! requires the admin allow-list. Mutations publish the affected row on the
//! change bus.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use repatlas_core::change::ChangeKind;
use repatlas_core::coverage::CoverageIndex;
use repatlas_core::error::CoreError;
use repatlas_core::types::DbId;
use repatlas_db::models::{CreateRepresentative, Representative};
use repatlas_db::repositories::RepresentativeRepo;
use repatlas_db::seed;

use crate::error::{AppError, AppResult};
use crate::middleware::admin::AdminIdentity;
use crate::response::DataResponse;
use crate::routes::publish_row;
use crate::state::AppState;

const COLLECTION: &str = "representatives";

/// GET /api/v1/representatives
async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Representative>>>> {
    let reps = RepresentativeRepo::list(&state.pool).await?;
    Ok(Json(DataResponse::new(reps)))
}

/// GET /api/v1/representatives/coverage
///
/// Region code -> covering representatives, rebuilt from the roster on every
/// request. Only grid-visible representatives participate.
async fn coverage(State(state): State<AppState>) -> AppResult<Json<DataResponse<CoverageIndex>>> {
    let reps = RepresentativeRepo::list(&state.pool).await?;
    let index = CoverageIndex::build(
        reps.iter()
            .filter(|rep| rep.show_in_grid)
            .map(Representative::to_card),
    );
    Ok(Json(DataResponse::new(index)))
}

/// GET /api/v1/representatives/{id}
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Representative>>> {
    let rep = RepresentativeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Representative",
            id,
        }))?;
    Ok(Json(DataResponse::new(rep)))
}

/// POST /api/v1/representatives
async fn create(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Json(input): Json<CreateRepresentative>,
) -> AppResult<(StatusCode, Json<DataResponse<Representative>>)> {
    input.validate()?;
    let rep = RepresentativeRepo::create(&state.pool, &input).await?;
    publish_row(&state, COLLECTION, ChangeKind::Insert, &rep);
    Ok((StatusCode::CREATED, Json(DataResponse::new(rep))))
}

/// PUT /api/v1/representatives/{id}
async fn update(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateRepresentative>,
) -> AppResult<Json<DataResponse<Representative>>> {
    input.validate()?;
    let rep = RepresentativeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Representative",
            id,
        }))?;
    publish_row(&state, COLLECTION, ChangeKind::Update, &rep);
    Ok(Json(DataResponse::new(rep)))
}

/// DELETE /api/v1/representatives/{id}
async fn delete(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Representative>>> {
    let rep = RepresentativeRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Representative",
            id,
        }))?;
    publish_row(&state, COLLECTION, ChangeKind::Delete, &rep);
    Ok(Json(DataResponse::new(rep)))
}

/// POST /api/v1/representatives/reset
///
/// Destructively replaces the whole roster with the bundled default set.
async fn reset(
    _admin: AdminIdentity,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Representative>>>> {
    let reps = RepresentativeRepo::reset(&state.pool, &seed::default_representatives()).await?;
    state
        .change_bus
        .publish(repatlas_core::change::ChangeEvent::refresh(COLLECTION));
    Ok(Json(DataResponse::new(reps)))
}

/// Routes mounted at `/representatives`.
///
/// ```text
/// GET    /           -> list
/// POST   /           -> create (admin)
/// GET    /coverage   -> coverage
/// POST   /reset      -> reset (admin)
/// GET    /{id}       -> get_by_id
/// PUT    /{id}       -> update (admin)
/// DELETE /{id}       -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/coverage", get(coverage))
        .route("/reset", post(reset))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
}
