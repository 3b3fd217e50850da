//! Routes and handlers for the `/events` resource: event CRUD, public
//! signups, admin signup management, and the CSV export.
//!
//! The public surface only ever sees published events in list form; drafts
//! are reachable through the admin-only `/all` and `/search` routes.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use repatlas_core::change::ChangeKind;
use repatlas_core::csv_export::{export_filename, signups_to_csv};
use repatlas_core::error::CoreError;
use repatlas_core::signup_policy::{can_sign_up, spots_left};
use repatlas_core::types::DbId;
use repatlas_db::models::{CreateEvent, CreateSignup, Event, Signup};
use repatlas_db::repositories::signup_repo::is_duplicate_signup;
use repatlas_db::repositories::{EventRepo, SignupRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::admin::AdminIdentity;
use crate::response::DataResponse;
use crate::routes::publish_row;
use crate::state::AppState;

const COLLECTION: &str = "events";
const SIGNUP_COLLECTION: &str = "event_signups";

/// GET /api/v1/events -- published events only, soonest first.
async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let events = EventRepo::list_published(&state.pool).await?;
    Ok(Json(DataResponse::new(events)))
}

/// GET /api/v1/events/all -- every event including drafts.
async fn list_all(
    _admin: AdminIdentity,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let events = EventRepo::list(&state.pool).await?;
    Ok(Json(DataResponse::new(events)))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
    /// Restrict matches to published events. Anonymous callers get this
    /// forced on; only admins may pass `false` to search drafts.
    #[serde(default = "default_published_only")]
    published_only: bool,
}

fn default_published_only() -> bool {
    true
}

/// GET /api/v1/events/search?q=... -- public; drafts admin-only.
async fn search(
    admin: Option<AdminIdentity>,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let published_only = params.published_only || admin.is_none();
    let events = EventRepo::search(&state.pool, &params.q, published_only).await?;
    Ok(Json(DataResponse::new(events)))
}

/// One row of the public signup-count listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupCount {
    event_id: DbId,
    count: i64,
    /// `None` for uncapped events.
    spots_left: Option<i64>,
}

/// GET /api/v1/events/signup-counts
///
/// Signup totals per published event, for "spots left" rendering on the
/// listing page. Events with zero signups are included with a zero count.
async fn signup_counts(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SignupCount>>>> {
    let counts: HashMap<DbId, i64> = SignupRepo::counts_by_event(&state.pool)
        .await?
        .into_iter()
        .collect();
    let rows = EventRepo::list_published(&state.pool)
        .await?
        .into_iter()
        .map(|event| {
            let count = counts.get(&event.id).copied().unwrap_or(0);
            SignupCount {
                event_id: event.id,
                count,
                spots_left: spots_left(event.capacity, count),
            }
        })
        .collect();
    Ok(Json(DataResponse::new(rows)))
}

/// GET /api/v1/events/{id}
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = find_event(&state, id).await?;
    Ok(Json(DataResponse::new(event)))
}

/// POST /api/v1/events
async fn create(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Json(input): Json<CreateEvent>,
) -> AppResult<(StatusCode, Json<DataResponse<Event>>)> {
    input.validate()?;
    let event = EventRepo::create(&state.pool, &input).await?;
    publish_row(&state, COLLECTION, ChangeKind::Insert, &event);
    Ok((StatusCode::CREATED, Json(DataResponse::new(event))))
}

/// PUT /api/v1/events/{id}
async fn update(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateEvent>,
) -> AppResult<Json<DataResponse<Event>>> {
    input.validate()?;
    let event = EventRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Event", id }))?;
    publish_row(&state, COLLECTION, ChangeKind::Update, &event);
    Ok(Json(DataResponse::new(event)))
}

/// DELETE /api/v1/events/{id}
///
/// Signups cascade with the event.
async fn delete(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = EventRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Event", id }))?;
    publish_row(&state, COLLECTION, ChangeKind::Delete, &event);
    Ok(Json(DataResponse::new(event)))
}

/// GET /api/v1/events/signups -- every signup across all events, for the
/// admin overview.
async fn list_all_signups(
    _admin: AdminIdentity,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Signup>>>> {
    let signups = SignupRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse::new(signups)))
}

/// GET /api/v1/events/{id}/signups
async fn list_signups(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Signup>>>> {
    // 404 before listing so a bogus event id is not an empty list.
    find_event(&state, id).await?;
    let signups = SignupRepo::list_for_event(&state.pool, id).await?;
    Ok(Json(DataResponse::new(signups)))
}

/// POST /api/v1/events/{id}/signups -- public signup endpoint.
///
/// Eligibility (published, signups enabled, not past, capacity) is checked
/// before inserting, but only the (event, email) uniqueness is enforced
/// atomically. Capacity remains advisory under concurrency.
async fn create_signup(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateSignup>,
) -> AppResult<(StatusCode, Json<DataResponse<Signup>>)> {
    input.validate()?;
    let event = find_event(&state, id).await?;

    let count = SignupRepo::count_for_event(&state.pool, id).await?;
    can_sign_up(&event.gate(), count, Utc::now().date_naive())
        .map_err(|refusal| CoreError::Conflict(refusal.to_string()))?;

    let signup = match SignupRepo::create(&state.pool, id, &input).await {
        Ok(signup) => signup,
        Err(err) if is_duplicate_signup(&err) => {
            return Err(AppError::Core(CoreError::Conflict(
                "You have already signed up for this event.".into(),
            )));
        }
        Err(err) => return Err(err.into()),
    };

    publish_row(&state, SIGNUP_COLLECTION, ChangeKind::Insert, &signup);

    // Notification delivery is best-effort and off the request path.
    if let Some(notifier) = state.notifier.clone() {
        let event = event.clone();
        let signup_copy = signup.clone();
        tokio::spawn(async move {
            notifier.notify_signup(&event, &signup_copy).await;
        });
    }

    Ok((StatusCode::CREATED, Json(DataResponse::new(signup))))
}

/// DELETE /api/v1/events/{id}/signups/{signup_id}
async fn delete_signup(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path((id, signup_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Signup>>> {
    let signup = SignupRepo::delete(&state.pool, signup_id)
        .await?
        .filter(|signup| signup.event_id == id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Signup",
            id: signup_id,
        }))?;
    publish_row(&state, SIGNUP_COLLECTION, ChangeKind::Delete, &signup);
    Ok(Json(DataResponse::new(signup)))
}

/// GET /api/v1/events/{id}/signups/export -- CSV download.
///
/// Every field is double-quoted; the filename is derived from the event
/// title.
async fn export_signups(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let event = find_event(&state, id).await?;
    let signups = SignupRepo::list_for_event(&state.pool, id).await?;

    let rows: Vec<_> = signups.iter().map(Signup::to_csv_row).collect();
    let csv = signups_to_csv(&rows);
    let filename = export_filename(&event.title);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

async fn find_event(state: &AppState, id: DbId) -> AppResult<Event> {
    EventRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Event", id }))
}

/// Routes mounted at `/events`.
///
/// ```text
/// GET    /                           -> list (published only)
/// POST   /                           -> create (admin)
/// GET    /all                        -> list_all (admin)
/// GET    /search                     -> search (public; drafts admin-only)
/// GET    /signup-counts              -> signup_counts
/// GET    /signups                    -> list_all_signups (admin)
/// GET    /{id}                       -> get_by_id
/// PUT    /{id}                       -> update (admin)
/// DELETE /{id}                       -> delete (admin)
/// GET    /{id}/signups               -> list_signups (admin)
/// POST   /{id}/signups               -> create_signup (public)
/// GET    /{id}/signups/export        -> export_signups (admin)
/// DELETE /{id}/signups/{signup_id}   -> delete_signup (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/all", get(list_all))
        .route("/search", get(search))
        .route("/signup-counts", get(signup_counts))
        .route("/signups", get(list_all_signups))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
        .route("/{id}/signups", get(list_signups).post(create_signup))
        .route("/{id}/signups/export", get(export_signups))
        .route("/{id}/signups/{signup_id}", axum::routing::delete(delete_signup))
}
