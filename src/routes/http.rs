//! HTTP endpoint handlers. These are thin wrappers that forward to core logic
//! and the session store. Each handler is instrumented; workflow errors map to
//! a status code plus an `ErrorOut` body with an optional redirect step.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::logic::{list_catalog, redirect_step_for};
use crate::protocol::*;
use crate::state::{AppState, SessionError};

/// Status code for a workflow error: lookups that missed are 404, step and
/// content violations are 409.
fn error_status(err: &SessionError) -> StatusCode {
  match err {
    SessionError::UnknownSession(_)
    | SessionError::UnknownModule(_)
    | SessionError::UnknownTarget { .. }
    | SessionError::UnknownCandidate(_) => StatusCode::NOT_FOUND,
    SessionError::EmptyLineup { .. }
    | SessionError::IncompleteSelection
    | SessionError::WrongStep { .. }
    | SessionError::NoResultYet => StatusCode::CONFLICT,
  }
}

fn error_reply(err: SessionError) -> (StatusCode, Json<ErrorOut>) {
  let status = error_status(&err);
  let redirect_to = redirect_step_for(&err);
  (status, Json(ErrorOut { error: err.to_string(), redirect_to }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, q))]
pub async fn http_list_courses(
  State(state): State<Arc<AppState>>,
  Query(q): Query<CatalogQuery>,
) -> impl IntoResponse {
  let courses =
    list_catalog(&state, q.access.as_deref(), q.duration.as_deref(), q.sort.as_deref()).await;
  info!(target: "catalog", count = courses.len(), "HTTP course listing served");
  Json(courses)
}

#[instrument(level = "info", skip(state), fields(%slug))]
pub async fn http_get_course(
  State(state): State<Arc<AppState>>,
  Path(slug): Path<String>,
) -> Result<Json<CourseOut>, (StatusCode, Json<ErrorOut>)> {
  match state.course_by_slug(&slug).await {
    Some(course) => Ok(Json(to_course_out(&course))),
    None => Err((
      StatusCode::NOT_FOUND,
      Json(ErrorOut { error: format!("Unknown course: {slug}"), redirect_to: None }),
    )),
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_module(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<ModuleOut>, (StatusCode, Json<ErrorOut>)> {
  match state.get_module(&id).await {
    Some(module) => Ok(Json(to_module_out(&module))),
    None => Err(error_reply(SessionError::UnknownModule(id))),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.module_id, body.target))]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartSessionIn>,
) -> Result<Json<SessionOut>, (StatusCode, Json<ErrorOut>)> {
  let session = state
    .start_session(&body.module_id, body.target)
    .await
    .map_err(error_reply)?;
  Ok(Json(to_session_out(&session)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, (StatusCode, Json<ErrorOut>)> {
  let session = state.get_session(&id).await.map_err(error_reply)?;
  Ok(Json(to_session_out(&session)))
}

#[instrument(level = "info", skip(state, body), fields(%id, ?body.region))]
pub async fn http_post_selection(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<SelectionIn>,
) -> Result<Json<SessionOut>, (StatusCode, Json<ErrorOut>)> {
  let session = state
    .set_selection(&id, body.region, body.component_id)
    .await
    .map_err(error_reply)?;
  Ok(Json(to_session_out(&session)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_proceed_to_lineup(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, (StatusCode, Json<ErrorOut>)> {
  let session = state.proceed_to_lineup(&id).await.map_err(error_reply)?;
  Ok(Json(to_session_out(&session)))
}

#[instrument(level = "info", skip(state, body), fields(%id, %body.candidate_id))]
pub async fn http_submit_pick(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<PickIn>,
) -> Result<Json<ResultOut>, (StatusCode, Json<ErrorOut>)> {
  let result = state.submit_pick(&id, &body.candidate_id).await.map_err(error_reply)?;
  info!(target: "exercise", session_id = %id, total_points = result.total_points, "HTTP pick verified");
  Ok(Json(to_result_out(&result)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_result(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<ResultOut>, (StatusCode, Json<ErrorOut>)> {
  let result = state.result(&id).await.map_err(error_reply)?;
  Ok(Json(to_result_out(&result)))
}
