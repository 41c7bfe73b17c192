//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Success returns the render model; failures return `ErrorOut` with a status
//! matching the error kind.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{info, instrument};

use crate::error::QuizError;
use crate::logic::{apply, Command};
use crate::protocol::*;
use crate::state::AppState;

fn status_for(err: &QuizError) -> StatusCode {
  match err {
    QuizError::InvalidConfig(_)
    | QuizError::EmptySelection
    | QuizError::NoSelection
    | QuizError::OptionOutOfRange(_) => StatusCode::BAD_REQUEST,
    QuizError::InvalidTransition { .. } | QuizError::Busy | QuizError::AlreadyRevealed => StatusCode::CONFLICT,
    QuizError::Generation(_) => StatusCode::BAD_GATEWAY,
  }
}

async fn respond(state: &AppState, cmd: Command) -> Response {
  match apply(state, cmd).await {
    Ok(view) => Json(view).into_response(),
    Err(e) => {
      let body = ErrorOut { error: e.kind(), message: e.to_string(), state: state.snapshot().await };
      (status_for(&e), Json(body)).into_response()
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, provider: state.provider.name() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.snapshot().await)
}

#[instrument(level = "info", skip(state), fields(category = %body.category))]
pub async fn http_toggle_category(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CategoryIn>,
) -> Response {
  respond(&state, Command::ToggleCategory(body.category)).await
}

#[instrument(level = "info", skip(state), fields(difficulty = %body.difficulty))]
pub async fn http_set_difficulty(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DifficultyIn>,
) -> Response {
  respond(&state, Command::SetDifficulty(body.difficulty)).await
}

#[instrument(level = "info", skip(state), fields(count = body.count))]
pub async fn http_set_question_count(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CountIn>,
) -> Response {
  respond(&state, Command::SetQuestionCount(body.count)).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_start_game(State(state): State<Arc<AppState>>) -> Response {
  let res = respond(&state, Command::StartGame).await;
  info!(target: "game", status = %res.status(), "HTTP start_game finished");
  res
}

#[instrument(level = "info", skip(state), fields(index = body.index))]
pub async fn http_select_option(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SelectIn>,
) -> Response {
  respond(&state, Command::SelectOption(body.index)).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_confirm_or_advance(State(state): State<Arc<AppState>>) -> Response {
  respond(&state, Command::ConfirmOrAdvance).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_restart(State(state): State<Arc<AppState>>) -> Response {
  respond(&state, Command::Restart).await
}
