// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    handlers::quiz::sample_server_catalog,
    models::{
        quiz_set::PublicQuizSet,
        session::{AnswerRequest, SessionOutcome, SessionStarted},
    },
    quiz::driver::SessionDriver,
    state::{AppState, ResultsBoard},
};

/// Builds the completion callback recording a finished session.
fn record_outcome(outcomes: ResultsBoard, session_id: Uuid) -> impl FnOnce(u32, usize) + Send + 'static {
    move |score, total_questions| {
        tracing::info!(%session_id, "Session finished with {}/{}", score, total_questions);
        let outcome = SessionOutcome {
            session_id,
            score,
            total_questions,
            completed_at: chrono::Utc::now(),
        };
        outcomes.record(outcome);
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<SessionDriver, AppError> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or(AppError::NotFound("Session not found".to_string()))
}

/// Starts a timed quiz session on a fresh sample of the catalog.
pub async fn start_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let set = sample_server_catalog(&state.catalog, &state.config)?;
    let session_id = Uuid::new_v4();

    let driver = SessionDriver::start(
        set.questions.clone(),
        state.config.session_timing,
        record_outcome(state.outcomes.clone(), session_id),
    )?;
    let snapshot = driver.snapshot().await;

    state.sessions.insert(session_id, driver).await;
    tracing::info!(%session_id, "Started quiz session with {} questions", set.total_questions);

    Ok((
        StatusCode::CREATED,
        Json(SessionStarted {
            session_id,
            quiz: PublicQuizSet::from(&set),
            state: snapshot,
        }),
    ))
}

/// Returns the current state of a session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let driver = find_session(&state, id).await?;
    Ok(Json(driver.snapshot().await))
}

/// Answers the current question.
///
/// * 409 when the question is already answered or the session is over.
pub async fn answer_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let driver = find_session(&state, id).await?;
    let snapshot = driver.answer(req.answer).await?;
    Ok(Json(snapshot))
}

/// Abandons a session and forgets it.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let driver = state
        .sessions
        .remove(&id)
        .await
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    if driver.abandon().await {
        tracing::info!(session_id = %id, "Session abandoned");
    }

    Ok(StatusCode::NO_CONTENT)
}
