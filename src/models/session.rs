// src/models/session.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{models::quiz_set::PublicQuizSet, quiz::session::SessionSnapshot};

/// DTO for answering the current question.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: bool,
}

/// Returned when a session starts: the lesson material plus the first question.
#[derive(Debug, Serialize)]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub quiz: PublicQuizSet,
    pub state: SessionSnapshot,
}

/// Final result of a completed session, kept in memory for the results board.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub score: u32,
    pub total_questions: usize,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}
