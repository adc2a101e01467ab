// src/quiz/session.rs

//! Timed quiz session as an explicit state machine.
//!
//! The session never sleeps or spawns anything. Whenever it needs time to
//! pass it hands back a [`ScheduledTimer`]; the caller arms it and later
//! feeds its token back as [`SessionEvent::Timer`]. Only the token of the
//! single pending timer is accepted, so a late callback from an earlier
//! question or phase is a no-op.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use thiserror::Error;

use crate::models::{catalog::Question, quiz_set::PublicQuestion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("A quiz session needs at least one question")]
    EmptyQuestionList,

    #[error("Answer not accepted in the current phase")]
    AnswerNotAccepted,
}

/// What happens when the countdown of a question reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Show the timeout notice and wait for an answer before moving on.
    /// The late answer is recorded but never scored.
    AwaitAnswer,
    /// Count the question as missed and go straight to feedback.
    AutoAdvance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Countdown budget per question, in ticks.
    pub time_limit: u32,
    pub tick: Duration,
    pub feedback_enter: Duration,
    pub feedback_display: Duration,
    pub feedback_exit: Duration,
    pub timeout_policy: TimeoutPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Correct,
    Incorrect,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStage {
    Entering,
    Showing,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
    /// Question shown, countdown running.
    Presenting,
    /// Countdown hit zero; waiting for an answer to continue.
    TimedOut,
    Feedback {
        kind: FeedbackKind,
        stage: FeedbackStage,
    },
    Completed {
        score: u32,
        total: usize,
    },
    Abandoned,
}

/// Identifies one armed timer. Stale tokens are rejected by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub question: usize,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub token: TimerToken,
    pub after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Answer(bool),
    Timer(TimerToken),
}

/// Outcome of feeding an event to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The event did not apply; state and pending timer are unchanged.
    Ignored,
    /// State changed. Any previously armed timer is void; `next_timer`
    /// replaces it (`None` means nothing to arm).
    Updated { next_timer: Option<ScheduledTimer> },
}

/// Receives `(score, total_questions)` once the last question is done.
pub type CompletionCallback = Box<dyn FnOnce(u32, usize) + Send>;

/// Correct answer and explanation, revealed once the question is settled.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReveal {
    pub correct_answer: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub question_index: usize,
    pub total_questions: usize,
    pub question: PublicQuestion,
    pub score: u32,
    pub time_remaining: u32,
    pub answered: bool,
    pub selected_answer: Option<bool>,
    pub timed_out: bool,
    pub reveal: Option<AnswerReveal>,
}

pub struct QuizSession {
    questions: Vec<Arc<Question>>,
    timing: SessionTiming,
    index: usize,
    score: u32,
    time_remaining: u32,
    answered: bool,
    selected_answer: Option<bool>,
    timed_out: bool,
    phase: Phase,
    pending: Option<TimerToken>,
    generation: u64,
    on_complete: Option<CompletionCallback>,
}

impl QuizSession {
    /// Starts on the first question and returns its countdown timer.
    pub fn start<F>(
        questions: Vec<Arc<Question>>,
        timing: SessionTiming,
        on_complete: F,
    ) -> Result<(Self, ScheduledTimer), SessionError>
    where
        F: FnOnce(u32, usize) + Send + 'static,
    {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionList);
        }

        let mut session = Self {
            questions,
            timing,
            index: 0,
            score: 0,
            time_remaining: timing.time_limit,
            answered: false,
            selected_answer: None,
            timed_out: false,
            phase: Phase::Presenting,
            pending: None,
            generation: 0,
            on_complete: Some(Box::new(on_complete)),
        };
        let first = session.enter_question();
        Ok((session, first))
    }

    pub fn handle(&mut self, event: SessionEvent) -> Step {
        match event {
            SessionEvent::Answer(answer) => self.on_answer(answer),
            SessionEvent::Timer(token) => self.on_timer(token),
        }
    }

    /// Tears the session down. Pending timers become stale and the
    /// completion callback is dropped without firing.
    pub fn abandon(&mut self) -> bool {
        if matches!(self.phase, Phase::Completed { .. } | Phase::Abandoned) {
            return false;
        }
        tracing::debug!("Session abandoned at question {}", self.index);
        self.phase = Phase::Abandoned;
        self.pending = None;
        self.on_complete = None;
        true
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn question_index(&self) -> usize {
        self.index
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn selected_answer(&self) -> Option<bool> {
        self.selected_answer
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Completed { .. } | Phase::Abandoned)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let question = &self.questions[self.index];
        let reveal = match self.phase {
            Phase::Feedback { .. } | Phase::Completed { .. } => Some(AnswerReveal {
                correct_answer: question.correct_answer,
                explanation: question.explanation.clone(),
            }),
            _ => None,
        };

        SessionSnapshot {
            phase: self.phase,
            question_index: self.index,
            total_questions: self.questions.len(),
            question: PublicQuestion::from(&**question),
            score: self.score,
            time_remaining: self.time_remaining,
            answered: self.answered,
            selected_answer: self.selected_answer,
            timed_out: self.timed_out,
            reveal,
        }
    }

    fn on_answer(&mut self, answer: bool) -> Step {
        match self.phase {
            Phase::Presenting if !self.answered => {
                self.answered = true;
                self.selected_answer = Some(answer);

                let kind = if answer == self.questions[self.index].correct_answer {
                    self.score += 1;
                    FeedbackKind::Correct
                } else {
                    FeedbackKind::Incorrect
                };
                self.enter_feedback(kind)
            }
            Phase::TimedOut if !self.answered => {
                self.answered = true;
                self.selected_answer = Some(answer);
                self.enter_feedback(FeedbackKind::Timeout)
            }
            _ => Step::Ignored,
        }
    }

    fn on_timer(&mut self, token: TimerToken) -> Step {
        if self.pending != Some(token) {
            tracing::trace!("Ignoring stale timer for question {}", token.question);
            return Step::Ignored;
        }
        self.pending = None;

        match self.phase {
            Phase::Presenting => {
                self.time_remaining = self.time_remaining.saturating_sub(1);
                if self.time_remaining > 0 {
                    return Step::Updated {
                        next_timer: Some(self.arm(self.timing.tick)),
                    };
                }

                self.timed_out = true;
                match self.timing.timeout_policy {
                    TimeoutPolicy::AwaitAnswer => {
                        self.phase = Phase::TimedOut;
                        Step::Updated { next_timer: None }
                    }
                    TimeoutPolicy::AutoAdvance => {
                        self.answered = true;
                        self.enter_feedback(FeedbackKind::Timeout)
                    }
                }
            }
            Phase::Feedback { kind, stage } => match stage {
                FeedbackStage::Entering => {
                    self.phase = Phase::Feedback {
                        kind,
                        stage: FeedbackStage::Showing,
                    };
                    Step::Updated {
                        next_timer: Some(self.arm(self.timing.feedback_display)),
                    }
                }
                FeedbackStage::Showing => {
                    self.phase = Phase::Feedback {
                        kind,
                        stage: FeedbackStage::Exiting,
                    };
                    Step::Updated {
                        next_timer: Some(self.arm(self.timing.feedback_exit)),
                    }
                }
                FeedbackStage::Exiting => self.finish_question(),
            },
            Phase::TimedOut | Phase::Completed { .. } | Phase::Abandoned => Step::Ignored,
        }
    }

    fn enter_feedback(&mut self, kind: FeedbackKind) -> Step {
        self.phase = Phase::Feedback {
            kind,
            stage: FeedbackStage::Entering,
        };
        Step::Updated {
            next_timer: Some(self.arm(self.timing.feedback_enter)),
        }
    }

    fn finish_question(&mut self) -> Step {
        if self.index + 1 >= self.questions.len() {
            let total = self.questions.len();
            self.phase = Phase::Completed {
                score: self.score,
                total,
            };
            tracing::info!("Quiz session completed: {}/{}", self.score, total);
            if let Some(callback) = self.on_complete.take() {
                callback(self.score, total);
            }
            return Step::Updated { next_timer: None };
        }

        self.index += 1;
        Step::Updated {
            next_timer: Some(self.enter_question()),
        }
    }

    fn enter_question(&mut self) -> ScheduledTimer {
        self.time_remaining = self.timing.time_limit;
        self.answered = false;
        self.timed_out = false;
        self.selected_answer = None;
        self.phase = Phase::Presenting;
        self.arm(self.timing.tick)
    }

    fn arm(&mut self, after: Duration) -> ScheduledTimer {
        self.generation += 1;
        let token = TimerToken {
            question: self.index,
            generation: self.generation,
        };
        self.pending = Some(token);
        ScheduledTimer { token, after }
    }
}
