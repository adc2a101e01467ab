// src/quiz/driver.rs

use std::sync::{Arc, Weak};

use tokio::{sync::Mutex, task::JoinHandle};

use crate::models::catalog::Question;
use crate::quiz::session::{
    QuizSession, ScheduledTimer, SessionError, SessionEvent, SessionSnapshot, SessionTiming, Step,
};

struct DriverState {
    session: QuizSession,
    /// Sleep task of the one armed timer, aborted whenever a new one is armed.
    pending: Option<JoinHandle<()>>,
}

/// Runs a [`QuizSession`] on the tokio runtime.
///
/// Cloning is cheap; all clones drive the same session. Timer tasks only
/// hold a weak reference, so dropping the last clone ends the session.
#[derive(Clone)]
pub struct SessionDriver {
    shared: Arc<Mutex<DriverState>>,
}

impl SessionDriver {
    /// Starts a session and arms its first countdown.
    /// Must be called from within a tokio runtime.
    pub fn start<F>(
        questions: Vec<Arc<Question>>,
        timing: SessionTiming,
        on_complete: F,
    ) -> Result<Self, SessionError>
    where
        F: FnOnce(u32, usize) + Send + 'static,
    {
        let (session, first) = QuizSession::start(questions, timing, on_complete)?;

        let shared = Arc::new_cyclic(|weak| {
            Mutex::new(DriverState {
                session,
                pending: Some(schedule(weak.clone(), first)),
            })
        });

        Ok(Self { shared })
    }

    /// Submits an answer for the current question.
    pub async fn answer(&self, answer: bool) -> Result<SessionSnapshot, SessionError> {
        let mut state = self.shared.lock().await;
        match apply(&self.shared, &mut state, SessionEvent::Answer(answer)) {
            Step::Ignored => Err(SessionError::AnswerNotAccepted),
            Step::Updated { .. } => Ok(state.session.snapshot()),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().await.session.snapshot()
    }

    /// Completed or abandoned.
    pub async fn is_finished(&self) -> bool {
        self.shared.lock().await.session.is_finished()
    }

    /// Cancels outstanding timers; the completion callback will not fire.
    pub async fn abandon(&self) -> bool {
        let mut state = self.shared.lock().await;
        if let Some(handle) = state.pending.take() {
            handle.abort();
        }
        state.session.abandon()
    }
}

/// Feeds one event to the session and re-arms the timer if it changed.
fn apply(shared: &Arc<Mutex<DriverState>>, state: &mut DriverState, event: SessionEvent) -> Step {
    let step = state.session.handle(event);

    if let Step::Updated { next_timer } = step {
        if let Some(handle) = state.pending.take() {
            handle.abort();
        }
        state.pending = next_timer.map(|timer| schedule(Arc::downgrade(shared), timer));
    }

    step
}

fn schedule(weak: Weak<Mutex<DriverState>>, timer: ScheduledTimer) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(timer.after).await;

        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut state = shared.lock().await;
        // Past the last await point: if `apply` aborts this task's own
        // handle while re-arming, the task still runs to completion.
        apply(&shared, &mut state, SessionEvent::Timer(timer.token));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::session::{FeedbackKind, FeedbackStage, Phase, TimeoutPolicy};
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn timing() -> SessionTiming {
        SessionTiming {
            time_limit: 30,
            tick: Duration::from_secs(1),
            feedback_enter: Duration::from_millis(300),
            feedback_display: Duration::from_millis(2200),
            feedback_exit: Duration::from_millis(500),
            timeout_policy: TimeoutPolicy::AwaitAnswer,
        }
    }

    fn questions(flags: &[bool]) -> Vec<Arc<Question>> {
        flags
            .iter()
            .enumerate()
            .map(|(i, flag)| {
                Arc::new(Question {
                    id: format!("q{}", i),
                    prompt: format!("Statement {}", i),
                    correct_answer: *flag,
                    explanation: None,
                })
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ticks_with_clock() {
        let driver = SessionDriver::start(questions(&[true]), timing(), |_, _| {}).unwrap();

        tokio::time::sleep(Duration::from_millis(5500)).await;
        let snap = driver.snapshot().await;
        assert_eq!(snap.time_remaining, 25);
        assert_eq!(snap.phase, Phase::Presenting);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let snap = driver.snapshot().await;
        assert_eq!(snap.time_remaining, 0);
        assert_eq!(snap.phase, Phase::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_session_reports_once() {
        let (tx, rx) = oneshot::channel();
        let driver = SessionDriver::start(questions(&[false, true, true]), timing(), move |score, total| {
            let _ = tx.send((score, total));
        })
        .unwrap();

        // Q1 correct
        driver.answer(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            driver.snapshot().await.phase,
            Phase::Feedback {
                kind: FeedbackKind::Correct,
                stage: FeedbackStage::Entering
            }
        );
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(
            driver.snapshot().await.phase,
            Phase::Feedback {
                kind: FeedbackKind::Correct,
                stage: FeedbackStage::Showing
            }
        );
        tokio::time::sleep(Duration::from_millis(2000)).await;
        let snap = driver.snapshot().await;
        assert_eq!(snap.question_index, 1);
        assert_eq!(snap.phase, Phase::Presenting);

        // Q2 incorrect
        driver.answer(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3100)).await;

        // Q3 times out, then a late answer moves on
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(driver.snapshot().await.phase, Phase::TimedOut);
        driver.answer(true).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3100)).await;

        assert_eq!(rx.await.unwrap(), (1, 3));
        assert_eq!(
            driver.snapshot().await.phase,
            Phase::Completed { score: 1, total: 3 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_answer_rejected() {
        let driver = SessionDriver::start(questions(&[true, true]), timing(), |_, _| {}).unwrap();

        driver.answer(true).await.unwrap();
        assert_eq!(
            driver.answer(false).await.unwrap_err(),
            SessionError::AnswerNotAccepted
        );
        let snap = driver.snapshot().await;
        assert_eq!(snap.score, 1);
        assert_eq!(snap.selected_answer, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandon_stops_timers() {
        let (tx, mut rx) = oneshot::channel::<(u32, usize)>();
        let driver = SessionDriver::start(questions(&[true]), timing(), move |score, total| {
            let _ = tx.send((score, total));
        })
        .unwrap();

        driver.answer(true).await.unwrap();
        assert!(driver.abandon().await);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(driver.snapshot().await.phase, Phase::Abandoned);
        // Sender dropped with the callback
        assert!(rx.try_recv().is_err());
    }
}
