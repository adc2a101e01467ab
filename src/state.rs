use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use axum::extract::FromRef;
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};
use uuid::Uuid;

use crate::{
    config::{Config, RESULTS_LIMIT},
    models::{catalog::Catalog, session::SessionOutcome},
    quiz::driver::SessionDriver,
};

/// How long sessions stay in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRetention {
    /// Completed or abandoned sessions are dropped this long after the last request.
    pub finished_ttl: Duration,
    /// Unfinished sessions with no request for this long are abandoned and dropped.
    pub idle_ttl: Duration,
    pub sweep_interval: Duration,
}

struct SessionEntry {
    driver: SessionDriver,
    touched: Instant,
}

type Sessions = RwLock<HashMap<Uuid, SessionEntry>>;

/// Live sessions by id.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Sessions>,
}

impl SessionRegistry {
    pub async fn insert(&self, id: Uuid, driver: SessionDriver) {
        let entry = SessionEntry {
            driver,
            touched: Instant::now(),
        };
        self.inner.write().await.insert(id, entry);
    }

    /// Looks a session up and marks it as recently used.
    pub async fn get(&self, id: &Uuid) -> Option<SessionDriver> {
        let mut sessions = self.inner.write().await;
        let entry = sessions.get_mut(id)?;
        entry.touched = Instant::now();
        Some(entry.driver.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> Option<SessionDriver> {
        self.inner.write().await.remove(id).map(|entry| entry.driver)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Evicts expired sessions once. Returns how many were removed.
    pub async fn sweep(&self, retention: &SessionRetention) -> usize {
        sweep_sessions(&self.inner, retention).await
    }

    /// Sweeps every `sweep_interval` until the registry is dropped.
    pub fn spawn_sweeper(&self, retention: SessionRetention) -> JoinHandle<()> {
        let sessions = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(retention.sweep_interval);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(sessions) = sessions.upgrade() else {
                    break;
                };
                let evicted = sweep_sessions(&sessions, &retention).await;
                if evicted > 0 {
                    tracing::debug!("Evicted {} quiz sessions", evicted);
                }
            }
        })
    }
}

async fn sweep_sessions(sessions: &Sessions, retention: &SessionRetention) -> usize {
    let now = Instant::now();
    // Drivers are inspected without holding the registry lock
    let candidates: Vec<(Uuid, SessionDriver, Duration)> = sessions
        .read()
        .await
        .iter()
        .map(|(id, entry)| (*id, entry.driver.clone(), now.duration_since(entry.touched)))
        .collect();

    let mut expired = Vec::new();
    for (id, driver, idle) in candidates {
        if driver.is_finished().await {
            if idle >= retention.finished_ttl {
                expired.push(id);
            }
        } else if idle >= retention.idle_ttl {
            driver.abandon().await;
            tracing::info!(session_id = %id, "Abandoned idle session after {:?}", idle);
            expired.push(id);
        }
    }

    let mut sessions = sessions.write().await;
    for id in &expired {
        sessions.remove(id);
    }
    expired.len()
}

/// Best completed sessions, highest score first, earlier completion on ties.
///
/// Only the top [`RESULTS_LIMIT`] outcomes are kept.
#[derive(Clone, Default)]
pub struct ResultsBoard {
    inner: Arc<Mutex<Vec<SessionOutcome>>>,
}

impl ResultsBoard {
    pub fn record(&self, outcome: SessionOutcome) {
        let mut top = self.lock();
        top.push(outcome);
        top.sort_by(rank);
        top.truncate(RESULTS_LIMIT);
    }

    pub fn top(&self) -> Vec<SessionOutcome> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SessionOutcome>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn rank(a: &SessionOutcome, b: &SessionOutcome) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.completed_at.cmp(&b.completed_at))
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub sessions: SessionRegistry,
    pub outcomes: ResultsBoard,
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        Self {
            config,
            catalog: Arc::new(catalog),
            sessions: SessionRegistry::default(),
            outcomes: ResultsBoard::default(),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Catalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::Question;
    use crate::quiz::session::{Phase, SessionTiming, TimeoutPolicy};
    use chrono::TimeZone;

    fn retention() -> SessionRetention {
        SessionRetention {
            finished_ttl: Duration::from_secs(5),
            idle_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(1),
        }
    }

    fn driver(count: usize) -> SessionDriver {
        let questions = (0..count)
            .map(|i| {
                Arc::new(Question {
                    id: format!("q{}", i),
                    prompt: format!("Statement {}", i),
                    correct_answer: true,
                    explanation: None,
                })
            })
            .collect();
        let timing = SessionTiming {
            timeout_policy: TimeoutPolicy::AwaitAnswer,
            ..SessionTiming::default()
        };
        SessionDriver::start(questions, timing, |_, _| {}).unwrap()
    }

    fn outcome(score: u32, second: u32) -> SessionOutcome {
        SessionOutcome {
            session_id: Uuid::new_v4(),
            score,
            total_questions: 10,
            completed_at: chrono::Utc
                .with_ymd_and_hms(2026, 1, 1, 12, 0, second)
                .unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_session_evicted_after_ttl() {
        let registry = SessionRegistry::default();
        let id = Uuid::new_v4();
        registry.insert(id, driver(1)).await;

        registry.get(&id).await.unwrap().answer(true).await.unwrap();
        // Feedback lasts 3s, then the single-question session completes
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(registry.sweep(&retention()).await, 0);
        assert!(registry.get(&id).await.unwrap().is_finished().await);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(registry.sweep(&retention()).await, 1);
        assert!(registry.get(&id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_session_abandoned_after_idle_ttl() {
        let registry = SessionRegistry::default();
        let stalled = Uuid::new_v4();
        let active = Uuid::new_v4();
        let handle = driver(2);
        registry.insert(stalled, handle.clone()).await;
        registry.insert(active, driver(2)).await;

        // Countdown runs out at 30s, then the session waits for an answer
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert!(matches!(handle.snapshot().await.phase, Phase::TimedOut));
        registry.get(&active).await.unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(registry.sweep(&retention()).await, 1);
        assert!(matches!(handle.snapshot().await.phase, Phase::Abandoned));
        assert!(registry.get(&stalled).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_drains_completed_sessions() {
        let registry = SessionRegistry::default();
        let retention = SessionRetention {
            finished_ttl: Duration::from_millis(500),
            idle_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_millis(100),
        };
        let sweeper = registry.spawn_sweeper(retention);

        for _ in 0..20 {
            let id = Uuid::new_v4();
            registry.insert(id, driver(1)).await;
            registry.get(&id).await.unwrap().answer(false).await.unwrap();
        }
        assert_eq!(registry.len().await, 20);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(registry.is_empty().await);

        drop(registry);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(sweeper.is_finished());
    }

    #[test]
    fn test_results_board_keeps_top_outcomes() {
        let board = ResultsBoard::default();
        // (score, completion second)
        for (score, second) in [(3, 0), (9, 5), (7, 1), (9, 2), (10, 9), (1, 3), (7, 0)] {
            board.record(outcome(score, second));
        }

        let top = board.top();
        let ranked: Vec<(u32, u32)> = top
            .iter()
            .map(|o| (o.score, chrono::Timelike::second(&o.completed_at)))
            .collect();
        assert_eq!(ranked, vec![(10, 9), (9, 2), (9, 5), (7, 0), (7, 1)]);
    }

    #[test]
    fn test_results_board_drops_lower_scores() {
        let board = ResultsBoard::default();
        for second in 0..RESULTS_LIMIT as u32 {
            board.record(outcome(8, second));
        }
        // A tie with a later completion does not displace anyone
        board.record(outcome(8, 30));
        board.record(outcome(2, 31));
        assert_eq!(board.top().len(), RESULTS_LIMIT);
        assert!(board.top().iter().all(|o| o.score == 8));
        assert!(board.top().iter().all(|o| chrono::Timelike::second(&o.completed_at) < 30));

        board.record(outcome(9, 40));
        let top = board.top();
        assert_eq!(top.len(), RESULTS_LIMIT);
        assert_eq!(top[0].score, 9);
        assert_eq!(chrono::Timelike::second(&top[4].completed_at), 3);
    }
}
