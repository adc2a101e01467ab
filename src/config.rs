// src/config.rs

use std::env;
use std::time::Duration;
use dotenvy::dotenv;

use crate::quiz::{sampler::QuizShape, session::{SessionTiming, TimeoutPolicy}};
use crate::state::SessionRetention;

/// Concepts drawn per quiz.
pub const QUIZ_CONCEPT_COUNT: usize = 5;
/// Topics drawn per concept.
pub const TOPICS_PER_CONCEPT: usize = 2;
/// Questions drawn per topic.
pub const QUESTIONS_PER_TOPIC: usize = 1;

/// Countdown budget per question, in ticks.
pub const QUESTION_TIME_LIMIT: u32 = 30;
pub const COUNTDOWN_TICK_MILLIS: u64 = 1000;

// Feedback phase: enter -> display -> exit, 3s in total.
pub const FEEDBACK_ENTER_MILLIS: u64 = 300;
pub const FEEDBACK_DISPLAY_MILLIS: u64 = 2200;
pub const FEEDBACK_EXIT_MILLIS: u64 = 500;

/// Number of outcomes returned by the results endpoint.
pub const RESULTS_LIMIT: usize = 5;

// Session registry housekeeping, in seconds.
pub const FINISHED_SESSION_TTL_SECS: u64 = 60;
pub const IDLE_SESSION_TTL_SECS: u64 = 600;
pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_path: String,
    pub bind_addr: String,
    pub rust_log: String,
    pub cors_origins: Vec<String>,
    pub quiz_shape: QuizShape,
    pub session_timing: SessionTiming,
    pub session_retention: SessionRetention,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let catalog_path = env::var("CATALOG_PATH")
            .unwrap_or_else(|_| "data/catalog.json".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let time_limit = parse_time_limit(env::var("QUESTION_TIME_LIMIT").ok().as_deref());
        let timeout_policy = parse_timeout_policy(env::var("TIMEOUT_POLICY").ok().as_deref());

        let session_retention = SessionRetention {
            finished_ttl: parse_secs(
                env::var("FINISHED_SESSION_TTL").ok().as_deref(),
                FINISHED_SESSION_TTL_SECS,
            ),
            idle_ttl: parse_secs(
                env::var("IDLE_SESSION_TTL").ok().as_deref(),
                IDLE_SESSION_TTL_SECS,
            ),
            ..SessionRetention::default()
        };

        Self {
            catalog_path,
            bind_addr,
            rust_log,
            cors_origins,
            quiz_shape: QuizShape::default(),
            session_timing: SessionTiming {
                time_limit,
                timeout_policy,
                ..SessionTiming::default()
            },
            session_retention,
        }
    }
}

/// Countdown ticks per question; unparsable or zero falls back to the default.
fn parse_time_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(QUESTION_TIME_LIMIT)
}

fn parse_timeout_policy(raw: Option<&str>) -> TimeoutPolicy {
    match raw.map(str::trim) {
        Some("auto-advance") => TimeoutPolicy::AutoAdvance,
        _ => TimeoutPolicy::AwaitAnswer,
    }
}

fn parse_secs(raw: Option<&str>, default: u64) -> Duration {
    let secs = raw
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

impl Default for QuizShape {
    fn default() -> Self {
        Self {
            concepts: QUIZ_CONCEPT_COUNT,
            topics_per_concept: TOPICS_PER_CONCEPT,
            questions_per_topic: QUESTIONS_PER_TOPIC,
        }
    }
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            time_limit: QUESTION_TIME_LIMIT,
            tick: Duration::from_millis(COUNTDOWN_TICK_MILLIS),
            feedback_enter: Duration::from_millis(FEEDBACK_ENTER_MILLIS),
            feedback_display: Duration::from_millis(FEEDBACK_DISPLAY_MILLIS),
            feedback_exit: Duration::from_millis(FEEDBACK_EXIT_MILLIS),
            timeout_policy: TimeoutPolicy::AwaitAnswer,
        }
    }
}

impl Default for SessionRetention {
    fn default() -> Self {
        Self {
            finished_ttl: Duration::from_secs(FINISHED_SESSION_TTL_SECS),
            idle_ttl: Duration::from_secs(IDLE_SESSION_TTL_SECS),
            sweep_interval: Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS),
        }
    }
}
