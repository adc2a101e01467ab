// src/quiz/observer.rs

use crate::models::{
    catalog::{Concept, Question, Topic},
    quiz_set::SampledQuizSet,
};

/// Hook invoked at each step of quiz generation.
///
/// All methods default to no-ops, so an observer only overrides the steps it
/// cares about. Observers see the selection; they cannot alter it.
pub trait SamplingObserver {
    fn concepts_selected(&mut self, _concepts: &[&Concept]) {}

    fn topics_selected(&mut self, _concept: &Concept, _topics: &[&Topic]) {}

    fn questions_selected(&mut self, _topic: &Topic, _questions: &[&Question]) {}

    fn completed(&mut self, _set: &SampledQuizSet) {}
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SamplingObserver for NoopObserver {}

/// Emits a `tracing` event per generation step.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SamplingObserver for TracingObserver {
    fn concepts_selected(&mut self, concepts: &[&Concept]) {
        let titles: Vec<&str> = concepts.iter().map(|c| c.title.as_str()).collect();
        tracing::debug!("Selected concepts: {:?}", titles);
    }

    fn topics_selected(&mut self, concept: &Concept, topics: &[&Topic]) {
        let titles: Vec<&str> = topics.iter().map(|t| t.title.as_str()).collect();
        tracing::debug!("Selected topics for '{}': {:?}", concept.title, titles);
    }

    fn questions_selected(&mut self, topic: &Topic, questions: &[&Question]) {
        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        tracing::debug!("Selected questions for '{}': {:?}", topic.title, ids);
    }

    fn completed(&mut self, set: &SampledQuizSet) {
        tracing::info!(
            "Generated quiz set: {} concepts, {} questions",
            set.concepts.len(),
            set.total_questions
        );
    }
}
