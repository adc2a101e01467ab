// src/quiz/sampler.rs

//! Randomized selection of a teaching/testing set from the catalog.
//!
//! Every function takes its random source as a parameter: production code
//! passes `rand::rng()`, tests pass a seeded `StdRng`.

use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

use crate::models::{
    catalog::{Catalog, CatalogRequest, Concept, Question},
    quiz_set::{ConceptInfo, SampledQuizSet},
};
use crate::quiz::observer::{NoopObserver, SamplingObserver, TracingObserver};

/// Sampling precondition violations. None are recovered internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("Cannot sample {requested} elements from a collection of {available}")]
    InsufficientElements { requested: usize, available: usize },

    #[error("Cannot sample from an empty collection")]
    EmptyCollection,

    #[error("Catalog needs at least {required} concepts, found {available}")]
    InsufficientConcepts { required: usize, available: usize },

    #[error("Concept '{concept}' needs at least {required} topics, found {available}")]
    InsufficientTopics {
        concept: String,
        required: usize,
        available: usize,
    },

    #[error("Topic '{topic}' has no questions")]
    NoQuestions { topic: String },

    #[error("Request is missing the 'concepts' field")]
    MissingConcepts,
}

/// How many items are drawn at each level of the catalog tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizShape {
    pub concepts: usize,
    pub topics_per_concept: usize,
    pub questions_per_topic: usize,
}

/// Draws `count` distinct elements in random order.
///
/// Each element gets a random key in `[0, 1)`; the first `count` elements
/// after sorting by key are returned.
pub fn sample_elements<'a, T, R>(
    collection: &'a [T],
    count: usize,
    rng: &mut R,
) -> Result<Vec<&'a T>, SampleError>
where
    R: Rng + ?Sized,
{
    if count > collection.len() {
        return Err(SampleError::InsufficientElements {
            requested: count,
            available: collection.len(),
        });
    }

    let mut keyed: Vec<(f64, &T)> = collection
        .iter()
        .map(|item| (rng.random::<f64>(), item))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    Ok(keyed.into_iter().take(count).map(|(_, item)| item).collect())
}

/// Picks one element uniformly by index.
pub fn sample_single_element<'a, T, R>(collection: &'a [T], rng: &mut R) -> Result<&'a T, SampleError>
where
    R: Rng + ?Sized,
{
    if collection.is_empty() {
        return Err(SampleError::EmptyCollection);
    }
    let idx = rng.random_range(0..collection.len());
    Ok(&collection[idx])
}

/// Generates a quiz set from the full list of concepts.
pub fn generate_quiz_set<R>(
    concepts: &[Concept],
    shape: QuizShape,
    rng: &mut R,
) -> Result<SampledQuizSet, SampleError>
where
    R: Rng + ?Sized,
{
    generate_quiz_set_observed(concepts, shape, rng, &mut NoopObserver)
}

/// Same as [`generate_quiz_set`], logging each step through `tracing`.
pub fn generate_quiz_set_logged<R>(
    concepts: &[Concept],
    shape: QuizShape,
    rng: &mut R,
) -> Result<SampledQuizSet, SampleError>
where
    R: Rng + ?Sized,
{
    generate_quiz_set_observed(concepts, shape, rng, &mut TracingObserver)
}

/// Wrapper variant: the concept list may be absent from the request.
pub fn generate_quiz_set_from_request<R>(
    request: &CatalogRequest,
    shape: QuizShape,
    rng: &mut R,
) -> Result<SampledQuizSet, SampleError>
where
    R: Rng + ?Sized,
{
    let concepts = request
        .concepts
        .as_deref()
        .ok_or(SampleError::MissingConcepts)?;
    generate_quiz_set_logged(concepts, shape, rng)
}

impl Catalog {
    pub fn sample<R>(&self, shape: QuizShape, rng: &mut R) -> Result<SampledQuizSet, SampleError>
    where
        R: Rng + ?Sized,
    {
        generate_quiz_set_logged(&self.concepts, shape, rng)
    }
}

/// Core generation algorithm. The observer sees every step but cannot
/// influence the draws.
pub fn generate_quiz_set_observed<R, O>(
    concepts: &[Concept],
    shape: QuizShape,
    rng: &mut R,
    observer: &mut O,
) -> Result<SampledQuizSet, SampleError>
where
    R: Rng + ?Sized,
    O: SamplingObserver + ?Sized,
{
    if concepts.len() < shape.concepts {
        return Err(SampleError::InsufficientConcepts {
            required: shape.concepts,
            available: concepts.len(),
        });
    }

    let selected_concepts = sample_elements(concepts, shape.concepts, rng)?;
    observer.concepts_selected(&selected_concepts);

    let mut reduced_concepts = Vec::with_capacity(selected_concepts.len());
    for concept in selected_concepts {
        if concept.topics.len() < shape.topics_per_concept {
            return Err(SampleError::InsufficientTopics {
                concept: concept.title.clone(),
                required: shape.topics_per_concept,
                available: concept.topics.len(),
            });
        }

        let selected_topics = sample_elements(&concept.topics, shape.topics_per_concept, rng)?;
        observer.topics_selected(concept, &selected_topics);

        let mut reduced_topics = Vec::with_capacity(selected_topics.len());
        for topic in selected_topics {
            if topic.questions.is_empty() {
                return Err(SampleError::NoQuestions {
                    topic: topic.title.clone(),
                });
            }

            let chosen: Vec<&Arc<Question>> = if shape.questions_per_topic == 1 {
                vec![sample_single_element(&topic.questions, rng)?]
            } else {
                sample_elements(&topic.questions, shape.questions_per_topic, rng)?
            };

            let chosen_refs: Vec<&Question> = chosen.iter().map(|q| q.as_ref()).collect();
            observer.questions_selected(topic, &chosen_refs);

            reduced_topics.push(topic.with_questions(chosen.into_iter().cloned().collect()));
        }

        reduced_concepts.push(concept.with_topics(reduced_topics));
    }

    let concept_info = reduced_concepts
        .iter()
        .map(|c| ConceptInfo {
            title: c.title.clone(),
            description: c.description.clone(),
        })
        .collect();

    let questions: Vec<Arc<Question>> = reduced_concepts
        .iter()
        .flat_map(|c| &c.topics)
        .flat_map(|t| t.questions.iter().cloned())
        .collect();

    let set = SampledQuizSet {
        concepts: reduced_concepts,
        concept_info,
        total_questions: questions.len(),
        questions,
    };
    observer.completed(&set);

    Ok(set)
}
