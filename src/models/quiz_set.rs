// src/models/quiz_set.rs

use std::sync::Arc;

use serde::Serialize;

use crate::models::catalog::{Concept, Question};

/// Title and description of a sampled concept, used for the lesson overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptInfo {
    pub title: String,
    pub description: String,
}

/// Result of one sampling call. Created fresh each time, never persisted.
///
/// The questions are the catalog's own `Arc<Question>` values, not clones.
#[derive(Debug, Clone, Serialize)]
pub struct SampledQuizSet {
    /// Sampled concepts, each reduced to the sampled topics and questions.
    pub concepts: Vec<Concept>,
    pub concept_info: Vec<ConceptInfo>,
    /// All sampled questions in concept-then-topic order.
    pub questions: Vec<Arc<Question>>,
    pub total_questions: usize,
}

/// Question as sent to the client before it is answered.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub prompt: String,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            prompt: q.prompt.clone(),
        }
    }
}

/// Topic for lesson review: content without the answer key.
#[derive(Debug, Clone, Serialize)]
pub struct LessonTopic {
    pub id: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonConcept {
    pub id: String,
    pub title: String,
    pub description: String,
    pub topics: Vec<LessonTopic>,
}

/// DTO for sending a sampled quiz to the client (excludes answers and explanations).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuizSet {
    pub concepts: Vec<LessonConcept>,
    pub concept_info: Vec<ConceptInfo>,
    pub questions: Vec<PublicQuestion>,
    pub total_questions: usize,
}

impl From<&SampledQuizSet> for PublicQuizSet {
    fn from(set: &SampledQuizSet) -> Self {
        let concepts = set
            .concepts
            .iter()
            .map(|c| LessonConcept {
                id: c.id.clone(),
                title: c.title.clone(),
                description: c.description.clone(),
                topics: c
                    .topics
                    .iter()
                    .map(|t| LessonTopic {
                        id: t.id.clone(),
                        title: t.title.clone(),
                        content: t.content.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            concepts,
            concept_info: set.concept_info.clone(),
            questions: set.questions.iter().map(|q| PublicQuestion::from(&**q)).collect(),
            total_questions: set.total_questions,
        }
    }
}
