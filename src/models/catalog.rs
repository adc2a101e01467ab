// src/models/catalog.rs

use std::{fs, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// A single true/false prompt.
/// Shared by `Arc` between the catalog and every sampled quiz set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    /// The statement the player has to judge.
    pub prompt: String,

    /// Whether the statement is true.
    pub correct_answer: bool,

    /// Shown to the player after answering.
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A subdivision of a concept: learning content plus the questions testing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,

    /// Learning summary shown during lesson review.
    pub content: String,

    #[serde(default)]
    pub questions: Vec<Arc<Question>>,
}

impl Topic {
    /// Copies every field except the question list, which is replaced.
    pub fn with_questions(&self, questions: Vec<Arc<Question>>) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            questions,
        }
    }
}

/// Top-level teachable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub title: String,
    pub description: String,

    #[serde(default)]
    pub topics: Vec<Topic>,
}

impl Concept {
    /// Copies every field except the topic list, which is replaced.
    pub fn with_topics(&self, topics: Vec<Topic>) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            topics,
        }
    }
}

/// The complete, read-only set of concepts the sampler draws from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub concepts: Vec<Concept>,
}

impl Catalog {
    /// Loads a catalog from a JSON file shaped as `{ "concepts": [...] }`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::InternalServerError(format!(
                "Failed to read catalog {}: {}",
                path.display(),
                e
            ))
        })?;

        let catalog: Catalog = serde_json::from_str(&raw).map_err(|e| {
            AppError::InternalServerError(format!(
                "Failed to parse catalog {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::info!(
            "Loaded catalog from {} ({} concepts, {} questions)",
            path.display(),
            catalog.concepts.len(),
            catalog.question_count()
        );
        Ok(catalog)
    }

    pub fn question_count(&self) -> usize {
        self.concepts
            .iter()
            .flat_map(|c| &c.topics)
            .map(|t| t.questions.len())
            .sum()
    }
}

/// Wrapper payload for generating a quiz from a client-supplied catalog.
/// `concepts` is optional so that its absence can be reported explicitly.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CatalogRequest {
    #[validate(length(max = 500, message = "At most 500 concepts may be submitted."))]
    pub concepts: Option<Vec<Concept>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str) -> Arc<Question> {
        Arc::new(Question {
            id: id.to_string(),
            prompt: format!("prompt {}", id),
            correct_answer: true,
            explanation: None,
        })
    }

    #[test]
    fn test_with_questions_keeps_other_fields() {
        let topic = Topic {
            id: "t1".to_string(),
            title: "Borrowing".to_string(),
            content: "References borrow values.".to_string(),
            questions: vec![question("q1"), question("q2")],
        };

        let chosen = topic.questions[1].clone();
        let reduced = topic.with_questions(vec![chosen.clone()]);

        assert_eq!(reduced.id, topic.id);
        assert_eq!(reduced.title, topic.title);
        assert_eq!(reduced.content, topic.content);
        assert_eq!(reduced.questions.len(), 1);
        assert!(Arc::ptr_eq(&reduced.questions[0], &chosen));
        // Original untouched
        assert_eq!(topic.questions.len(), 2);
    }

    #[test]
    fn test_catalog_deserializes_without_explanation() {
        let raw = r#"{
            "concepts": [{
                "id": "c1",
                "title": "Ownership",
                "description": "Who owns what",
                "topics": [{
                    "id": "t1",
                    "title": "Moves",
                    "content": "Values move by default.",
                    "questions": [{"id": "q1", "prompt": "String is Copy", "correct_answer": false}]
                }]
            }]
        }"#;

        let catalog: Catalog = serde_json::from_str(raw).unwrap();
        assert_eq!(catalog.concepts.len(), 1);
        assert_eq!(catalog.question_count(), 1);
        assert!(catalog.concepts[0].topics[0].questions[0].explanation.is_none());
    }

    #[test]
    fn test_catalog_request_without_concepts() {
        let req: CatalogRequest = serde_json::from_str("{}").unwrap();
        assert!(req.concepts.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_malformed_catalog_file_is_a_server_error() {
        let path = std::env::temp_dir().join(format!("catalog-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, r#"{"concepts": [{"id": "c1""#).unwrap();

        let result = Catalog::from_path(&path);
        fs::remove_file(&path).unwrap();

        match result {
            Err(AppError::InternalServerError(msg)) => {
                assert!(msg.contains("Failed to parse catalog"));
                assert!(msg.contains(&path.display().to_string()));
            }
            other => panic!("expected InternalServerError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_catalog_file_is_a_server_error() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));
        assert!(matches!(
            Catalog::from_path(&path),
            Err(AppError::InternalServerError(_))
        ));
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = Catalog::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalog.json")).unwrap();
        assert!(catalog.concepts.len() >= 5);
    }
}
