//! SQuAD v2 records and their transformation into embedding-ready documents.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::PipelineError;
use crate::text::normalize;

/// Raw dataset row as exported from the `squad_v2` split.
#[derive(Debug, Clone, Deserialize)]
pub struct SquadRecord {
    pub title: String,
    pub context: String,
    pub question: String,
    pub answers: SquadAnswers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SquadAnswers {
    pub text: Vec<String>,
}

/// Payload stored with every point and returned with every search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub title: String,
    pub context: String,
    pub question: String,
    pub answer: String,
    pub has_answer: bool,
}

/// Immutable document ready for ingestion: the embedding input text plus
/// the metadata the prompt builder needs back at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingDocument {
    pub text: String,
    pub metadata: DocMetadata,
}

/// Turn a raw record into an embedding document.
///
/// The first answer string is kept (SQuAD v2 rows without an answer have an
/// empty list); `has_answer` is true iff that string is non-empty.
pub fn prepare_document(record: SquadRecord) -> EmbeddingDocument {
    let context = normalize(&record.context);
    let question = normalize(&record.question);
    let answer = record.answers.text.first().cloned().unwrap_or_default();

    EmbeddingDocument {
        text: format!("Question: {} Context: {}", question, context),
        metadata: DocMetadata {
            title: normalize(&record.title),
            context,
            question,
            has_answer: !answer.is_empty(),
            answer,
        },
    }
}

/// Load records from a JSON array or a JSON-lines file.
///
/// A record with a missing or misshapen field is a data error surfaced to
/// the caller, not a row to skip silently.
pub fn load_records(path: &Path) -> Result<Vec<SquadRecord>, PipelineError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| PipelineError::data(format!("cannot read {}: {}", path.display(), e)))?;

    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        serde_json::from_str(&raw).map_err(PipelineError::data)
    } else {
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(PipelineError::data))
            .collect()
    }
}
