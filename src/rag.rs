//! Retrieval-augmented answering: search the index, format the extracts,
//! ask the model.

use crate::error::RapportsError;
use crate::index::VectorIndex;
use crate::llm::{ChatModel, Message};
use crate::prompts::{self, format_context, render};
use crate::search::SearchFilter;
use crate::types::Chunk;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What the model is asked to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Factual answer citing its sources
    #[default]
    Rag,
    /// Findings, divergences and recommendations across several reports
    Synthesis,
    /// Draft a report section from field notes
    Redaction,
}

impl AnswerMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rag => "rag",
            Self::Synthesis => "synthesis",
            Self::Redaction => "redaction",
        }
    }

    fn templates(&self) -> (&'static str, &'static str) {
        match self {
            Self::Rag => (prompts::RAG_SYSTEM_PROMPT, prompts::RAG_USER_PROMPT),
            Self::Synthesis => (prompts::SYNTHESIS_SYSTEM_PROMPT, prompts::SYNTHESIS_USER_PROMPT),
            Self::Redaction => (prompts::REDACTION_SYSTEM_PROMPT, prompts::REDACTION_USER_PROMPT),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRequest {
    pub query: String,
    pub filter: SearchFilter,
    pub k: usize,
    pub mode: AnswerMode,
    /// Field notes, required in redaction mode
    pub notes: Option<String>,
}

impl AnswerRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filter: SearchFilter::default(),
            k: crate::config::TOP_K,
            mode: AnswerMode::default(),
            notes: None,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), RapportsError> {
        if self.query.trim().is_empty() {
            return Err(RapportsError::InvalidRequest("empty query".to_string()));
        }
        if self.k == 0 {
            return Err(RapportsError::InvalidRequest("k must be at least 1".to_string()));
        }
        let has_notes = self.notes.as_deref().is_some_and(|n| !n.trim().is_empty());
        if self.mode == AnswerMode::Redaction && !has_notes {
            return Err(RapportsError::InvalidRequest(
                "redaction needs field notes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build the conversation sent to the model.
pub fn build_messages(request: &AnswerRequest, chunks: &[Chunk]) -> Vec<Message> {
    let (system, user) = request.mode.templates();
    let context = format_context(chunks);
    let notes = request.notes.as_deref().unwrap_or("");
    vec![
        Message::system(render(system, &context, &request.query, notes)),
        Message::user(render(user, &context, &request.query, notes)),
    ]
}

/// Answer a question from the indexed reports.
///
/// When the search finds nothing, returns an advisory message without
/// calling the model.
pub async fn answer(
    index: &dyn VectorIndex,
    model: &dyn ChatModel,
    request: &AnswerRequest,
) -> Result<String> {
    request.validate()?;

    let results = index.search(&request.query, request.k, &request.filter).await?;
    if results.is_empty() {
        info!(query = %request.query, filters = request.filter.conditions().len(), "no matching chunk");
        return Ok(prompts::NO_RESULTS_MESSAGE.to_string());
    }

    let chunks: Vec<Chunk> = results.into_iter().map(|r| r.chunk).collect();
    debug!(
        mode = request.mode.name(),
        extracts = chunks.len(),
        model = model.name(),
        "asking model"
    );
    let completion = model.complete(&build_messages(request, &chunks)).await?;
    Ok(completion.content)
}
