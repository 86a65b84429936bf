use std::sync::Arc;

use anyhow::Context;
use govqa_core::traits::{AnswerGenerator, AnswerRequest};
use govqa_core::types::{Language, RankedResults};
use govqa_lexical::{detect_language, dominant_language};
use serde::Serialize;
use tracing::debug;

use crate::engine::RetrievalEngine;

/// Passages handed to the answer generator.
pub const ANSWER_PASSAGES: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub language: Language,
    pub retrieval: RankedResults,
}

/// Retrieval plus answer generation for one question.
pub struct Assistant {
    engine: Arc<RetrievalEngine>,
    generator: Arc<dyn AnswerGenerator>,
}

impl Assistant {
    pub fn new(engine: Arc<RetrievalEngine>, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self { engine, generator }
    }

    pub fn engine(&self) -> &RetrievalEngine {
        &self.engine
    }

    /// Run the cascade, ask the generator to answer in the question's
    /// language from the top passages, and translate the reply when it came
    /// back mostly in the corpus language instead.
    pub async fn answer(&self, query: &str) -> anyhow::Result<Answer> {
        let retrieval = self.engine.search_with_rerank(query).await?;
        let language = detect_language(query);
        let passages = &retrieval.results[..retrieval.results.len().min(ANSWER_PASSAGES)];
        let request = AnswerRequest {
            query,
            language,
            passages,
            category_hint: retrieval.status.category_hint.as_ref(),
        };
        let mut text = self.generator.generate(&request).context("generating answer")?;

        let corpus = self.engine.corpus_language();
        if language != corpus && dominant_language(&text) == corpus {
            if let Some(translator) = self.engine.translator() {
                debug!(from = corpus.code(), to = language.code(), "translating answer back");
                text = translator.translate_or_original(&text, corpus, language);
            }
        }
        Ok(Answer { text, language, retrieval })
    }
}
