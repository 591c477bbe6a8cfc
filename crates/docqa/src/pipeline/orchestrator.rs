//! Two-step question answering: retrieve, then generate

use std::time::Instant;
use tracing::Instrument;

use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::retrieval::{DocumentIndex, Retriever};

use super::state::QueryState;

/// Returned instead of an answer when no document has been loaded
pub const MISSING_DOCUMENT_MESSAGE: &str = "Please upload a contract PDF.";

/// Runs a question through the retriever and the generator, in that order
pub struct QaPipeline {
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl QaPipeline {
    pub fn new(retriever: Retriever, generator: AnswerGenerator) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    /// Answer `question` from `index`.
    ///
    /// Without an index the guard message is returned and neither the
    /// embedding service nor the language model is called.
    pub async fn run(&self, index: Option<&DocumentIndex>, question: &str) -> Result<String> {
        match index {
            None => {
                tracing::info!("No document loaded, returning guard message");
                Ok(MISSING_DOCUMENT_MESSAGE.to_string())
            }
            Some(index) => self.run_state(index, question).await?.into_answer(),
        }
    }

    /// Run both stages and return the terminal state, context included
    pub async fn run_state(&self, index: &DocumentIndex, question: &str) -> Result<QueryState> {
        let span = tracing::info_span!(
            "qa",
            index = %index.id(),
            question_len = question.chars().count(),
            chunks = index.len()
        );

        async move {
            let start = Instant::now();
            let mut state = QueryState::new(question);

            let context = self.retriever.retrieve(index, state.question()).await?;
            tracing::debug!("Retrieved {} context chunks", context.len());
            state.retrieved(context)?;

            let answer = self
                .generator
                .generate(state.question(), state.context().unwrap_or_default())
                .await?;
            state.answered(answer)?;

            tracing::info!("Answered in {}ms", start.elapsed().as_millis());
            Ok(state)
        }
        .instrument(span)
        .await
    }
}
