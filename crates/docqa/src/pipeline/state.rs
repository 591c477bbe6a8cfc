//! Per-question state carried through the pipeline

use crate::error::{Error, Result};

/// Where a question is in the retrieve → generate sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Question received, nothing retrieved yet
    Start,
    /// Context retrieved, no answer yet
    Retrieved,
    /// Answer generated; terminal
    Done,
}

/// Fixed-field record for one question
#[derive(Debug, Clone)]
pub struct QueryState {
    question: String,
    context: Option<Vec<String>>,
    answer: Option<String>,
    stage: PipelineStage,
}

impl QueryState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: None,
            answer: None,
            stage: PipelineStage::Start,
        }
    }

    /// Record the retrieved context. Only valid from `Start`.
    pub fn retrieved(&mut self, context: Vec<String>) -> Result<()> {
        if self.stage != PipelineStage::Start {
            return Err(Error::internal(format!(
                "cannot record context in stage {:?}",
                self.stage
            )));
        }
        self.context = Some(context);
        self.stage = PipelineStage::Retrieved;
        Ok(())
    }

    /// Record the answer. Only valid from `Retrieved`.
    pub fn answered(&mut self, answer: String) -> Result<()> {
        if self.stage != PipelineStage::Retrieved {
            return Err(Error::internal(format!(
                "cannot record answer in stage {:?}",
                self.stage
            )));
        }
        self.answer = Some(answer);
        self.stage = PipelineStage::Done;
        Ok(())
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn context(&self) -> Option<&[String]> {
        self.context.as_deref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Take the answer out of a finished state
    pub fn into_answer(self) -> Result<String> {
        match (self.stage, self.answer) {
            (PipelineStage::Done, Some(answer)) => Ok(answer),
            (stage, _) => Err(Error::internal(format!("no answer in stage {:?}", stage))),
        }
    }

    /// Split a finished state into its answer and context
    pub fn into_parts(self) -> Result<(String, Vec<String>)> {
        let context = self.context.clone().unwrap_or_default();
        Ok((self.into_answer()?, context))
    }
}
