//! Stage execution behind the trigger endpoint.

use async_trait::async_trait;
use autobook_core::pipeline::{
    DocumentExtractor, DocumentStore, ItemOutcome, Pipeline, PipelineError, PipelineStore,
    StageType, TextGenerator,
};

/// Runs one pipeline stage over its pending items.
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Process pending items of `stage`, at most `limit` when given.
    async fn run_stage(
        &self,
        stage: StageType,
        limit: Option<usize>,
    ) -> Result<Vec<ItemOutcome>, PipelineError>;
}

#[async_trait]
impl<R, D, X, G> StageRunner for Pipeline<R, D, X, G>
where
    R: PipelineStore + 'static,
    D: DocumentStore + 'static,
    X: DocumentExtractor + 'static,
    G: TextGenerator + 'static,
{
    async fn run_stage(
        &self,
        stage: StageType,
        limit: Option<usize>,
    ) -> Result<Vec<ItemOutcome>, PipelineError> {
        self.run(stage, limit).await
    }
}
