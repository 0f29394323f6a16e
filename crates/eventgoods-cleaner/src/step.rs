//! Step-provider adapter for the clean/merge pass.

use async_trait::async_trait;

use eventgoods_batch::{RunInstant, StepError, StepProvider};

use crate::cleaner::{CleanerConfig, clean_and_merge};

/// Runs the clean/merge pass as a post-processing step of the batch
/// pipeline, after every scrape source has written its artifact.
pub struct CleanMergeStep {
    config: CleanerConfig,
}

impl CleanMergeStep {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StepProvider for CleanMergeStep {
    fn name(&self) -> &str {
        "clean_and_merge"
    }

    async fn run(&self, _as_of: RunInstant) -> Result<(), StepError> {
        clean_and_merge(&self.config)
            .map(|_| ())
            .map_err(|error| StepError::new(error.to_string()))
    }
}
