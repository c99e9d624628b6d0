//! Remote classification.
//!
//! The stage talks to the worker through [`BatchApi`] so tests can swap in a
//! scripted fake; [`ClassifierClient`] is the production implementation.

pub mod batch;

pub use batch::{classify_stage, BatchClassifier};

use std::time::Duration;

use async_trait::async_trait;
use classifier_client::{BatchResultItem, ClassifierClient, JobPayload};

use crate::types::Posting;

/// Batch scoring endpoint plus its health probe.
#[async_trait]
pub trait BatchApi: Send + Sync {
    async fn classify_batch(
        &self,
        jobs: &[JobPayload],
    ) -> classifier_client::Result<Vec<BatchResultItem>>;

    async fn health(&self) -> classifier_client::Result<()>;
}

#[async_trait]
impl BatchApi for ClassifierClient {
    async fn classify_batch(
        &self,
        jobs: &[JobPayload],
    ) -> classifier_client::Result<Vec<BatchResultItem>> {
        ClassifierClient::classify_batch(self, jobs).await
    }

    async fn health(&self) -> classifier_client::Result<()> {
        ClassifierClient::health(self).await
    }
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Postings per request.
    pub batch_size: usize,
    /// Descriptions are cut to this many whitespace-separated words.
    pub word_limit: usize,
    /// Extra attempts for a chunk that failed with a transient error.
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt.
    pub backoff: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            word_limit: 400,
            max_retries: 0,
            backoff: Duration::from_secs(1),
        }
    }
}

impl BatchSettings {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_word_limit(mut self, word_limit: usize) -> Self {
        self.word_limit = word_limit;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }
}

/// Keep the first `limit` whitespace-separated words, single-space joined.
pub fn truncate_words(text: &str, limit: usize) -> String {
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wire payload for a posting.
pub fn payload(posting: &Posting, word_limit: usize) -> JobPayload {
    JobPayload::new(
        posting.title.clone(),
        truncate_words(&posting.description, word_limit),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_to_word_limit() {
        assert_eq!(truncate_words("a b  c\nd", 3), "a b c");
        assert_eq!(truncate_words("short", 400), "short");
        assert_eq!(truncate_words("", 5), "");
    }

    #[test]
    fn payload_carries_title_and_truncated_description() {
        let posting = Posting::new("UX Designer").with_description("one two three four");
        let job = payload(&posting, 2);
        assert_eq!(job.title, "UX Designer");
        assert_eq!(job.description, "one two");
    }
}
