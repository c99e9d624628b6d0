//! Chunked batch classification with per-chunk degradation.
//!
//! Output is positionally aligned with input no matter what the worker does:
//! a failed chunk becomes `Unavailable` placeholders, a short answer is
//! padded and an overlong one is cut, each at the chunk boundary so one bad
//! chunk can never shift the results of the next.

use std::time::Duration;

use classifier_client::{BatchResultItem, ClassifierError, JobPayload};
use tracing::{debug, info, warn};

use super::{payload, BatchApi, BatchSettings};
use crate::error::Result;
use crate::merge::merge_all;
use crate::types::{
    ClassificationOutcome, ClassificationResult, Posting, RecoverableError, RecoverableErrorKind,
    ScoreVector, Stage, StageReport,
};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

impl From<BatchResultItem> for ClassificationResult {
    fn from(item: BatchResultItem) -> Self {
        let role_scores = ScoreVector::from(item.role_scores);
        let confidence = role_scores
            .argmax()
            .and_then(|label| role_scores.get(label))
            .unwrap_or(0.0);

        ClassificationResult {
            skills: item.skills,
            summary: item.summary,
            confidence,
            role_scores,
            seniority_scores: ScoreVector::from(item.seniority_scores),
            outcome: ClassificationOutcome::Classified,
            ..Default::default()
        }
    }
}

pub struct BatchClassifier<A> {
    api: A,
    settings: BatchSettings,
}

impl<A: BatchApi> BatchClassifier<A> {
    pub fn new(api: A, settings: BatchSettings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Whether the worker answers its health probe.
    pub async fn health_check(&self) -> bool {
        match self.api.health().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Classifier health check failed");
                false
            }
        }
    }

    /// One result per posting, in input order.
    pub async fn classify(&self, postings: &[Posting]) -> (Vec<ClassificationResult>, StageReport) {
        let mut report = StageReport::new(Stage::Classify, postings.len());
        let mut results: Vec<ClassificationResult> = Vec::with_capacity(postings.len());
        let batch_size = self.settings.batch_size.max(1);

        for (index, chunk) in postings.chunks(batch_size).enumerate() {
            let start = index * batch_size;
            let range = start..start + chunk.len();
            let jobs: Vec<JobPayload> = chunk
                .iter()
                .map(|p| payload(p, self.settings.word_limit))
                .collect();

            match self.send_with_retry(&jobs).await {
                Ok(items) => {
                    if items.len() != chunk.len() {
                        warn!(
                            chunk = index,
                            expected = chunk.len(),
                            received = items.len(),
                            "Classifier returned wrong number of results"
                        );
                        report.push_error(
                            RecoverableError::new(
                                RecoverableErrorKind::ShapeMismatch,
                                format!(
                                    "chunk {}: expected {} results, received {}",
                                    index,
                                    chunk.len(),
                                    items.len()
                                ),
                            )
                            .with_range(range.clone()),
                        );
                    }

                    let mut chunk_results: Vec<ClassificationResult> = items
                        .into_iter()
                        .take(chunk.len())
                        .map(ClassificationResult::from)
                        .collect();
                    chunk_results.resize_with(chunk.len(), ClassificationResult::unavailable);
                    results.extend(chunk_results);
                }
                Err(e) => {
                    warn!(chunk = index, error = %e, "Classification batch failed, using defaults");
                    report.push_error(
                        RecoverableError::new(
                            RecoverableErrorKind::TransientRemote,
                            format!("chunk {}: {}", index, e),
                        )
                        .with_range(range),
                    );
                    results.extend((0..chunk.len()).map(|_| ClassificationResult::unavailable()));
                }
            }

            debug!(chunk = index, done = results.len(), total = postings.len(), "Processed chunk");
        }

        if results.len() < postings.len() {
            warn!(
                missing = postings.len() - results.len(),
                "Padding classification results to input length"
            );
            results.resize_with(postings.len(), ClassificationResult::unavailable);
        }

        report.output = results.len();
        report.changed = results.iter().filter(|r| r.is_classified()).count();
        (results, report)
    }

    async fn send_with_retry(
        &self,
        jobs: &[JobPayload],
    ) -> classifier_client::Result<Vec<BatchResultItem>> {
        let mut attempt: u32 = 0;
        loop {
            match self.api.classify_batch(jobs).await {
                Ok(items) => return Ok(items),
                Err(e) if attempt < self.settings.max_retries && is_retryable(&e) => {
                    let delay = self
                        .settings
                        .backoff
                        .saturating_mul(1u32 << attempt.min(16))
                        .min(MAX_BACKOFF);
                    attempt += 1;
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Retrying batch after backoff");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_retryable(error: &ClassifierError) -> bool {
    error.is_transient()
}

/// Run the batch classifier over the stage input and fold results in.
///
/// A failed health probe skips the stage: postings pass through untouched
/// and the report carries a `ServiceUnavailable` entry.
pub async fn classify_stage<A: BatchApi>(
    classifier: &BatchClassifier<A>,
    postings: Vec<Posting>,
) -> Result<(Vec<Posting>, StageReport)> {
    if !classifier.health_check().await {
        let mut report = StageReport::new(Stage::Classify, postings.len());
        report.push_error(RecoverableError::new(
            RecoverableErrorKind::ServiceUnavailable,
            "classifier health check failed, stage skipped",
        ));
        return Ok((postings, report));
    }

    info!(postings = postings.len(), batch_size = classifier.settings().batch_size, "Classifying postings");
    let (results, report) = classifier.classify(&postings).await;
    let merged = merge_all(postings, results)?;
    Ok((merged, report))
}
