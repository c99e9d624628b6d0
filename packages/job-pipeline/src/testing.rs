//! Testing utilities including fake collaborators.
//!
//! These let applications and the crate's own tests drive the pipeline
//! without a running classifier worker or scraper.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use classifier_client::{BatchResultItem, ClassifierError, JobPayload, MatchResponse};
use indexmap::IndexMap;

use crate::classify::BatchApi;
use crate::error::{PipelineError, Result};
use crate::routing::SpecializedClassifier;
use crate::traits::PostingSource;
use crate::types::Posting;

/// How the fake misbehaves on a given batch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFault {
    /// Answer with this HTTP status.
    Fail(u16),
    /// Answer with this many fewer results than jobs.
    Drop(usize),
    /// Answer with this many surplus results.
    Extra(usize),
    /// Answer with a body lacking `results`.
    MissingResults,
}

/// Record of a call made to the fake classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    Health,
    Batch { jobs: Vec<JobPayload> },
    Job { endpoint: String, title: String },
}

/// A scripted stand-in for the classifier worker.
///
/// Batch scoring is deterministic: titles mentioning "ux" or "design" lean
/// `ux_designer`, titles mentioning "frontend" lean `frontend`, and titles
/// mentioning "senior" lean `mid and above`. Each result's summary echoes
/// the job title, so tests can check alignment.
#[derive(Default)]
pub struct FakeClassifier {
    unhealthy: bool,
    /// Faults keyed by zero-based batch call index (retries count)
    batch_faults: HashMap<usize, BatchFault>,
    /// endpoint → (title substring, response)
    matches: HashMap<String, Vec<(String, MatchResponse)>>,
    failing_endpoints: HashSet<String>,
    calls: Arc<RwLock<Vec<FakeCall>>>,
}

impl FakeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A worker whose health probe fails.
    pub fn unhealthy() -> Self {
        Self {
            unhealthy: true,
            ..Default::default()
        }
    }

    pub fn with_batch_fault(mut self, call: usize, fault: BatchFault) -> Self {
        self.batch_faults.insert(call, fault);
        self
    }

    /// Accept jobs whose title contains `needle` at `endpoint`.
    pub fn with_match(
        mut self,
        endpoint: impl Into<String>,
        needle: impl Into<String>,
        response: MatchResponse,
    ) -> Self {
        self.matches
            .entry(endpoint.into())
            .or_default()
            .push((needle.into(), response));
        self
    }

    pub fn with_failing_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.failing_endpoints.insert(endpoint.into());
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn batch_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, FakeCall::Batch { .. }))
            .count()
    }

    /// Endpoints hit by single-job calls, in order.
    pub fn job_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Job { endpoint, .. } => Some(endpoint),
                _ => None,
            })
            .collect()
    }

    /// Every description sent in batch calls, in order.
    pub fn sent_descriptions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Batch { jobs } => Some(jobs),
                _ => None,
            })
            .flatten()
            .map(|job| job.description)
            .collect()
    }

    fn check_health(&self) -> classifier_client::Result<()> {
        self.record(FakeCall::Health);
        if self.unhealthy {
            return Err(ClassifierError::Api {
                status: 503,
                message: "unavailable".into(),
            });
        }
        Ok(())
    }

    fn record(&self, call: FakeCall) {
        self.calls.write().unwrap().push(call);
    }

    fn score(job: &JobPayload) -> BatchResultItem {
        let title = job.title.to_lowercase();
        let ux = title.contains("ux") || title.contains("design");
        let frontend = title.contains("frontend");
        let senior = title.contains("senior");

        let mut role_scores = IndexMap::new();
        role_scores.insert("ux_designer".to_string(), if ux { 0.9 } else { 0.1 });
        role_scores.insert("frontend".to_string(), if frontend { 0.8 } else { 0.05 });

        let mut seniority_scores = IndexMap::new();
        seniority_scores.insert("entry".to_string(), if senior { 0.2 } else { 0.7 });
        seniority_scores.insert("mid and above".to_string(), if senior { 0.8 } else { 0.3 });

        BatchResultItem {
            role_scores,
            seniority_scores,
            skills: Vec::new(),
            summary: job.title.clone(),
        }
    }
}

#[async_trait]
impl BatchApi for FakeClassifier {
    async fn classify_batch(
        &self,
        jobs: &[JobPayload],
    ) -> classifier_client::Result<Vec<BatchResultItem>> {
        let index = self.batch_calls();
        self.record(FakeCall::Batch {
            jobs: jobs.to_vec(),
        });

        let mut results: Vec<BatchResultItem> = jobs.iter().map(Self::score).collect();
        match self.batch_faults.get(&index) {
            None => {}
            Some(BatchFault::Fail(status)) => {
                return Err(ClassifierError::Api {
                    status: *status,
                    message: "scripted failure".into(),
                })
            }
            Some(BatchFault::MissingResults) => {
                return Err(ClassifierError::Parse(
                    "Failed to deserialize response: missing field `results`".into(),
                ))
            }
            Some(BatchFault::Drop(n)) => {
                results.truncate(jobs.len().saturating_sub(*n));
            }
            Some(BatchFault::Extra(n)) => {
                results.extend((0..*n).map(|_| BatchResultItem {
                    summary: "surplus".into(),
                    ..Default::default()
                }));
            }
        }
        Ok(results)
    }

    async fn health(&self) -> classifier_client::Result<()> {
        self.check_health()
    }
}

#[async_trait]
impl SpecializedClassifier for FakeClassifier {
    async fn classify_job(
        &self,
        endpoint: &str,
        job: &JobPayload,
    ) -> classifier_client::Result<MatchResponse> {
        self.record(FakeCall::Job {
            endpoint: endpoint.to_string(),
            title: job.title.clone(),
        });

        if self.failing_endpoints.contains(endpoint) {
            return Err(ClassifierError::Api {
                status: 500,
                message: "scripted failure".into(),
            });
        }

        let response = self
            .matches
            .get(endpoint)
            .and_then(|rules| {
                rules
                    .iter()
                    .find(|(needle, _)| job.title.contains(needle.as_str()))
            })
            .map(|(_, response)| response.clone())
            .unwrap_or(MatchResponse {
                is_match: Some(false),
                ..Default::default()
            });
        Ok(response)
    }

    async fn health(&self) -> classifier_client::Result<()> {
        self.check_health()
    }
}

/// A posting source serving a fixed table, or failing on demand.
#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    postings: Vec<Posting>,
    fail: bool,
}

impl FakeSource {
    pub fn new(postings: Vec<Posting>) -> Self {
        Self {
            postings,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            postings: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl PostingSource for FakeSource {
    async fn fetch(&self) -> Result<Vec<Posting>> {
        if self.fail {
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "scripted source failure",
            )));
        }
        Ok(self.postings.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}
