//! Tag routing to specialized single-job classifiers.
//!
//! Upstream searches attach tags such as `possible_frontend` to the postings
//! they return. Each known tag maps to one classifier endpoint; a posting is
//! offered to the endpoints of its tags in tag order until one accepts it.

use async_trait::async_trait;
use classifier_client::{ClassifierClient, JobPayload, MatchResponse};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::classify::payload;
use crate::merge::merge_result;
use crate::types::{
    ClassificationOutcome, ClassificationResult, Posting, RecoverableError, RecoverableErrorKind,
    Stage, StageReport, UNKNOWN_SENIORITY,
};

/// A single-job classifier endpoint.
#[async_trait]
pub trait SpecializedClassifier: Send + Sync {
    async fn classify_job(
        &self,
        endpoint: &str,
        job: &JobPayload,
    ) -> classifier_client::Result<MatchResponse>;

    /// Whether the endpoints can be reached at all.
    async fn health(&self) -> classifier_client::Result<()>;
}

#[async_trait]
impl SpecializedClassifier for ClassifierClient {
    async fn classify_job(
        &self,
        endpoint: &str,
        job: &JobPayload,
    ) -> classifier_client::Result<MatchResponse> {
        ClassifierClient::classify_job(self, endpoint, job).await
    }

    async fn health(&self) -> classifier_client::Result<()> {
        ClassifierClient::health(self).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierRoute {
    pub endpoint: String,
    /// Category written onto a posting this classifier accepts.
    pub category: String,
}

impl ClassifierRoute {
    pub fn new(endpoint: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            category: category.into(),
        }
    }
}

/// Ordered tag → classifier table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    routes: IndexMap<String, ClassifierRoute>,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::empty()
            .with_route(
                "possible_ux_product",
                ClassifierRoute::new("/classify-ux-product", "UX/Product Design"),
            )
            .with_route(
                "possible_frontend",
                ClassifierRoute::new("/classify-frontend", "Frontend/UXE"),
            )
    }
}

impl RoutingTable {
    pub fn empty() -> Self {
        Self {
            routes: IndexMap::new(),
        }
    }

    pub fn with_route(mut self, tag: impl Into<String>, route: ClassifierRoute) -> Self {
        self.routes.insert(tag.into(), route);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&ClassifierRoute> {
        self.routes.get(tag)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Routed tags in posting order; tags without a route are skipped.
pub fn plan<'a>(tags: &'a IndexSet<String>, table: &'a RoutingTable) -> Vec<(&'a str, &'a ClassifierRoute)> {
    tags.iter()
        .filter_map(|tag| table.get(tag).map(|route| (tag.as_str(), route)))
        .collect()
}

pub fn first_route<'a>(
    tags: &'a IndexSet<String>,
    table: &'a RoutingTable,
) -> Option<(&'a str, &'a ClassifierRoute)> {
    tags.iter()
        .find_map(|tag| table.get(tag).map(|route| (tag.as_str(), route)))
}

fn matched_result(tag: &str, route: &ClassifierRoute, response: MatchResponse) -> ClassificationResult {
    ClassificationResult {
        category: route.category.clone(),
        seniority: response
            .seniority
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SENIORITY.to_string()),
        skills: response.skills.unwrap_or_default(),
        summary: response.summary.unwrap_or_default(),
        matched_by: Some(tag.to_string()),
        confidence: response.confidence.unwrap_or(1.0),
        outcome: ClassificationOutcome::Classified,
        ..Default::default()
    }
}

/// Offer a posting to its routed classifiers, stopping at the first match.
///
/// Failed calls count as "no" and come back as recoverable errors. A posting
/// with no routable tags is left `Unclassified`; one whose every call failed
/// is `Unavailable`.
pub async fn route_posting<C: SpecializedClassifier + ?Sized>(
    posting: &Posting,
    table: &RoutingTable,
    classifier: &C,
    word_limit: usize,
) -> (ClassificationResult, Vec<RecoverableError>) {
    let routes = plan(&posting.tags, table);
    if routes.is_empty() {
        return (ClassificationResult::default(), Vec::new());
    }

    let job = payload(posting, word_limit);
    let mut errors = Vec::new();
    let mut answered = false;

    for (tag, route) in &routes {
        match classifier.classify_job(&route.endpoint, &job).await {
            Ok(response) if response.matched() => {
                debug!(title = %posting.title, tag, category = %route.category, "Classifier accepted posting");
                return (matched_result(tag, route, response), errors);
            }
            Ok(_) => {
                answered = true;
                debug!(title = %posting.title, tag, "Classifier declined posting");
            }
            Err(e) => {
                warn!(title = %posting.title, endpoint = %route.endpoint, error = %e, "Specialized classifier failed");
                errors.push(RecoverableError::new(
                    RecoverableErrorKind::TransientRemote,
                    format!("{} ({}): {}", route.endpoint, posting.title, e),
                ));
            }
        }
    }

    let outcome = if answered {
        ClassificationOutcome::NoMatch
    } else {
        ClassificationOutcome::Unavailable
    };
    let result = ClassificationResult {
        outcome,
        ..Default::default()
    };
    (result, errors)
}

/// Route every posting and fold the results in.
///
/// A failed health probe skips the stage: postings pass through untouched
/// and the report carries a single `ServiceUnavailable` entry.
pub async fn tag_route_stage<C: SpecializedClassifier + ?Sized>(
    postings: Vec<Posting>,
    table: &RoutingTable,
    classifier: &C,
    word_limit: usize,
) -> (Vec<Posting>, StageReport) {
    let mut report = StageReport::new(Stage::Classify, postings.len());

    if let Err(e) = classifier.health().await {
        warn!(error = %e, "Classifier health check failed, skipping tag routing");
        report.push_error(RecoverableError::new(
            RecoverableErrorKind::ServiceUnavailable,
            format!("classifier health check failed, stage skipped: {}", e),
        ));
        return (postings, report);
    }

    let mut routed = Vec::with_capacity(postings.len());

    for (index, posting) in postings.into_iter().enumerate() {
        let (result, errors) = route_posting(&posting, table, classifier, word_limit).await;
        for error in errors {
            report.push_error(error.with_range(index..index + 1));
        }
        if result.is_classified() {
            report.changed += 1;
        }
        routed.push(merge_result(posting, result));
    }

    report.output = routed.len();
    (routed, report)
}
