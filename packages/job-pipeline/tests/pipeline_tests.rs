//! End-to-end runs of the pipeline against fakes and a mock classifier
//! worker.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use classifier_client::{ClassifierClient, ClassifierConfig};
use job_pipeline::testing::{FakeClassifier, FakeSource};
use job_pipeline::{
    build_filters, BatchClassifier, BatchSettings, ClassificationFields, FilterSettings,
    HeuristicScorer, IdentityStrategy, JobStore, MemoryJobStore, Pipeline, PipelineError,
    PipelineVariant, Posting, PostingSource, RecoverableErrorKind, RoutingTable, Stage, Strategy,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn posting(title: &str, company: &str, description: &str) -> Posting {
    Posting::new(title)
        .with_company(company)
        .with_description(description)
        .with_date_posted("2024-01-01")
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("job-pipeline-it-{}-{}", std::process::id(), name))
}

/// Scores every job in the batch; fails any batch containing `fail_on`.
struct EchoBatch {
    fail_on: Option<&'static str>,
}

impl Respond for EchoBatch {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let jobs = body["jobs"].as_array().cloned().unwrap_or_default();

        if let Some(needle) = self.fail_on {
            if jobs.iter().any(|j| j["title"] == needle) {
                return ResponseTemplate::new(500).set_body_string("worker crashed");
            }
        }

        let results: Vec<Value> = jobs
            .iter()
            .map(|job| {
                json!({
                    "role_scores": {"ux_designer": 0.9, "other": 0.1},
                    "seniority_scores": {"entry": 0.7, "mid and above": 0.2},
                    "skills": ["Figma"],
                    "summary": job["title"],
                })
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "results": results }))
    }
}

async fn worker(fail_on: Option<&'static str>, healthy: bool) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(if healthy { 200 } else { 503 }))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(EchoBatch { fail_on })
        .mount(&server)
        .await;
    server
}

fn client(server: &MockServer) -> ClassifierClient {
    ClassifierClient::new(
        ClassifierConfig::new(server.uri()).with_request_timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

#[tokio::test]
async fn heuristic_run_scores_dedupes_and_persists() {
    let source = FakeSource::new(vec![
        posting("UX Design Intern", "Acme", "0-1 years experience, Figma").with_tag("possible_ux_product"),
        posting("ux design intern ", " ACME", "").with_tag("possible_frontend"),
        posting("Senior Product Designer", "Globex", "5+ years required"),
        posting("Warehouse Associate", "Initech", "Forklift certification"),
    ]);
    let pipeline: Pipeline<_, _, FakeClassifier> = Pipeline::new(
        source,
        MemoryJobStore::new(),
        Strategy::Heuristic(HeuristicScorer::default()),
    )
    .with_filters(build_filters(PipelineVariant::Heuristic, &FilterSettings::default()));

    let run = pipeline.run(&CancellationToken::new()).await.unwrap();

    let dedupe = run.report(Stage::Dedupe).unwrap();
    assert_eq!((dedupe.input, dedupe.output), (4, 3));

    let filtered = run.report(Stage::PostFilter).unwrap();
    assert_eq!((filtered.input, filtered.output), (3, 2));

    assert_eq!(run.records.len(), 2);
    match &run.records[0].classification {
        ClassificationFields::Heuristic {
            ux_score,
            ux_category,
            seniority,
        } => {
            assert!(*ux_score >= 60.0);
            assert_eq!(ux_category.as_deref(), Some("ux_designer"));
            assert_eq!(seniority.as_deref(), Some("intern"));
        }
        other => panic!("unexpected fields: {:?}", other),
    }
    assert_eq!(pipeline.store().count().await.unwrap(), 2);
    assert_eq!(run.summary.persisted, 2);
}

#[tokio::test]
async fn score_map_run_survives_a_failed_chunk() {
    let server = worker(Some("Designer 12"), true).await;
    let postings: Vec<Posting> = (0..25)
        .map(|i| posting(&format!("Designer {}", i), "Acme", "Figma"))
        .collect();

    let pipeline = Pipeline::new(
        FakeSource::new(postings),
        MemoryJobStore::new(),
        Strategy::ScoreMap(BatchClassifier::new(client(&server), BatchSettings::default())),
    );

    let run = pipeline.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(run.records.len(), 25);
    let classify = run.report(Stage::Classify).unwrap();
    assert_eq!(classify.output, 25);
    assert_eq!(classify.changed, 15);
    assert_eq!(classify.count_errors(RecoverableErrorKind::TransientRemote), 1);
    assert_eq!(classify.errors[0].range, Some(10..20));

    for (i, record) in run.records.iter().enumerate() {
        let ClassificationFields::ScoreMap { role_scores, .. } = &record.classification else {
            panic!("expected score-map fields");
        };
        assert_eq!(role_scores.is_empty(), (10..20).contains(&i), "record {}", i);
    }
}

#[tokio::test]
async fn unhealthy_worker_skips_classification() {
    let server = worker(None, false).await;
    let pipeline = Pipeline::new(
        FakeSource::new(vec![posting("UX Designer", "Acme", "")]),
        MemoryJobStore::new(),
        Strategy::ScoreMap(BatchClassifier::new(client(&server), BatchSettings::default())),
    );

    let run = pipeline.run(&CancellationToken::new()).await.unwrap();

    let classify = run.report(Stage::Classify).unwrap();
    assert_eq!(classify.count_errors(RecoverableErrorKind::ServiceUnavailable), 1);
    assert_eq!(run.records.len(), 1);
    assert!(matches!(
        &run.records[0].classification,
        ClassificationFields::ScoreMap { role_scores, .. } if role_scores.is_empty()
    ));
}

#[tokio::test]
async fn unhealthy_worker_skips_tag_routing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let postings: Vec<Posting> = (0..3)
        .map(|i| {
            posting(&format!("UI Engineer {}", i), "Acme", "")
                .with_tags(["possible_ux_product", "possible_frontend"])
        })
        .collect();
    let pipeline = Pipeline::new(
        FakeSource::new(postings),
        MemoryJobStore::new(),
        Strategy::TagRouted {
            table: RoutingTable::default(),
            classifier: client(&server),
            word_limit: 400,
        },
    );

    let run = pipeline.run(&CancellationToken::new()).await.unwrap();

    let classify = run.report(Stage::Classify).unwrap();
    assert_eq!(classify.count_errors(RecoverableErrorKind::ServiceUnavailable), 1);
    assert_eq!(classify.count_errors(RecoverableErrorKind::TransientRemote), 0);
    assert_eq!(run.records.len(), 3);
    assert!(run.records.iter().all(|r| matches!(
        &r.classification,
        ClassificationFields::TagRouted { job_category, .. } if job_category == "Other"
    )));
    server.verify().await;
}

#[tokio::test]
async fn tag_routed_run_uses_first_accepting_classifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/classify-ux-product"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/classify-frontend"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_match": true,
            "seniority": "entry",
            "skills": ["React", "CSS"],
            "summary": "Work as a frontend engineer."
        })))
        .mount(&server)
        .await;

    let source = FakeSource::new(vec![
        posting("UI Engineer", "Acme", "")
            .with_tags(["possible_ux_product", "possible_frontend"]),
        posting("Accountant", "Acme", ""),
    ]);
    let pipeline = Pipeline::new(
        source,
        MemoryJobStore::new(),
        Strategy::TagRouted {
            table: RoutingTable::default(),
            classifier: client(&server),
            word_limit: 400,
        },
    );

    let run = pipeline.run(&CancellationToken::new()).await.unwrap();

    let classify = run.report(Stage::Classify).unwrap();
    assert_eq!(classify.changed, 1);
    assert_eq!(classify.count_errors(RecoverableErrorKind::TransientRemote), 1);

    let fields: Vec<_> = run
        .records
        .iter()
        .map(|r| match &r.classification {
            ClassificationFields::TagRouted { job_category, .. } => job_category.as_str(),
            _ => "",
        })
        .collect();
    assert_eq!(fields, vec!["Frontend/UXE", "Other"]);
}

#[tokio::test]
async fn url_first_identity_merges_reposts() {
    let source = FakeSource::new(vec![
        posting("Designer", "Acme", "").with_job_url("https://jobs.example.com/1").with_tag("a"),
        posting("Product Designer", "Acme Inc", "")
            .with_job_url("https://JOBS.example.com/1#apply")
            .with_tag("b"),
    ]);
    let pipeline: Pipeline<_, _, FakeClassifier> = Pipeline::new(
        source,
        MemoryJobStore::new(),
        Strategy::Heuristic(HeuristicScorer::default()),
    )
    .with_identity(IdentityStrategy::UrlFirst);

    let run = pipeline.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(run.records.len(), 1);
    assert_eq!(run.records[0].id, "https://jobs.example.com/1");
    assert_eq!(run.records[0].title, "Designer");
}

#[tokio::test]
async fn bad_dates_are_coerced_and_reported() {
    let source = FakeSource::new(vec![Posting::new("UX Intern").with_date_posted("yesterday")]);
    let pipeline: Pipeline<_, _, FakeClassifier> = Pipeline::new(
        source,
        MemoryJobStore::new(),
        Strategy::Heuristic(HeuristicScorer::default()),
    );

    let run = pipeline.run(&CancellationToken::new()).await.unwrap();

    let persist = run.report(Stage::Persist).unwrap();
    assert_eq!(persist.count_errors(RecoverableErrorKind::InputCoercion), 1);
    assert_eq!(run.records.len(), 1);
}

#[tokio::test]
async fn source_failure_is_a_scrape_stage_error() {
    let pipeline: Pipeline<_, _, FakeClassifier> = Pipeline::new(
        FakeSource::failing(),
        MemoryJobStore::new(),
        Strategy::Heuristic(HeuristicScorer::default()),
    );

    let err = pipeline.run(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Stage { stage: Stage::Scrape, .. }));
}

#[tokio::test]
async fn cancelled_before_start_does_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let pipeline: Pipeline<_, _, FakeClassifier> = Pipeline::new(
        FakeSource::new(vec![Posting::new("UX Intern")]),
        MemoryJobStore::new(),
        Strategy::Heuristic(HeuristicScorer::default()),
    );

    let err = pipeline.run(&cancel).await.unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled));
    assert_eq!(pipeline.store().count().await.unwrap(), 0);
}

/// Requests cancellation while the scrape stage is running.
struct CancellingSource {
    cancel: CancellationToken,
    postings: Vec<Posting>,
}

#[async_trait]
impl PostingSource for CancellingSource {
    async fn fetch(&self) -> job_pipeline::Result<Vec<Posting>> {
        self.cancel.cancel();
        Ok(self.postings.clone())
    }
}

#[tokio::test]
async fn cancellation_between_stages_keeps_written_snapshots() {
    let dir = temp_dir("cancel");
    let cancel = CancellationToken::new();
    let source = CancellingSource {
        cancel: cancel.clone(),
        postings: vec![Posting::new("UX Intern").with_company("Acme")],
    };
    let pipeline: Pipeline<_, _, FakeClassifier> = Pipeline::new(
        source,
        MemoryJobStore::new(),
        Strategy::Heuristic(HeuristicScorer::default()),
    )
    .with_snapshot_dir(&dir);

    let err = pipeline.run(&cancel).await.unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled));
    assert!(dir.join("raw_jobs.json").exists());
    assert!(!dir.join("classified_jobs.json").exists());
    assert_eq!(pipeline.store().count().await.unwrap(), 0);
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn snapshots_written_for_full_run() {
    let dir = temp_dir("full");
    let pipeline: Pipeline<_, _, FakeClassifier> = Pipeline::new(
        FakeSource::new(vec![Posting::new("UX Intern").with_description(r"3\+ years")]),
        MemoryJobStore::new(),
        Strategy::Heuristic(HeuristicScorer::default()),
    )
    .with_snapshot_dir(&dir);

    pipeline.run(&CancellationToken::new()).await.unwrap();

    let raw: Vec<Posting> =
        serde_json::from_slice(&tokio::fs::read(dir.join("raw_jobs.json")).await.unwrap()).unwrap();
    let classified: Vec<Posting> = serde_json::from_slice(
        &tokio::fs::read(dir.join("classified_jobs.json")).await.unwrap(),
    )
    .unwrap();

    assert_eq!(raw[0].description, r"3\+ years");
    assert_eq!(classified[0].description, "3+ years");
    assert!(classified[0].id.is_some());
    assert!(classified[0].heuristic.is_some());
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
