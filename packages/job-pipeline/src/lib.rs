//! # Job Pipeline
//!
//! Turns raw scraped job postings into a deduplicated, classified dataset
//! ready for persistence.
//!
//! ## Stages
//!
//! 1. **Scrape** - a [`PostingSource`] returns the raw posting table
//! 2. **Clean** - descriptions go through a [`DescriptionCleaner`]
//! 3. **Identify** - every posting gets a deterministic id
//! 4. **Dedupe** - one posting per id, routing tags merged
//! 5. **Classify** - one of three strategies:
//!    - local keyword scoring ([`HeuristicScorer`])
//!    - batch score maps from the classifier worker ([`BatchClassifier`])
//!    - tag routing to specialized classifiers ([`RoutingTable`])
//! 6. **Post-filter** - drop postings that are not entry level
//! 7. **Persist** - canonical records upserted into a [`JobStore`]
//!
//! Remote failures never abort a run: they degrade the affected postings and
//! are recorded in the stage's [`StageReport`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use job_pipeline::{Pipeline, PipelineConfig, JsonFileSource, MemoryJobStore};
//! use classifier_client::ClassifierClient;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = PipelineConfig::from_env()?;
//! let client = ClassifierClient::new(config.classifier_config())?;
//! let pipeline = Pipeline::from_config(
//!     JsonFileSource::new("jobs/raw.json"),
//!     MemoryJobStore::new(),
//!     client,
//!     &config,
//! );
//!
//! let run = pipeline.run(&CancellationToken::new()).await?;
//! println!("{} records", run.records.len());
//! ```

pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod filters;
pub mod heuristics;
pub mod identity;
pub mod markdown;
pub mod merge;
pub mod pipeline;
pub mod record;
pub mod routing;
pub mod snapshot;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{PipelineError, Result};

pub use types::{
    ClassificationOutcome, ClassificationResult, HeuristicAssessment, Posting, RecoverableError,
    RecoverableErrorKind, ScoreVector, Seniority, Stage, StageReport, UxCategory,
};

pub use traits::{DescriptionCleaner, JobStore, NoopCleaner, PostingSource};

pub use classify::{classify_stage, BatchApi, BatchClassifier, BatchSettings};
pub use config::{FilterSettings, PipelineConfig, PipelineVariant};
pub use dedup::dedupe;
pub use filters::{
    apply_filters, CategoryFilter, EntryLevelFilter, FilterReport, MidAndAboveFilter,
    MissingScorePolicy, PostFilter, TitleSeniorityFilter, Verdict,
};
pub use heuristics::{score_postings, HeuristicConfig, HeuristicScorer};
pub use identity::{assign_ids, canonical_url, posting_id, IdentityStrategy};
pub use markdown::MarkdownCleaner;
pub use merge::{merge_all, merge_assessment, merge_result};
pub use pipeline::{build_filters, Pipeline, PipelineRun, RunSummary, Strategy};
pub use record::{CanonicalRecord, ClassificationFields};
pub use routing::{
    first_route, plan, route_posting, tag_route_stage, ClassifierRoute, RoutingTable,
    SpecializedClassifier,
};
pub use sources::JsonFileSource;
pub use stores::MemoryJobStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresJobStore;
