//! Pipeline orchestration: scrape → clean → identify → dedupe → classify →
//! post-filter → persist.
//!
//! Stages run strictly in sequence, each consuming the previous stage's
//! postings. Cancellation is honoured only between stages.

use std::path::PathBuf;

use chrono::Utc;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::classify::{classify_stage, BatchApi, BatchClassifier, BatchSettings};
use crate::config::{FilterSettings, PipelineConfig, PipelineVariant};
use crate::dedup::dedupe;
use crate::error::{PipelineError, Result};
use crate::filters::{
    apply_filters, CategoryFilter, EntryLevelFilter, FilterReport, MidAndAboveFilter, PostFilter,
    TitleSeniorityFilter,
};
use crate::heuristics::{score_postings, HeuristicScorer};
use crate::identity::{assign_ids, IdentityStrategy};
use crate::markdown::MarkdownCleaner;
use crate::record::{to_record, CanonicalRecord};
use crate::routing::{tag_route_stage, RoutingTable, SpecializedClassifier};
use crate::snapshot::{write_snapshot, CLASSIFIED_SNAPSHOT, RAW_SNAPSHOT};
use crate::traits::{DescriptionCleaner, JobStore, PostingSource};
use crate::types::{Posting, Stage, StageReport, UNKNOWN_SENIORITY};

/// How postings get classified.
pub enum Strategy<A> {
    Heuristic(HeuristicScorer),
    ScoreMap(BatchClassifier<A>),
    TagRouted {
        table: RoutingTable,
        classifier: A,
        word_limit: usize,
    },
}

impl<A> Strategy<A>
where
    A: BatchApi + SpecializedClassifier,
{
    /// The strategy `variant` calls for, talking to `api` where remote.
    pub fn for_variant(variant: PipelineVariant, api: A, batch: BatchSettings) -> Self {
        match variant {
            PipelineVariant::Heuristic => Strategy::Heuristic(HeuristicScorer::default()),
            PipelineVariant::ScoreMap => Strategy::ScoreMap(BatchClassifier::new(api, batch)),
            PipelineVariant::TagRouted => Strategy::TagRouted {
                table: RoutingTable::default(),
                classifier: api,
                word_limit: batch.word_limit,
            },
        }
    }

    pub fn variant(&self) -> PipelineVariant {
        match self {
            Strategy::Heuristic(_) => PipelineVariant::Heuristic,
            Strategy::ScoreMap(_) => PipelineVariant::ScoreMap,
            Strategy::TagRouted { .. } => PipelineVariant::TagRouted,
        }
    }

    async fn run(&self, postings: Vec<Posting>) -> Result<(Vec<Posting>, StageReport)> {
        match self {
            Strategy::Heuristic(scorer) => Ok(score_postings(scorer, postings)),
            Strategy::ScoreMap(classifier) => classify_stage(classifier, postings).await,
            Strategy::TagRouted {
                table,
                classifier,
                word_limit,
            } => Ok(tag_route_stage(postings, table, classifier, *word_limit).await),
        }
    }
}

/// Post-filters for a variant, in the order they run.
pub fn build_filters(variant: PipelineVariant, settings: &FilterSettings) -> Vec<Box<dyn PostFilter>> {
    let mut filters: Vec<Box<dyn PostFilter>> = Vec::new();
    if settings.title_seniority {
        filters.push(Box::new(TitleSeniorityFilter::default()));
    }
    if settings.entry_level {
        filters.push(Box::new(EntryLevelFilter::default()));
    }
    if variant == PipelineVariant::ScoreMap {
        filters.push(Box::new(MidAndAboveFilter {
            threshold: settings.mid_and_above_threshold,
            missing: settings.missing_score_policy,
        }));
    }
    if settings.category {
        filters.push(Box::new(CategoryFilter::for_variant(variant)));
    }
    filters
}

/// Per-label counts over the persisted records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub by_category: IndexMap<String, usize>,
    pub by_seniority: IndexMap<String, usize>,
    pub persisted: usize,
}

impl RunSummary {
    fn from_postings(postings: &[Posting], persisted: usize) -> Self {
        let mut summary = RunSummary {
            persisted,
            ..Default::default()
        };

        for posting in postings {
            let (category, seniority) = match (&posting.heuristic, &posting.classification) {
                (Some(h), _) => (h.category.as_str().to_string(), h.seniority.as_str().to_string()),
                (None, Some(c)) => (c.category.clone(), c.seniority.clone()),
                (None, None) => (
                    crate::types::DEFAULT_CATEGORY.to_string(),
                    UNKNOWN_SENIORITY.to_string(),
                ),
            };
            *summary.by_category.entry(category).or_default() += 1;
            *summary.by_seniority.entry(seniority).or_default() += 1;
        }

        summary
    }

    pub fn log(&self) {
        for (category, count) in &self.by_category {
            info!(category = %category, count, "Category total");
        }
        for (seniority, count) in &self.by_seniority {
            info!(seniority = %seniority, count, "Seniority total");
        }
        info!(persisted = self.persisted, "Run complete");
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineRun {
    pub records: Vec<CanonicalRecord>,
    pub reports: Vec<StageReport>,
    pub filter_reports: Vec<FilterReport>,
    pub summary: RunSummary,
}

impl PipelineRun {
    pub fn report(&self, stage: Stage) -> Option<&StageReport> {
        self.reports.iter().find(|r| r.stage == stage)
    }
}

pub struct Pipeline<S, St, A> {
    source: S,
    store: St,
    strategy: Strategy<A>,
    cleaner: Box<dyn DescriptionCleaner>,
    identity: IdentityStrategy,
    filters: Vec<Box<dyn PostFilter>>,
    snapshot_dir: Option<PathBuf>,
}

impl<S, St, A> Pipeline<S, St, A>
where
    S: PostingSource,
    St: JobStore,
    A: BatchApi + SpecializedClassifier,
{
    /// A pipeline with the markdown cleaner, field identity, no filters and
    /// no snapshots.
    pub fn new(source: S, store: St, strategy: Strategy<A>) -> Self {
        Self {
            source,
            store,
            strategy,
            cleaner: Box::new(MarkdownCleaner::new()),
            identity: IdentityStrategy::default(),
            filters: Vec::new(),
            snapshot_dir: None,
        }
    }

    /// A pipeline set up the way `config` describes.
    pub fn from_config(source: S, store: St, api: A, config: &PipelineConfig) -> Self {
        let strategy = Strategy::for_variant(config.variant, api, config.batch.clone());
        Self::new(source, store, strategy)
            .with_identity(config.identity)
            .with_filters(build_filters(config.variant, &config.filters))
            .with_snapshot_dir(config.snapshot_dir.clone())
    }

    pub fn with_cleaner(mut self, cleaner: impl DescriptionCleaner + 'static) -> Self {
        self.cleaner = Box::new(cleaner);
        self
    }

    pub fn with_identity(mut self, identity: IdentityStrategy) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_filters(mut self, filters: Vec<Box<dyn PostFilter>>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn variant(&self) -> PipelineVariant {
        self.strategy.variant()
    }

    async fn snapshot(&self, stage: Stage, name: &str, postings: &[Posting]) -> Result<()> {
        if let Some(dir) = &self.snapshot_dir {
            write_snapshot(dir, name, postings)
                .await
                .map_err(|e| PipelineError::stage(stage, e))?;
        }
        Ok(())
    }

    /// Run every stage once.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<PipelineRun> {
        let mut reports = Vec::new();
        let checkpoint = || {
            if cancel.is_cancelled() {
                info!("Cancellation requested, stopping between stages");
                Err(PipelineError::Cancelled)
            } else {
                Ok(())
            }
        };

        // 1. Scrape
        checkpoint()?;
        info!(source = self.source.name(), variant = %self.variant(), "Fetching postings");
        let postings = self
            .source
            .fetch()
            .await
            .map_err(|e| PipelineError::stage(Stage::Scrape, e))?;
        let mut report = StageReport::new(Stage::Scrape, 0);
        report.output = postings.len();
        report.log();
        reports.push(report);
        self.snapshot(Stage::Scrape, RAW_SNAPSHOT, &postings).await?;

        // 2. Clean
        checkpoint()?;
        let mut report = StageReport::new(Stage::Clean, postings.len());
        let postings: Vec<Posting> = postings
            .into_iter()
            .map(|mut posting| {
                let cleaned = self.cleaner.clean(&posting.description);
                if cleaned != posting.description {
                    report.changed += 1;
                    posting.description = cleaned;
                }
                posting
            })
            .collect();
        report.log();
        reports.push(report);

        // 3. Identify
        checkpoint()?;
        let postings = assign_ids(postings, self.identity);
        let mut report = StageReport::new(Stage::Identify, postings.len());
        report.changed = postings.len();
        report.log();
        reports.push(report);

        // 4. Dedupe
        checkpoint()?;
        let (postings, report) = dedupe(postings);
        report.log();
        reports.push(report);

        // 5. Classify
        checkpoint()?;
        let (postings, report) = self.strategy.run(postings).await?;
        report.log();
        reports.push(report);
        self.snapshot(Stage::Classify, CLASSIFIED_SNAPSHOT, &postings).await?;

        // 6. Post-filter
        checkpoint()?;
        let (postings, report, filter_reports) = apply_filters(postings, &self.filters);
        report.log();
        reports.push(report);

        // 7. Persist
        checkpoint()?;
        let now = Utc::now();
        let variant = self.variant();
        let mut report = StageReport::new(Stage::Persist, postings.len());
        let mut records = Vec::with_capacity(postings.len());
        for posting in &postings {
            if let Some((record, coercion)) = to_record(posting, variant, now) {
                if let Some(error) = coercion {
                    report.changed += 1;
                    report.push_error(error);
                }
                records.push(record);
            }
        }
        let persisted = self
            .store
            .upsert(&records)
            .await
            .map_err(|e| PipelineError::stage(Stage::Persist, e))?;
        report.output = persisted;
        report.log();
        reports.push(report);

        let summary = RunSummary::from_postings(&postings, persisted);
        summary.log();

        Ok(PipelineRun {
            records,
            reports,
            filter_reports,
            summary,
        })
    }
}
