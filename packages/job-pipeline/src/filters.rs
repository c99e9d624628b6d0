//! Post-classification filters.
//!
//! Each filter decides keep/drop per posting. [`apply_filters`] runs them in
//! order and reports before/after counts for every filter.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::info;

use crate::config::PipelineVariant;
use crate::heuristics::keywords::{any_match, owned, SENIOR_KEYWORDS};
use crate::heuristics::scan_experience;
use crate::types::{ClassificationOutcome, Posting, Stage, StageReport, UxCategory};

/// Seniority label whose score the [`MidAndAboveFilter`] reads.
pub const MID_AND_ABOVE: &str = "mid and above";

lazy_static! {
    static ref ENTRY_PHRASE_REGEX: Regex = Regex::new(
        r"entry\s*-?level|\bno (?:prior )?experience\b|\b0\s*(?:years?|yrs)\b|\b0\s*(?:-|–|—|to)\s*\d+\s*(?:years?|yrs)\b|\bnew\s+grad(?:uate)?\b|\brecent\s+graduate\b"
    ).unwrap();
    static ref NON_ENTRY_REGEX: Regex = Regex::new(
        r"\b(?:mid-?level|senior|sr\.|experienced)\b"
    ).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Drop,
    /// The filter had nothing to judge by; `kept` is the policy outcome.
    Unscored { kept: bool },
}

impl Verdict {
    pub fn kept(&self) -> bool {
        match self {
            Verdict::Keep => true,
            Verdict::Drop => false,
            Verdict::Unscored { kept } => *kept,
        }
    }
}

pub trait PostFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, posting: &Posting) -> Verdict;
}

/// Drops postings whose title names a senior rank.
#[derive(Debug, Clone)]
pub struct TitleSeniorityFilter {
    keywords: Vec<String>,
}

impl Default for TitleSeniorityFilter {
    fn default() -> Self {
        Self {
            keywords: owned(SENIOR_KEYWORDS),
        }
    }
}

impl PostFilter for TitleSeniorityFilter {
    fn name(&self) -> &'static str {
        "title_seniority"
    }

    fn evaluate(&self, posting: &Posting) -> Verdict {
        if any_match(&posting.title.to_lowercase(), &self.keywords) {
            Verdict::Drop
        } else {
            Verdict::Keep
        }
    }
}

/// Drops descriptions that ask for more than `max_years` of experience.
///
/// Explicit entry phrasing ("entry level", "0-2 years", "new grad") always
/// keeps a posting; a description that says nothing either way is kept.
#[derive(Debug, Clone)]
pub struct EntryLevelFilter {
    pub max_years: u32,
}

impl Default for EntryLevelFilter {
    fn default() -> Self {
        Self { max_years: 1 }
    }
}

impl PostFilter for EntryLevelFilter {
    fn name(&self) -> &'static str {
        "entry_level"
    }

    fn evaluate(&self, posting: &Posting) -> Verdict {
        let text = posting.description.to_lowercase();
        if text.trim().is_empty() || ENTRY_PHRASE_REGEX.is_match(&text) {
            return Verdict::Keep;
        }
        if NON_ENTRY_REGEX.is_match(&text) || scan_experience(&text, self.max_years).exceeds(self.max_years) {
            return Verdict::Drop;
        }
        Verdict::Keep
    }
}

/// What to do with a posting that carries no `mid and above` score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingScorePolicy {
    #[default]
    Keep,
    Discard,
}

impl FromStr for MissingScorePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(MissingScorePolicy::Keep),
            "discard" | "drop" => Ok(MissingScorePolicy::Discard),
            other => Err(format!("unknown missing-score policy: {}", other)),
        }
    }
}

/// Score-map variant: drops postings the classifier rates above `threshold`
/// for `mid and above`.
#[derive(Debug, Clone)]
pub struct MidAndAboveFilter {
    pub threshold: f64,
    pub missing: MissingScorePolicy,
}

impl Default for MidAndAboveFilter {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            missing: MissingScorePolicy::Keep,
        }
    }
}

impl PostFilter for MidAndAboveFilter {
    fn name(&self) -> &'static str {
        "mid_and_above"
    }

    fn evaluate(&self, posting: &Posting) -> Verdict {
        let score = posting
            .classification
            .as_ref()
            .and_then(|c| c.seniority_scores.get(MID_AND_ABOVE))
            .filter(|s| !s.is_nan());

        match score {
            Some(s) if s > self.threshold => Verdict::Drop,
            Some(_) => Verdict::Keep,
            None => Verdict::Unscored {
                kept: self.missing == MissingScorePolicy::Keep,
            },
        }
    }
}

/// Drops postings a classifier explicitly placed in a rejected category.
///
/// Postings the classifier could not be asked about are kept.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    reject: HashSet<String>,
}

impl CategoryFilter {
    pub fn new<I, S>(reject: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reject: reject.into_iter().map(Into::into).collect(),
        }
    }

    pub fn for_variant(variant: PipelineVariant) -> Self {
        match variant {
            PipelineVariant::Heuristic => Self::new([UxCategory::NotUx.as_str()]),
            PipelineVariant::ScoreMap => Self::new(["other"]),
            PipelineVariant::TagRouted => Self::new([crate::types::DEFAULT_CATEGORY]),
        }
    }
}

impl PostFilter for CategoryFilter {
    fn name(&self) -> &'static str {
        "category"
    }

    fn evaluate(&self, posting: &Posting) -> Verdict {
        if let Some(h) = &posting.heuristic {
            return if self.reject.contains(h.category.as_str()) {
                Verdict::Drop
            } else {
                Verdict::Keep
            };
        }

        match &posting.classification {
            Some(c) if c.outcome == ClassificationOutcome::Unavailable => Verdict::Keep,
            Some(c) if self.reject.contains(&c.category) => Verdict::Drop,
            Some(_) => Verdict::Keep,
            None if self.reject.contains(crate::types::DEFAULT_CATEGORY) => Verdict::Drop,
            None => Verdict::Keep,
        }
    }
}

/// Counts for one filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub filter: String,
    pub input: usize,
    pub output: usize,
    pub unscored_kept: usize,
    pub unscored_dropped: usize,
}

/// Run filters in order. The stage report covers the whole chain.
pub fn apply_filters(
    postings: Vec<Posting>,
    filters: &[Box<dyn PostFilter>],
) -> (Vec<Posting>, StageReport, Vec<FilterReport>) {
    let mut report = StageReport::new(Stage::PostFilter, postings.len());
    let mut filter_reports = Vec::with_capacity(filters.len());
    let mut current = postings;

    for filter in filters {
        let mut counts = FilterReport {
            filter: filter.name().to_string(),
            input: current.len(),
            ..Default::default()
        };

        current.retain(|posting| {
            let verdict = filter.evaluate(posting);
            match verdict {
                Verdict::Unscored { kept: true } => counts.unscored_kept += 1,
                Verdict::Unscored { kept: false } => counts.unscored_dropped += 1,
                _ => {}
            }
            verdict.kept()
        });
        counts.output = current.len();

        info!(
            filter = %counts.filter,
            input = counts.input,
            output = counts.output,
            unscored_kept = counts.unscored_kept,
            unscored_dropped = counts.unscored_dropped,
            "Filtered postings"
        );
        filter_reports.push(counts);
    }

    report.output = current.len();
    (current, report, filter_reports)
}
