//! Canonical records - the shape handed to the job store.
//!
//! This is the only place typed score maps and skill lists meet a flat
//! persisted schema.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::config::PipelineVariant;
use crate::types::{
    RecoverableError, RecoverableErrorKind, ScoreVector, DEFAULT_CATEGORY, Posting,
};

/// One persisted job, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub id: String,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub description: String,
    pub job_url: Option<String>,
    pub job_url_direct: Option<String>,
    pub date_posted: DateTime<Utc>,
    #[serde(flatten)]
    pub classification: ClassificationFields,
}

/// Variant-specific columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassificationFields {
    Heuristic {
        ux_score: f64,
        ux_category: Option<String>,
        seniority: Option<String>,
    },
    ScoreMap {
        role_scores: ScoreVector,
        seniority_scores: ScoreVector,
    },
    TagRouted {
        job_category: String,
        seniority: Option<String>,
        skills: Vec<String>,
        summary: String,
    },
}

impl ClassificationFields {
    fn from_posting(posting: &Posting, variant: PipelineVariant) -> Self {
        match variant {
            PipelineVariant::Heuristic => match &posting.heuristic {
                Some(h) => ClassificationFields::Heuristic {
                    ux_score: h.score,
                    ux_category: Some(h.category.as_str().to_string()),
                    seniority: Some(h.seniority.as_str().to_string()),
                },
                None => ClassificationFields::Heuristic {
                    ux_score: 0.0,
                    ux_category: None,
                    seniority: None,
                },
            },
            PipelineVariant::ScoreMap => {
                let (role_scores, seniority_scores) = posting
                    .classification
                    .as_ref()
                    .map(|c| (c.role_scores.clone(), c.seniority_scores.clone()))
                    .unwrap_or_default();
                ClassificationFields::ScoreMap {
                    role_scores,
                    seniority_scores,
                }
            }
            PipelineVariant::TagRouted => match &posting.classification {
                Some(c) => ClassificationFields::TagRouted {
                    job_category: c.category.clone(),
                    seniority: non_empty(&c.seniority),
                    skills: c.skills.clone(),
                    summary: c.summary.clone(),
                },
                None => ClassificationFields::TagRouted {
                    job_category: DEFAULT_CATEGORY.to_string(),
                    seniority: None,
                    skills: Vec::new(),
                    summary: String::new(),
                },
            },
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse the handful of date shapes scrapers produce.
pub fn parse_date_posted(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Build the persisted record for a posting.
///
/// Returns `None` for a posting that never got an id. An unparseable date is
/// replaced by `now` and reported.
pub fn to_record(
    posting: &Posting,
    variant: PipelineVariant,
    now: DateTime<Utc>,
) -> Option<(CanonicalRecord, Option<RecoverableError>)> {
    let id = posting.id.clone()?;

    let (date_posted, coercion) = match parse_date_posted(&posting.date_posted) {
        Some(date) => (date, None),
        None => {
            let error = RecoverableError::new(
                RecoverableErrorKind::InputCoercion,
                format!(
                    "job {}: date_posted {:?} unparseable, using current time",
                    id, posting.date_posted
                ),
            );
            (now, Some(error))
        }
    };

    let record = CanonicalRecord {
        id,
        title: posting.title.clone(),
        company_name: posting.company.clone(),
        location: posting.location.clone(),
        description: posting.description.clone(),
        job_url: non_empty(&posting.job_url),
        job_url_direct: non_empty(&posting.job_url_direct),
        date_posted,
        classification: ClassificationFields::from_posting(posting, variant),
    };

    Some((record, coercion))
}
