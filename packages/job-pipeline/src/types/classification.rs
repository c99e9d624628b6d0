use serde::{Deserialize, Serialize};

use super::score::ScoreVector;

/// Category a posting keeps until some classifier says otherwise. Routed
/// postings whose classifiers all failed keep it too, so a routed run only
/// ever persists route categories or this one.
pub const DEFAULT_CATEGORY: &str = "Other";
/// Category of a batch placeholder: the worker was never asked, so no score
/// map backs any label.
pub const UNKNOWN_CATEGORY: &str = "unknown";
/// Seniority a posting keeps until some classifier says otherwise.
pub const UNKNOWN_SENIORITY: &str = "unknown";

/// How a [`ClassificationResult`] came to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// Never evaluated (no routing tags, or stage skipped).
    #[default]
    Unclassified,
    /// A classifier accepted the posting.
    Classified,
    /// Classifiers ran and none accepted the posting.
    NoMatch,
    /// The classifier could not be reached for this posting.
    Unavailable,
}

/// Output of a remote classifier, folded onto a posting by the merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    pub seniority: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub summary: String,
    /// Routing tag whose classifier accepted the posting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "ScoreVector::is_empty")]
    pub role_scores: ScoreVector,
    #[serde(default, skip_serializing_if = "ScoreVector::is_empty")]
    pub seniority_scores: ScoreVector,
    #[serde(default)]
    pub outcome: ClassificationOutcome,
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            seniority: UNKNOWN_SENIORITY.to_string(),
            skills: Vec::new(),
            summary: String::new(),
            matched_by: None,
            confidence: 0.0,
            role_scores: ScoreVector::new(),
            seniority_scores: ScoreVector::new(),
            outcome: ClassificationOutcome::Unclassified,
        }
    }
}

impl ClassificationResult {
    /// Placeholder for a posting the batch classifier could not be asked
    /// about.
    pub fn unavailable() -> Self {
        Self {
            category: UNKNOWN_CATEGORY.to_string(),
            outcome: ClassificationOutcome::Unavailable,
            ..Default::default()
        }
    }

    /// Placeholder for a posting every eligible classifier turned down.
    pub fn no_match() -> Self {
        Self {
            outcome: ClassificationOutcome::NoMatch,
            ..Default::default()
        }
    }

    pub fn is_classified(&self) -> bool {
        self.outcome == ClassificationOutcome::Classified
    }
}

/// Relevance band assigned by the heuristic scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UxCategory {
    UxDesigner,
    PossibleUx,
    NotUx,
}

impl UxCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UxCategory::UxDesigner => "ux_designer",
            UxCategory::PossibleUx => "possible_ux",
            UxCategory::NotUx => "not_ux",
        }
    }
}

impl std::fmt::Display for UxCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Intern,
    Entry,
    Senior,
    Unknown,
}

impl Seniority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Seniority::Intern => "intern",
            Seniority::Entry => "entry",
            Seniority::Senior => "senior",
            Seniority::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Seniority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of local keyword scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicAssessment {
    /// Relevance in `[0, 100]`.
    pub score: f64,
    pub category: UxCategory,
    pub seniority: Seniority,
    /// Senior title or experience requirement short-circuited scoring.
    pub disqualified: bool,
}
