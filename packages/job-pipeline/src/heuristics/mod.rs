//! Local, rule-based relevance and seniority scoring.
//!
//! Used when no remote classifier is configured. Pure and total: any input
//! string produces an assessment with a score in `[0, 100]`.

pub mod experience;
pub mod keywords;
pub mod scorer;

pub use experience::{scan_experience, ExperienceScan};
pub use scorer::{score_postings, HeuristicScorer};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerWeights {
    /// Awarded once when any strong keyword is in the title.
    pub title_strong: f64,
    /// Per distinct loose keyword in the title.
    pub title_loose: f64,
    pub title_loose_cap: f64,
    /// Per distinct loose keyword in the description.
    pub description_loose: f64,
    pub description_loose_cap: f64,
    /// Intern or entry phrasing anywhere.
    pub entry_phrase: f64,
    /// `0-1 years`, `no experience`, ...
    pub entry_experience: f64,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            title_strong: 60.0,
            title_loose: 10.0,
            title_loose_cap: 20.0,
            description_loose: 5.0,
            description_loose_cap: 20.0,
            entry_phrase: 15.0,
            entry_experience: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// At or above: primary UX category.
    pub upper: f64,
    /// At or above (below `upper`): possible UX.
    pub lower: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            upper: 60.0,
            lower: 35.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordLists {
    pub strong_title: Vec<String>,
    pub loose: Vec<String>,
    pub intern: Vec<String>,
    pub entry: Vec<String>,
    pub senior: Vec<String>,
}

impl Default for KeywordLists {
    fn default() -> Self {
        Self {
            strong_title: keywords::owned(keywords::STRONG_TITLE_KEYWORDS),
            loose: keywords::owned(keywords::LOOSE_KEYWORDS),
            intern: keywords::owned(keywords::INTERN_KEYWORDS),
            entry: keywords::owned(keywords::ENTRY_KEYWORDS),
            senior: keywords::owned(keywords::SENIOR_KEYWORDS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicConfig {
    pub keywords: KeywordLists,
    pub weights: ScorerWeights,
    pub thresholds: Thresholds,
    /// Experience requirements above this many years disqualify a posting.
    pub max_entry_years: u32,
    /// Rewrite `ui/ux` as `ui ux` before matching.
    pub collapse_slashes: bool,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            keywords: KeywordLists::default(),
            weights: ScorerWeights::default(),
            thresholds: Thresholds::default(),
            max_entry_years: 2,
            collapse_slashes: true,
        }
    }
}
