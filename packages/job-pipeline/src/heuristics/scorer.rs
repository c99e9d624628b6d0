use tracing::debug;

use super::experience::{scan_experience, ExperienceScan};
use super::keywords::{any_match, count_matches};
use super::HeuristicConfig;
use crate::merge::merge_assessment;
use crate::types::{HeuristicAssessment, Posting, Seniority, Stage, StageReport, UxCategory};

/// Keyword scorer for UX relevance and seniority.
///
/// Precedence is fixed:
/// 1. A senior title or an experience requirement above
///    `max_entry_years` disqualifies the posting: score 0, `not_ux`.
/// 2. Seniority is decided separately, intern → entry → senior → unknown,
///    so "Senior UX Intern" scores 0 yet is labelled `intern`.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    config: HeuristicConfig,
}

impl HeuristicScorer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    fn normalize(&self, text: &str) -> String {
        let lowered = text.trim().to_lowercase();
        if !self.config.collapse_slashes {
            return lowered;
        }

        let chars: Vec<char> = lowered.chars().collect();
        chars
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let between_words = i > 0
                    && i + 1 < chars.len()
                    && chars[i - 1].is_alphanumeric()
                    && chars[i + 1].is_alphanumeric();
                if c == '/' && between_words {
                    ' '
                } else {
                    c
                }
            })
            .collect()
    }

    pub fn score_posting(&self, posting: &Posting) -> HeuristicAssessment {
        self.score(&posting.title, &posting.description)
    }

    pub fn score(&self, title: &str, description: &str) -> HeuristicAssessment {
        let kw = &self.config.keywords;
        let title = self.normalize(title);
        let description = self.normalize(description);
        let full_text = format!("{}\n{}", title, description);

        let experience = scan_experience(&full_text, self.config.max_entry_years);
        let senior_title = any_match(&title, &kw.senior);
        let disqualified = senior_title || experience.exceeds(self.config.max_entry_years);

        let intern = any_match(&title, &kw.intern);
        let entry_phrase = any_match(&full_text, &kw.entry);
        let seniority = if intern {
            Seniority::Intern
        } else if entry_phrase || experience.entry_friendly {
            Seniority::Entry
        } else if disqualified {
            Seniority::Senior
        } else {
            Seniority::Unknown
        };

        let score = if disqualified {
            0.0
        } else {
            self.relevance(&title, &description, &full_text, &experience)
        };

        let category = if score >= self.config.thresholds.upper {
            UxCategory::UxDesigner
        } else if score >= self.config.thresholds.lower {
            UxCategory::PossibleUx
        } else {
            UxCategory::NotUx
        };

        HeuristicAssessment {
            score,
            category,
            seniority,
            disqualified,
        }
    }

    fn relevance(
        &self,
        title: &str,
        description: &str,
        full_text: &str,
        experience: &ExperienceScan,
    ) -> f64 {
        let kw = &self.config.keywords;
        let w = &self.config.weights;
        let mut score = 0.0;

        if any_match(title, &kw.strong_title) {
            score += w.title_strong;
        }

        let title_loose = count_matches(title, &kw.loose) as f64 * w.title_loose;
        score += title_loose.min(w.title_loose_cap);

        let description_loose = count_matches(description, &kw.loose) as f64 * w.description_loose;
        score += description_loose.min(w.description_loose_cap);

        if any_match(full_text, &kw.intern) || any_match(full_text, &kw.entry) {
            score += w.entry_phrase;
        }

        if experience.entry_friendly {
            score += w.entry_experience;
        }

        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 100.0)
    }
}

/// Score every posting and fold the assessment onto it.
pub fn score_postings(
    scorer: &HeuristicScorer,
    postings: Vec<Posting>,
) -> (Vec<Posting>, StageReport) {
    let mut report = StageReport::new(Stage::Classify, postings.len());

    let scored: Vec<Posting> = postings
        .into_iter()
        .map(|posting| {
            let assessment = scorer.score_posting(&posting);
            debug!(
                title = %posting.title,
                score = assessment.score,
                category = %assessment.category,
                seniority = %assessment.seniority,
                "Scored posting"
            );
            if assessment.category != UxCategory::NotUx {
                report.changed += 1;
            }
            merge_assessment(posting, assessment)
        })
        .collect();

    report.output = scored.len();
    (scored, report)
}
