//! Folding classifier output back onto postings.

use crate::error::{PipelineError, Result};
use crate::types::{ClassificationResult, HeuristicAssessment, Posting};

/// Fill `category` / `seniority` from the score maps when they carry any.
fn derive_labels(mut result: ClassificationResult) -> ClassificationResult {
    if let Some(role) = result.role_scores.argmax() {
        result.category = role.to_string();
    }
    if let Some(seniority) = result.seniority_scores.argmax() {
        result.seniority = seniority.to_string();
    }
    result
}

/// Attach a classification result to a posting.
///
/// A posting that already holds a successful classification keeps it; the
/// first success is final.
pub fn merge_result(mut posting: Posting, result: ClassificationResult) -> Posting {
    let keep_existing = posting
        .classification
        .as_ref()
        .is_some_and(ClassificationResult::is_classified);

    if !keep_existing {
        posting.classification = Some(derive_labels(result));
    }
    posting
}

pub fn merge_assessment(mut posting: Posting, assessment: HeuristicAssessment) -> Posting {
    posting.heuristic = Some(assessment);
    posting
}

/// Pair postings with batch results positionally.
pub fn merge_all(postings: Vec<Posting>, results: Vec<ClassificationResult>) -> Result<Vec<Posting>> {
    if postings.len() != results.len() {
        return Err(PipelineError::LengthMismatch {
            postings: postings.len(),
            results: results.len(),
        });
    }

    Ok(postings
        .into_iter()
        .zip(results)
        .map(|(posting, result)| merge_result(posting, result))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassificationOutcome, Seniority, UxCategory};

    fn scored(roles: &[(&str, f64)], seniority: &[(&str, f64)]) -> ClassificationResult {
        ClassificationResult {
            role_scores: roles.iter().map(|(k, v)| (*k, *v)).collect(),
            seniority_scores: seniority.iter().map(|(k, v)| (*k, *v)).collect(),
            outcome: ClassificationOutcome::Classified,
            ..Default::default()
        }
    }

    #[test]
    fn derives_labels_from_argmax() {
        let posting = merge_result(
            Posting::new("Designer"),
            scored(
                &[("frontend", 0.2), ("ux_designer", 0.9)],
                &[("entry", 0.7), ("mid and above", 0.3)],
            ),
        );

        let c = posting.classification.unwrap();
        assert_eq!(c.category, "ux_designer");
        assert_eq!(c.seniority, "entry");
    }

    #[test]
    fn empty_score_maps_keep_defaults() {
        let posting = merge_result(Posting::new("Designer"), ClassificationResult::unavailable());
        let c = posting.classification.unwrap();
        assert_eq!(c.category, crate::types::UNKNOWN_CATEGORY);
        assert_eq!(c.outcome, ClassificationOutcome::Unavailable);
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let result = scored(&[("ux_designer", 0.9)], &[("intern", 0.8)]);
        let once = merge_result(Posting::new("Designer"), result.clone());
        let twice = merge_result(once.clone(), result);
        assert_eq!(once, twice);
    }

    #[test]
    fn failure_does_not_clobber_success() {
        let posting = merge_result(
            Posting::new("Designer"),
            scored(&[("ux_designer", 0.9)], &[]),
        );
        let posting = merge_result(posting, ClassificationResult::unavailable());
        assert_eq!(posting.classification.unwrap().category, "ux_designer");
    }

    #[test]
    fn first_success_is_never_replaced() {
        let ux = ClassificationResult {
            category: "UX/Product Design".into(),
            outcome: ClassificationOutcome::Classified,
            ..Default::default()
        };
        let frontend = ClassificationResult {
            category: "Frontend/UXE".into(),
            matched_by: Some("possible_frontend".into()),
            outcome: ClassificationOutcome::Classified,
            ..Default::default()
        };

        let posting = merge_result(merge_result(Posting::new("UI Designer"), ux.clone()), frontend);

        assert_eq!(posting.classification, Some(ux));
    }

    #[test]
    fn success_replaces_earlier_failure() {
        let posting = merge_result(Posting::new("Designer"), ClassificationResult::unavailable());
        let posting = merge_result(posting, scored(&[("ux_designer", 0.9)], &[]));
        assert_eq!(posting.classification.unwrap().category, "ux_designer");
    }

    #[test]
    fn merge_all_requires_equal_lengths() {
        let err = merge_all(vec![Posting::new("a")], vec![]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::LengthMismatch {
                postings: 1,
                results: 0
            }
        ));
    }

    #[test]
    fn merge_all_pairs_in_order() {
        let merged = merge_all(
            vec![Posting::new("a"), Posting::new("b")],
            vec![
                scored(&[("ux_designer", 1.0)], &[]),
                scored(&[("frontend", 1.0)], &[]),
            ],
        )
        .unwrap();

        let categories: Vec<_> = merged
            .iter()
            .map(|p| p.classification.as_ref().unwrap().category.as_str())
            .collect();
        assert_eq!(categories, vec!["ux_designer", "frontend"]);
    }

    #[test]
    fn assessment_attaches() {
        let posting = merge_assessment(
            Posting::new("UX Intern"),
            HeuristicAssessment {
                score: 75.0,
                category: UxCategory::UxDesigner,
                seniority: Seniority::Intern,
                disqualified: false,
            },
        );
        assert_eq!(posting.heuristic.unwrap().score, 75.0);
    }
}
