pub mod classification;
pub mod posting;
pub mod report;
pub mod score;

pub use classification::{
    ClassificationOutcome, ClassificationResult, HeuristicAssessment, Seniority, UxCategory,
    DEFAULT_CATEGORY, UNKNOWN_CATEGORY, UNKNOWN_SENIORITY,
};
pub use posting::Posting;
pub use report::{RecoverableError, RecoverableErrorKind, Stage, StageReport};
pub use score::ScoreVector;
