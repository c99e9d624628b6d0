use std::ops::Range;

use serde::Serialize;

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Scrape,
    Clean,
    Identify,
    Dedupe,
    Classify,
    PostFilter,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scrape => "scrape",
            Stage::Clean => "clean",
            Stage::Identify => "identify",
            Stage::Dedupe => "dedupe",
            Stage::Classify => "classify",
            Stage::PostFilter => "post_filter",
            Stage::Persist => "persist",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverableErrorKind {
    /// Network error, timeout, non-2xx or malformed body.
    TransientRemote,
    /// Classifier returned a different number of results than it was sent.
    ShapeMismatch,
    /// A field had to be replaced by a default (e.g. unparseable date).
    InputCoercion,
    /// Classifier health probe failed; the stage was skipped.
    ServiceUnavailable,
}

/// Something went wrong but the stage carried on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoverableError {
    pub kind: RecoverableErrorKind,
    pub detail: String,
    /// Affected posting positions within the stage input, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range<usize>>,
}

impl RecoverableError {
    pub fn new(kind: RecoverableErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            range: None,
        }
    }

    pub fn with_range(mut self, range: Range<usize>) -> Self {
        self.range = Some(range);
        self
    }
}

/// Counts and recovered errors for one stage run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub input: usize,
    pub output: usize,
    /// Records altered in place (classified, merged, coerced).
    pub changed: usize,
    pub errors: Vec<RecoverableError>,
}

impl StageReport {
    pub fn new(stage: Stage, input: usize) -> Self {
        Self {
            stage,
            input,
            output: input,
            changed: 0,
            errors: Vec::new(),
        }
    }

    pub fn removed(&self) -> usize {
        self.input.saturating_sub(self.output)
    }

    pub fn push_error(&mut self, error: RecoverableError) {
        self.errors.push(error);
    }

    pub fn count_errors(&self, kind: RecoverableErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// Emit the before/after line every stage owes the operator.
    pub fn log(&self) {
        tracing::info!(
            stage = %self.stage,
            input = self.input,
            output = self.output,
            removed = self.removed(),
            changed = self.changed,
            errors = self.errors.len(),
            "Stage complete"
        );
    }
}
