//! Seams to the collaborators around the pipeline.
//!
//! Applications plug in their own scraper, description cleaner and
//! persistence layer; the crate ships a JSON file source, a markdown cleaner
//! and memory/Postgres stores.

use async_trait::async_trait;

use crate::error::Result;
use crate::record::CanonicalRecord;
use crate::types::Posting;

/// Produces the raw posting table (a scraper, an export, a fixture).
#[async_trait]
pub trait PostingSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Posting>>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "source"
    }
}

/// Normalizes description text. Must be total: any string in, a string out.
pub trait DescriptionCleaner: Send + Sync {
    fn clean(&self, text: &str) -> String;
}

/// Leaves descriptions untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCleaner;

impl DescriptionCleaner for NoopCleaner {
    fn clean(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Persists canonical records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or overwrite records keyed by `id`. Returns how many were
    /// written.
    async fn upsert(&self, records: &[CanonicalRecord]) -> Result<usize>;

    async fn get(&self, id: &str) -> Result<Option<CanonicalRecord>>;

    async fn count(&self) -> Result<usize>;
}
