//! Posting sources backed by files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::traits::PostingSource;
use crate::types::Posting;

/// Reads a scraper export: a JSON array of posting objects.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PostingSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<Posting>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let postings: Vec<Posting> = serde_json::from_slice(&bytes)?;
        info!(path = %self.path.display(), postings = postings.len(), "Loaded postings");
        Ok(postings)
    }

    fn name(&self) -> &str {
        "json_file"
    }
}
