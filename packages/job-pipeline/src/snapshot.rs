//! Intermediate snapshots written between stages so a failed run can be
//! inspected or resumed by hand.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::Result;

pub const RAW_SNAPSHOT: &str = "raw_jobs.json";
pub const CLASSIFIED_SNAPSHOT: &str = "classified_jobs.json";

/// Write `value` as pretty JSON to `dir/name`, creating `dir` if needed.
pub async fn write_snapshot<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(&path, &body).await?;
    info!(path = %path.display(), bytes = body.len(), "Wrote snapshot");
    Ok(path)
}
