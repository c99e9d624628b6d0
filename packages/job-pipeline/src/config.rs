use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use classifier_client::ClassifierConfig;

use crate::classify::BatchSettings;
use crate::filters::MissingScorePolicy;
use crate::identity::IdentityStrategy;

pub const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:8787";

/// Which classification strategy a run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineVariant {
    /// Local keyword scoring.
    #[default]
    Heuristic,
    /// Batch endpoint returning role and seniority score maps.
    ScoreMap,
    /// Tag routing to specialized single-job endpoints.
    TagRouted,
}

impl PipelineVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineVariant::Heuristic => "heuristic",
            PipelineVariant::ScoreMap => "score_map",
            PipelineVariant::TagRouted => "tag_routed",
        }
    }
}

impl std::fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "heuristic" => Ok(PipelineVariant::Heuristic),
            "score_map" | "batch" => Ok(PipelineVariant::ScoreMap),
            "tag_routed" | "routed" => Ok(PipelineVariant::TagRouted),
            other => Err(format!("unknown pipeline variant: {}", other)),
        }
    }
}

/// Which post-filters run and how.
#[derive(Debug, Clone)]
pub struct FilterSettings {
    pub title_seniority: bool,
    pub entry_level: bool,
    /// Drop postings in the variant's reject category.
    pub category: bool,
    /// `mid and above` scores above this drop a posting (score-map variant).
    pub mid_and_above_threshold: f64,
    pub missing_score_policy: MissingScorePolicy,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            title_seniority: true,
            entry_level: true,
            category: false,
            mid_and_above_threshold: 0.5,
            missing_score_policy: MissingScorePolicy::Keep,
        }
    }
}

/// Pipeline configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub classifier_base_url: String,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
    pub batch: BatchSettings,
    pub variant: PipelineVariant,
    pub identity: IdentityStrategy,
    pub filters: FilterSettings,
    /// Scraper export to read; required by the binary.
    pub raw_postings_path: Option<PathBuf>,
    pub snapshot_dir: PathBuf,
    pub database_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifier_base_url: DEFAULT_CLASSIFIER_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            health_timeout: Duration::from_secs(5),
            batch: BatchSettings::default(),
            variant: PipelineVariant::default(),
            identity: IdentityStrategy::default(),
            filters: FilterSettings::default(),
            raw_postings_path: None,
            snapshot_dir: PathBuf::from("./jobs"),
            database_url: None,
        }
    }
}

fn parsed<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow!("{}", e))
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        _ => Ok(default),
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let batch_defaults = BatchSettings::default();
        let filter_defaults = FilterSettings::default();

        let batch_size: usize = parsed(&get, "CLASSIFIER_BATCH_SIZE", batch_defaults.batch_size)?;
        if batch_size == 0 {
            return Err(anyhow!("CLASSIFIER_BATCH_SIZE must be at least 1"));
        }
        let word_limit: usize =
            parsed(&get, "DESCRIPTION_WORD_LIMIT", batch_defaults.word_limit)?;
        if word_limit == 0 {
            return Err(anyhow!("DESCRIPTION_WORD_LIMIT must be at least 1"));
        }

        let threshold: f64 = parsed(
            &get,
            "MID_AND_ABOVE_THRESHOLD",
            filter_defaults.mid_and_above_threshold,
        )?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!("MID_AND_ABOVE_THRESHOLD must be between 0 and 1"));
        }

        Ok(Self {
            classifier_base_url: get("CLASSIFIER_BASE_URL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.classifier_base_url),
            request_timeout: Duration::from_secs(parsed(&get, "CLASSIFIER_TIMEOUT_SECS", 60u64)?),
            health_timeout: Duration::from_secs(parsed(
                &get,
                "CLASSIFIER_HEALTH_TIMEOUT_SECS",
                5u64,
            )?),
            batch: BatchSettings {
                batch_size,
                word_limit,
                max_retries: parsed(&get, "CLASSIFIER_MAX_RETRIES", batch_defaults.max_retries)?,
                backoff: Duration::from_millis(parsed(&get, "CLASSIFIER_RETRY_BACKOFF_MS", 1000u64)?),
            },
            variant: parsed(&get, "PIPELINE_VARIANT", defaults.variant)?,
            identity: parsed(&get, "IDENTITY_STRATEGY", defaults.identity)?,
            filters: FilterSettings {
                title_seniority: parsed(&get, "FILTER_TITLE_SENIORITY", filter_defaults.title_seniority)?,
                entry_level: parsed(&get, "FILTER_ENTRY_LEVEL", filter_defaults.entry_level)?,
                category: parsed(&get, "FILTER_CATEGORY", filter_defaults.category)?,
                mid_and_above_threshold: threshold,
                missing_score_policy: parsed(
                    &get,
                    "MISSING_SCORE_POLICY",
                    filter_defaults.missing_score_policy,
                )?,
            },
            raw_postings_path: get("RAW_POSTINGS_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            snapshot_dir: get("SNAPSHOT_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_dir),
            database_url: get("DATABASE_URL").filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig::new(self.classifier_base_url.clone())
            .with_request_timeout(self.request_timeout)
            .with_health_timeout(self.health_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<PipelineConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.classifier_base_url, "http://127.0.0.1:8787");
        assert_eq!(config.batch.batch_size, 10);
        assert_eq!(config.batch.word_limit, 400);
        assert_eq!(config.batch.max_retries, 0);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.health_timeout, Duration::from_secs(5));
        assert_eq!(config.variant, PipelineVariant::Heuristic);
        assert_eq!(config.identity, IdentityStrategy::Fields);
        assert_eq!(config.snapshot_dir, PathBuf::from("./jobs"));
        assert!(config.raw_postings_path.is_none());
        assert!(config.database_url.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("CLASSIFIER_BASE_URL", "http://worker:9000"),
            ("CLASSIFIER_BATCH_SIZE", "25"),
            ("PIPELINE_VARIANT", "tag-routed"),
            ("IDENTITY_STRATEGY", "url_first"),
            ("MISSING_SCORE_POLICY", "discard"),
            ("FILTER_ENTRY_LEVEL", "false"),
            ("RAW_POSTINGS_PATH", "jobs/raw.json"),
        ])
        .unwrap();

        assert_eq!(config.classifier_base_url, "http://worker:9000");
        assert_eq!(config.batch.batch_size, 25);
        assert_eq!(config.variant, PipelineVariant::TagRouted);
        assert_eq!(config.identity, IdentityStrategy::UrlFirst);
        assert_eq!(config.filters.missing_score_policy, MissingScorePolicy::Discard);
        assert!(!config.filters.entry_level);
        assert_eq!(config.raw_postings_path, Some(PathBuf::from("jobs/raw.json")));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(load(&[("CLASSIFIER_BATCH_SIZE", "ten")]).is_err());
        assert!(load(&[("CLASSIFIER_BATCH_SIZE", "0")]).is_err());
        assert!(load(&[("PIPELINE_VARIANT", "magic")]).is_err());
        assert!(load(&[("MID_AND_ABOVE_THRESHOLD", "1.5")]).is_err());
    }

    #[test]
    fn builds_classifier_config() {
        let config = load(&[("CLASSIFIER_TIMEOUT_SECS", "3")]).unwrap();
        let client = config.classifier_config();
        assert_eq!(client.request_timeout, Duration::from_secs(3));
        assert_eq!(client.base_url, DEFAULT_CLASSIFIER_URL);
    }
}
