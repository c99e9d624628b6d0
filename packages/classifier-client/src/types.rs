use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The job fields the worker sees. Descriptions are expected to be truncated
/// by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub title: String,
    pub description: String,
}

impl JobPayload {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Body of `POST /`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest<'a> {
    pub jobs: &'a [JobPayload],
}

/// Response of `POST /`. A body without `results` fails to deserialize,
/// which callers treat as a failed batch.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchResultItem>,
}

/// Per-job scores returned by the batch endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchResultItem {
    /// Older worker builds send this map as `role`.
    #[serde(default, alias = "role")]
    pub role_scores: IndexMap<String, f64>,
    #[serde(default)]
    pub seniority_scores: IndexMap<String, f64>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// Body of `POST /<classifier-endpoint>`.
#[derive(Debug, Clone, Serialize)]
pub struct SingleJobRequest<'a> {
    pub job: &'a JobPayload,
}

/// Response of a specialized classifier endpoint.
///
/// Every field is optional on the wire; a missing `is_match` means the job
/// did not match.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchResponse {
    #[serde(default)]
    pub is_match: Option<bool>,
    #[serde(default)]
    pub seniority: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl MatchResponse {
    pub fn matched(&self) -> bool {
        self.is_match == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_item_accepts_role_alias() {
        let item: BatchResultItem = serde_json::from_str(
            r#"{"role": {"ux_designer": 0.9, "other": 0.1}, "skills": ["Figma"]}"#,
        )
        .unwrap();

        assert_eq!(item.role_scores.get("ux_designer"), Some(&0.9));
        assert_eq!(item.skills, vec!["Figma".to_string()]);
        assert!(item.seniority_scores.is_empty());
        assert_eq!(item.summary, "");
    }

    #[test]
    fn batch_item_keeps_label_order() {
        let item: BatchResultItem = serde_json::from_str(
            r#"{"role_scores": {"zeta": 1.0, "alpha": 1.0, "mid": 0.5}}"#,
        )
        .unwrap();

        let labels: Vec<_> = item.role_scores.keys().cloned().collect();
        assert_eq!(labels, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn batch_response_requires_results() {
        let parsed = serde_json::from_str::<BatchResponse>(r#"{"error": "boom"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn match_response_missing_flag_is_no_match() {
        let resp: MatchResponse = serde_json::from_str(r#"{"score": 0.2}"#).unwrap();
        assert!(!resp.matched());

        let resp: MatchResponse =
            serde_json::from_str(r#"{"is_match": true, "seniority": "entry"}"#).unwrap();
        assert!(resp.matched());
        assert_eq!(resp.seniority.as_deref(), Some("entry"));
    }
}
