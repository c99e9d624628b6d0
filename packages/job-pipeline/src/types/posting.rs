//! Posting - one scraped job listing as it moves through the pipeline.

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::classification::{ClassificationResult, HeuristicAssessment};

/// A raw or partially classified job posting.
///
/// Text fields are lenient on input: missing, `null`, numeric and boolean
/// values all coerce to strings so a sloppy scraper export never fails to
/// load. Unknown columns are kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// Computed identity; absent until the identity stage runs.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, alias = "company_name", deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_posted: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub job_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub job_url_direct: String,
    /// Routing tags in the order the upstream search attached them.
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: IndexSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heuristic: Option<HeuristicAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Posting {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_date_posted(mut self, date: impl Into<String>) -> Self {
        self.date_posted = date.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_job_url(mut self, url: impl Into<String>) -> Self {
        self.job_url = url.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(value_to_string).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = lenient_string(deserializer)?;
    let trimmed = s.trim();
    Ok(if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    })
}

/// Tags arrive as a JSON array, a single string, or the stringified list a
/// CSV round-trip produces (`"['possible_ux_product', 'possible_frontend']"`).
fn lenient_tags<'de, D>(deserializer: D) -> Result<IndexSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let tags = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().map(value_to_string).collect(),
        Some(Value::String(s)) => parse_tag_string(&s),
        Some(other) => vec![value_to_string(other)],
    };

    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

fn parse_tag_string(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
            return items;
        }
        return inner
            .split(',')
            .map(|t| t.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
            .collect();
    }
    vec![trimmed.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let posting: Posting = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(posting.title, "");
        assert_eq!(posting.company, "");
        assert!(posting.id.is_none());
        assert!(posting.tags.is_empty());
    }

    #[test]
    fn non_string_fields_coerce() {
        let posting: Posting = serde_json::from_str(
            r#"{"title": 42, "company": null, "description": true, "date_posted": 2024}"#,
        )
        .unwrap();
        assert_eq!(posting.title, "42");
        assert_eq!(posting.company, "");
        assert_eq!(posting.description, "true");
        assert_eq!(posting.date_posted, "2024");
    }

    #[test]
    fn unknown_columns_are_kept() {
        let posting: Posting =
            serde_json::from_str(r#"{"title": "Designer", "site": "linkedin", "salary": 50000}"#)
                .unwrap();
        assert_eq!(posting.extra.get("site"), Some(&Value::from("linkedin")));

        let back = serde_json::to_value(&posting).unwrap();
        assert_eq!(back["salary"], Value::from(50000));
    }

    #[test]
    fn tags_from_stringified_list() {
        let posting: Posting = serde_json::from_str(
            r#"{"title": "x", "tags": "['possible_ux_product', 'possible_frontend']"}"#,
        )
        .unwrap();
        let tags: Vec<_> = posting.tags.iter().cloned().collect();
        assert_eq!(tags, vec!["possible_ux_product", "possible_frontend"]);
    }

    #[test]
    fn tags_deduplicate_keeping_order() {
        let posting: Posting =
            serde_json::from_str(r#"{"title": "x", "tags": ["b", "a", "b", "", null]}"#).unwrap();
        let tags: Vec<_> = posting.tags.iter().cloned().collect();
        assert_eq!(tags, vec!["b", "a"]);
    }

    #[test]
    fn company_name_alias() {
        let posting: Posting =
            serde_json::from_str(r#"{"title": "x", "company_name": "Acme"}"#).unwrap();
        assert_eq!(posting.company, "Acme");
    }
}
