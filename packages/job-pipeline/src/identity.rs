//! Identity assignment - the same real-world job gets the same id on every
//! scrape, whichever query or board surfaced it.
//!
//! URL ids are the canonical form from [`canonical_url`], not the raw string:
//! `https://Jobs.example.com/1#apply` and `https://jobs.example.com/1` are one
//! job. Path and query are kept.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::types::Posting;

/// Length of a field-derived id, in hex characters.
pub const ID_LEN: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    /// Digest of title, company and posting date.
    #[default]
    Fields,
    /// The canonical job URL (fragment dropped, scheme and host lowercased)
    /// when one is present, field digest otherwise.
    UrlFirst,
}

impl std::str::FromStr for IdentityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fields" => Ok(IdentityStrategy::Fields),
            "url_first" | "url" => Ok(IdentityStrategy::UrlFirst),
            other => Err(format!("unknown identity strategy: {}", other)),
        }
    }
}

fn normalize(field: &str) -> String {
    field.trim().to_lowercase()
}

/// Short deterministic id from the identifying fields.
///
/// Case and surrounding whitespace do not matter; missing fields are just
/// empty strings.
pub fn posting_id(title: &str, company: &str, date_posted: &str) -> String {
    let key = format!(
        "{}|{}|{}",
        normalize(title),
        normalize(company),
        normalize(date_posted)
    );

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(ID_LEN);
    digest
}

/// Canonical form of a job URL: trimmed, fragment dropped, scheme and host
/// lowercased. Strings that do not parse are kept as trimmed text.
pub fn canonical_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            Some(url.to_string())
        }
        Err(_) => Some(trimmed.to_string()),
    }
}

/// Id for one posting under the given strategy.
pub fn identify(posting: &Posting, strategy: IdentityStrategy) -> String {
    if strategy == IdentityStrategy::UrlFirst {
        if let Some(url) = canonical_url(&posting.job_url) {
            return url;
        }
    }
    posting_id(&posting.title, &posting.company, &posting.date_posted)
}

/// Stamp every posting with its id. Any id the source supplied is replaced.
pub fn assign_ids(postings: Vec<Posting>, strategy: IdentityStrategy) -> Vec<Posting> {
    postings
        .into_iter()
        .map(|mut posting| {
            posting.id = Some(identify(&posting, strategy));
            posting
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_fields_same_id() {
        assert_eq!(
            posting_id("Product Designer", "Acme", "2024-01-01"),
            posting_id("Product Designer", "Acme", "2024-01-01")
        );
    }

    #[test]
    fn case_and_whitespace_ignored() {
        let a = posting_id("Product Designer", "Acme", "2024-01-01");
        let b = posting_id("  PRODUCT designer ", "acme  ", " 2024-01-01");
        assert_eq!(a, b);
    }

    #[test]
    fn different_fields_different_id() {
        assert_ne!(
            posting_id("Product Designer", "Acme", "2024-01-01"),
            posting_id("Product Designer", "Acme", "2024-01-02")
        );
    }

    #[test]
    fn field_boundaries_matter() {
        assert_ne!(posting_id("ab", "c", ""), posting_id("a", "bc", ""));
    }

    #[test]
    fn id_format() {
        let id = posting_id("", "", "");
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn canonical_url_drops_fragment_and_lowercases_host() {
        assert_eq!(
            canonical_url(" https://LinkedIn.com/jobs/view/123#apply ").as_deref(),
            Some("https://linkedin.com/jobs/view/123")
        );
        assert_eq!(canonical_url("   "), None);
        assert_eq!(canonical_url("not a url").as_deref(), Some("not a url"));
    }

    #[test]
    fn url_first_id_is_the_canonical_url() {
        let posting = Posting::new("Designer").with_job_url(" https://Jobs.Example.com/1?ref=a#apply");
        assert_eq!(
            identify(&posting, IdentityStrategy::UrlFirst),
            "https://jobs.example.com/1?ref=a"
        );
    }

    #[test]
    fn url_first_prefers_url() {
        let posting = Posting::new("Designer").with_job_url("https://example.com/jobs/1");
        assert_eq!(
            identify(&posting, IdentityStrategy::UrlFirst),
            "https://example.com/jobs/1"
        );
        assert_eq!(
            identify(&posting, IdentityStrategy::Fields),
            posting_id("Designer", "", "")
        );
    }

    #[test]
    fn url_first_falls_back_to_fields() {
        let posting = Posting::new("Designer").with_company("Acme");
        assert_eq!(
            identify(&posting, IdentityStrategy::UrlFirst),
            posting_id("Designer", "Acme", "")
        );
    }

    #[test]
    fn assign_ids_overwrites_source_ids() {
        let postings = vec![Posting::new("Designer").with_id("li-999")];
        let assigned = assign_ids(postings, IdentityStrategy::Fields);
        assert_eq!(assigned[0].id.as_deref(), Some(posting_id("Designer", "", "").as_str()));
    }
}
