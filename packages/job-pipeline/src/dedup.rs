//! Deduplication and tag merging.
//!
//! Postings sharing an id are one job. The first-seen posting supplies every
//! field; routing tags are additive evidence, so the merged record carries the
//! union of all tag sets in first-seen order.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::identity::posting_id;
use crate::types::{Posting, Stage, StageReport};

fn dedup_key(posting: &Posting) -> String {
    posting
        .id
        .clone()
        .unwrap_or_else(|| posting_id(&posting.title, &posting.company, &posting.date_posted))
}

/// Collapse duplicates to one record per id.
///
/// `changed` in the report counts merged records whose tag set grew.
pub fn dedupe(postings: Vec<Posting>) -> (Vec<Posting>, StageReport) {
    let mut report = StageReport::new(Stage::Dedupe, postings.len());
    let mut groups: IndexMap<String, Posting> = IndexMap::with_capacity(postings.len());
    let mut grown: HashSet<String> = HashSet::new();

    for posting in postings {
        let key = dedup_key(&posting);
        match groups.get_mut(&key) {
            Some(kept) => {
                let before = kept.tags.len();
                kept.tags.extend(posting.tags);
                if kept.tags.len() > before {
                    grown.insert(key.clone());
                }
                debug!(id = %key, tags = kept.tags.len(), "Merged duplicate posting");
            }
            None => {
                groups.insert(key, posting);
            }
        }
    }

    report.output = groups.len();
    report.changed = grown.len();

    (groups.into_values().collect(), report)
}
