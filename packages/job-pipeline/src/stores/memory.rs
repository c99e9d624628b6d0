//! In-memory job store for tests and dry runs.

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::record::CanonicalRecord;
use crate::traits::JobStore;

/// Records keyed by id, in first-insert order. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    records: RwLock<IndexMap<String, CanonicalRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, in first-insert order.
    pub async fn all(&self) -> Vec<CanonicalRecord> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn upsert(&self, records: &[CanonicalRecord]) -> Result<usize> {
        let mut stored = self.records.write().await;
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn get(&self, id: &str) -> Result<Option<CanonicalRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ClassificationFields;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, title: &str) -> CanonicalRecord {
        CanonicalRecord {
            id: id.to_string(),
            title: title.to_string(),
            company_name: "Acme".into(),
            location: String::new(),
            description: String::new(),
            job_url: None,
            job_url_direct: None,
            date_posted: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            classification: ClassificationFields::Heuristic {
                ux_score: 70.0,
                ux_category: Some("ux_designer".into()),
                seniority: Some("entry".into()),
            },
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_id() {
        let store = MemoryJobStore::new();
        store.upsert(&[record("a", "Designer"), record("b", "Researcher")]).await.unwrap();
        store.upsert(&[record("a", "Product Designer")]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.get("a").await.unwrap().unwrap().title, "Product Designer");
        assert!(store.get("missing").await.unwrap().is_none());

        let ids: Vec<_> = store.all().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
