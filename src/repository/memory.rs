//! In-process inspections store for local runs and tests

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::InspectionStore;
use crate::{
    error::AppResult,
    models::inspection::{InspectionRecord, RecentSubmission},
};

#[derive(Debug, Clone)]
struct StoredInspection {
    record: InspectionRecord,
    submitted_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    rows: Arc<RwLock<Vec<StoredInspection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in insertion order
    pub async fn records(&self) -> Vec<InspectionRecord> {
        self.rows.read().await.iter().map(|r| r.record.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl InspectionStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, record: &InspectionRecord) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        rows.push(StoredInspection {
            record: record.clone(),
            submitted_at: Utc::now(),
        });
        Ok(())
    }

    async fn fetch_recent(&self, limit: u32) -> AppResult<Vec<RecentSubmission>> {
        let rows = self.rows.read().await;
        // Newest insert first so equal timestamps keep submission order
        let mut newest: Vec<&StoredInspection> = rows.iter().rev().collect();
        newest.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        Ok(newest
            .into_iter()
            .take(limit as usize)
            .map(|stored| {
                let r = &stored.record;
                RecentSubmission {
                    inspection_date: Some(r.inspection_date),
                    facility_name: Some(r.facility_name.clone()),
                    machine_type: Some(r.machine_type.as_str().to_string()),
                    machine_id: Some(r.machine_id.clone()),
                    power_status: Some(r.power_status.as_str().to_string()),
                    follow_up_required: Some(r.follow_up_required),
                    submitted_at: Some(stored.submitted_at),
                    user_email: Some(r.user_email.clone().unwrap_or_default()),
                }
            })
            .collect())
    }

    async fn provision(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inspection::tests::record;

    #[tokio::test]
    async fn test_newest_first_with_limit() {
        let store = MemoryStore::new();
        for id in ["A-1", "A-2", "A-3"] {
            let mut r = record();
            r.machine_id = id.to_string();
            tokio_test::assert_ok!(store.insert(&r).await);
        }

        let rows = store.fetch_recent(2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].machine_id.as_deref(), Some("A-3"));
        assert_eq!(rows[1].machine_id.as_deref(), Some("A-2"));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = MemoryStore::new();
        assert!(store.fetch_recent(20).await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }
}
