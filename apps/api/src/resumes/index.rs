//! Resume Metadata Index: `{profile}/resumes.json`, one record per generated resume.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::storage::keys::{self, ProfileName};
use crate::storage::{read_json, write_json, DocumentStore, StoreError};

/// `created_at` layout: sorts chronologically as a plain string.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: Uuid,
    pub filename: String,
    pub display_name: String,
    pub job_title: String,
    pub company: String,
    pub created_at: String,
}

/// Records in stored (append) order. Entries that fail to parse are dropped.
async fn load_index(
    store: &dyn DocumentStore,
    profile: &ProfileName,
) -> Result<Vec<ResumeRecord>, StoreError> {
    let entries = read_json::<Vec<Value>>(store, &keys::resume_index(profile))
        .await?
        .into_option()
        .unwrap_or_default();

    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ResumeRecord>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Dropping malformed resume record for '{profile}': {e}");
                None
            }
        })
        .collect())
}

async fn save_index(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    records: &[ResumeRecord],
) -> Result<(), StoreError> {
    write_json(store, &keys::resume_index(profile), records).await
}

/// All records, most recent first.
pub async fn list_records(
    store: &dyn DocumentStore,
    profile: &ProfileName,
) -> Result<Vec<ResumeRecord>, StoreError> {
    let mut records = load_index(store, profile).await?;
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(records)
}

pub async fn append_record(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    record: ResumeRecord,
) -> Result<(), StoreError> {
    let mut records = load_index(store, profile).await?;
    records.push(record);
    save_index(store, profile, &records).await
}

pub async fn find_record(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    id: Uuid,
) -> Result<ResumeRecord, AppError> {
    load_index(store, profile)
        .await?
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

/// Removes the record and deletes its HTML body. An unknown id changes nothing.
pub async fn remove_record(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    id: Uuid,
) -> Result<ResumeRecord, AppError> {
    let mut records = load_index(store, profile).await?;
    let position = records
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    let record = records.remove(position);

    save_index(store, profile, &records).await?;
    store
        .delete(&keys::resume_body(profile, &record.filename)?)
        .await?;

    info!("Deleted resume {} ('{}') for '{profile}'", record.id, record.filename);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::storage::HTML_CONTENT_TYPE;
    use bytes::Bytes;

    fn alice() -> ProfileName {
        ProfileName::parse("alice").unwrap()
    }

    fn record(filename: &str, created_at: &str) -> ResumeRecord {
        ResumeRecord {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            display_name: "Engineer at Acme".to_string(),
            job_title: "Engineer".to_string(),
            company: "Acme".to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let store = MemoryStore::new();
        let old = record("a.html", "2024-01-01 09:00:00");
        let new = record("b.html", "2024-03-05 18:30:00");
        let mid = record("c.html", "2024-02-10 12:00:00");
        for r in [&old, &new, &mid] {
            append_record(&store, &alice(), r.clone()).await.unwrap();
        }

        let listed = list_records(&store, &alice()).await.unwrap();
        assert_eq!(listed, vec![new, mid, old]);
    }

    #[tokio::test]
    async fn test_list_empty_when_index_missing() {
        let store = MemoryStore::new();
        assert!(list_records(&store, &alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped() {
        let store = MemoryStore::new();
        let good = record("a.html", "2024-01-01 09:00:00");
        let doc = serde_json::json!([{"id": "not-a-uuid"}, good.clone()]);
        write_json(&store, "alice/resumes.json", &doc).await.unwrap();

        assert_eq!(list_records(&store, &alice()).await.unwrap(), vec![good]);
    }

    #[tokio::test]
    async fn test_remove_deletes_record_and_body() {
        let store = MemoryStore::new();
        let keep = record("keep.html", "2024-01-01 09:00:00");
        let gone = record("gone.html", "2024-01-02 09:00:00");
        for r in [&keep, &gone] {
            store
                .put(&format!("alice/{}", r.filename), Bytes::from_static(b"<html>"), HTML_CONTENT_TYPE)
                .await
                .unwrap();
            append_record(&store, &alice(), r.clone()).await.unwrap();
        }

        let removed = remove_record(&store, &alice(), gone.id).await.unwrap();
        assert_eq!(removed, gone);
        assert!(!store.exists("alice/gone.html").await.unwrap());
        assert!(store.exists("alice/keep.html").await.unwrap());
        assert_eq!(list_records(&store, &alice()).await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_has_no_side_effects() {
        let store = MemoryStore::new();
        append_record(&store, &alice(), record("a.html", "2024-01-01 09:00:00"))
            .await
            .unwrap();
        store
            .put("alice/a.html", Bytes::from_static(b"<html>"), HTML_CONTENT_TYPE)
            .await
            .unwrap();
        let index_before = store.get("alice/resumes.json").await.unwrap();

        let err = remove_record(&store, &alice(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.get("alice/resumes.json").await.unwrap(), index_before);
        assert!(store.exists("alice/a.html").await.unwrap());
    }
}
