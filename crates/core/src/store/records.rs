use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::models::GameRecord;

use super::{Store, StoreError};

/// Key of the record holding the ordered tab list.
pub const TABS_KEY: &str = "tabs";

/// Stored shape of the tab list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabsRecord {
    /// Always [`TABS_KEY`].
    pub name: String,
    /// Tab names in display order.
    #[serde(default)]
    pub tabs: Vec<String>,
    /// When the list was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Stored shape of one tab's data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEntry {
    /// Tab name, equal to the store key.
    pub name: String,
    /// Resources and jobs.
    #[serde(flatten)]
    pub record: GameRecord,
    /// When the record was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct GameEntryRef<'a> {
    name: &'a str,
    #[serde(flatten)]
    record: &'a GameRecord,
    saved_at: DateTime<Utc>,
}

/// Load the record stored for `tab`.
pub async fn load_game<S: Store>(store: &S, tab: &str) -> Result<Option<GameEntry>, StoreError> {
    match store.get(tab).await? {
        Some(value) => decode(tab, value).map(Some),
        None => Ok(None),
    }
}

/// Write `record` under `tab`, returning the timestamp stored with it.
pub async fn save_game<S: Store>(
    store: &S,
    tab: &str,
    record: &GameRecord,
) -> Result<DateTime<Utc>, StoreError> {
    let saved_at = Utc::now();
    let value = encode(
        tab,
        &GameEntryRef {
            name: tab,
            record,
            saved_at,
        },
    )?;
    store.put(tab, value).await?;
    debug!(
        tab,
        resources = record.resources.len(),
        jobs = record.jobs.len(),
        "saved game record"
    );
    Ok(saved_at)
}

/// Load the ordered tab list. A missing record is an empty list.
pub async fn load_tabs<S: Store>(store: &S) -> Result<Vec<String>, StoreError> {
    match store.get(TABS_KEY).await? {
        Some(value) => Ok(decode::<TabsRecord>(TABS_KEY, value)?.tabs),
        None => Ok(Vec::new()),
    }
}

/// Replace the ordered tab list.
pub async fn save_tabs<S: Store>(store: &S, tabs: &[String]) -> Result<(), StoreError> {
    let record = TabsRecord {
        name: TABS_KEY.to_string(),
        tabs: tabs.to_vec(),
        saved_at: Some(Utc::now()),
    };
    let value = encode(TABS_KEY, &record)?;
    store.put(TABS_KEY, value).await
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Malformed {
        key: key.to_string(),
        source,
    })
}

fn decode<T: for<'de> Deserialize<'de>>(key: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::Malformed {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{InputLine, Job, Resource},
        store::MemoryStore,
    };
    use serde_json::json;

    #[tokio::test]
    async fn game_record_round_trips_in_order() {
        let store = MemoryStore::new();
        let mut record = GameRecord::default();
        record.resources.push(Resource::raw("Iron"));
        record.resources.push(Resource::raw("Coal"));
        record
            .resources
            .push(Resource::product("Steel", vec![InputLine::new("Iron", 2), InputLine::new("Coal", 1)]));
        record
            .jobs
            .push(Job::new("Bridge", vec![InputLine::new("Steel", 40)]));

        save_game(&store, "default", &record).await.unwrap();
        let loaded = load_game(&store, "default").await.unwrap().unwrap();
        assert_eq!(loaded.name, "default");
        assert_eq!(loaded.record, record);
        assert!(loaded.saved_at.is_some());
    }

    #[tokio::test]
    async fn stored_shape_is_flat() {
        let store = MemoryStore::new();
        let mut record = GameRecord::default();
        record.resources.push(Resource::raw("Iron"));
        save_game(&store, "Mars", &record).await.unwrap();

        let value = store.snapshot("Mars").unwrap();
        assert_eq!(value["name"], json!("Mars"));
        assert_eq!(value["resources"][0]["type"], json!("Resource"));
        assert_eq!(value["jobs"], json!([]));
    }

    #[tokio::test]
    async fn reads_legacy_records_without_timestamps() {
        let store = MemoryStore::new();
        store
            .put("old", json!({"name": "old", "jobs": [{"name": "Rush"}]}))
            .await
            .unwrap();
        store
            .put(TABS_KEY, json!({"name": "tabs", "tabs": ["old"]}))
            .await
            .unwrap();

        let entry = load_game(&store, "old").await.unwrap().unwrap();
        assert!(entry.record.resources.is_empty());
        assert_eq!(entry.record.jobs[0].name, "Rush");
        assert_eq!(load_tabs(&store).await.unwrap(), vec!["old".to_string()]);
    }

    #[tokio::test]
    async fn missing_tab_list_is_empty() {
        let store = MemoryStore::new();
        assert!(load_tabs(&store).await.unwrap().is_empty());
        save_tabs(&store, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(load_tabs(&store).await.unwrap(), vec!["a", "b"]);
    }
}
