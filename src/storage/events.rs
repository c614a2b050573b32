use chrono::{DateTime, TimeZone, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{FeedError, Result};
use crate::feed::{EventRecord, Page, PageResolver, RecentPage};

/// Prefix turning an event uuid into its entry tag URI.
const TAG_URI_PREFIX: &str = "tag:atomfeed.ict4h.org:";

const CREATE_EVENT_RECORDS: &str = r#"
    CREATE TABLE IF NOT EXISTS event_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        uri TEXT,
        object TEXT,
        category TEXT,
        tags TEXT,
        date_created INTEGER
    )
"#;

const CREATE_CATEGORY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_event_records_category ON event_records(category, id)";

// ============================================================================
// Row Types
// ============================================================================

#[derive(Debug, FromRow)]
struct EventRow {
    uuid: String,
    title: String,
    timestamp: i64,
    date_created: Option<i64>,
    category: Option<String>,
    tags: Option<String>,
    object: Option<String>,
}

impl EventRow {
    fn into_record(self) -> Result<EventRecord> {
        Ok(EventRecord {
            tag_uri: format!("{TAG_URI_PREFIX}{}", self.uuid),
            title: self.title,
            timestamp: from_epoch(self.timestamp)?,
            date_created: self.date_created.map(from_epoch).transpose()?,
            category: self.category,
            tags: self.tags,
            contents: self.object,
        })
    }
}

fn from_epoch(secs: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
        FeedError::Storage(sqlx::Error::Decode(
            format!("timestamp out of range: {secs}").into(),
        ))
    })
}

// ============================================================================
// Event Store
// ============================================================================

/// Read-only page resolver over the `event_records` table.
///
/// Events of a category are chunked by insertion order into pages of
/// `page_size`. The last chunk, full or not, is the recent page. An empty
/// category (`""`) spans all events.
#[derive(Clone)]
pub struct EventStore {
    pool: SqlitePool,
    page_size: u32,
}

impl EventStore {
    /// Open an existing database read-only.
    ///
    /// A missing file is an error rather than a new empty log. `":memory:"`
    /// opens a fresh writable database with the schema in place.
    pub async fn open(path: &str, page_size: u32) -> Result<Self> {
        let in_memory = path == ":memory:";
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(in_memory)
            .read_only(!in_memory)
            .pragma("busy_timeout", "5000");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            page_size: page_size.max(1),
        };
        if in_memory {
            store.migrate().await?;
        }
        tracing::debug!(path = %path, page_size = store.page_size, read_only = !in_memory, "Opened event store");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(CREATE_EVENT_RECORDS).execute(&mut *tx).await?;
        sqlx::query(CREATE_CATEGORY_INDEX).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    fn page_count_for(&self, events: i64) -> u32 {
        let size = i64::from(self.page_size);
        let pages = (events + size - 1) / size;
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Count and page are read in one transaction so they describe the same log.
    async fn read_page(&self, page_id: Option<u32>, category: &str) -> Result<(Page, u32)> {
        let mut tx = self.pool.begin().await?;

        let (events,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_records WHERE (?1 = '' OR category = ?1)",
        )
        .bind(category)
        .fetch_one(&mut *tx)
        .await?;

        let page_count = self.page_count_for(events);
        let id = page_id.unwrap_or(page_count);
        if id == 0 || id > page_count {
            return Err(FeedError::not_found(id, category));
        }

        let offset = i64::from(id - 1) * i64::from(self.page_size);
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
                SELECT uuid, title, timestamp, date_created, category, tags, object
                FROM event_records
                WHERE (?1 = '' OR category = ?1)
                ORDER BY id
                LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(category)
        .bind(i64::from(self.page_size))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let events = rows
            .into_iter()
            .map(EventRow::into_record)
            .collect::<Result<Vec<_>>>()?;
        Ok((Page { id, events }, page_count))
    }
}

impl PageResolver for EventStore {
    async fn resolve_recent(&self, category: &str) -> Result<RecentPage> {
        let (page, _) = self.read_page(None, category).await?;
        Ok(RecentPage::new(page))
    }

    async fn resolve_page(&self, page_id: u32, category: &str) -> Result<Page> {
        let (page, _) = self.read_page(Some(page_id), category).await?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store(page_size: u32) -> EventStore {
        EventStore::open(":memory:", page_size).await.unwrap()
    }

    async fn insert(store: &EventStore, uuid: &str, category: &str, timestamp: i64) {
        sqlx::query(
            "INSERT INTO event_records (uuid, title, timestamp, category, tags, object) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(format!("Event {uuid}"))
        .bind(timestamp)
        .bind(category)
        .bind("tag1,tag2")
        .bind(format!("{{\"uuid\":\"{uuid}\"}}"))
        .execute(&store.pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_empty_store_has_one_empty_page() {
        let store = test_store(5).await;
        let recent = store.resolve_recent("patient").await.unwrap();
        assert_eq!(recent.page_count, 1);
        assert!(recent.page.events.is_empty());
    }

    #[tokio::test]
    async fn test_pages_chunked_by_insertion_order() {
        let store = test_store(2).await;
        for i in 0..5 {
            insert(&store, &format!("u{i}"), "patient", 1_700_000_000 + i).await;
        }

        let recent = store.resolve_recent("patient").await.unwrap();
        assert_eq!(recent.page_count, 3);
        assert_eq!(recent.page.events.len(), 1);
        assert_eq!(recent.page.events[0].tag_uri, "tag:atomfeed.ict4h.org:u4");

        let first = store.resolve_page(1, "patient").await.unwrap();
        let uris: Vec<_> = first.events.iter().map(|e| e.tag_uri.as_str()).collect();
        assert_eq!(uris, vec!["tag:atomfeed.ict4h.org:u0", "tag:atomfeed.ict4h.org:u1"]);
    }

    #[tokio::test]
    async fn test_category_filter() {
        let store = test_store(2).await;
        insert(&store, "p1", "patient", 1).await;
        insert(&store, "e1", "encounter", 2).await;
        insert(&store, "p2", "patient", 3).await;
        insert(&store, "p3", "patient", 4).await;

        assert_eq!(store.resolve_recent("patient").await.unwrap().page_count, 2);
        assert_eq!(store.resolve_recent("encounter").await.unwrap().page_count, 1);
        // empty category spans every event
        assert_eq!(store.resolve_recent("").await.unwrap().page_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_page_not_found() {
        let store = test_store(2).await;
        insert(&store, "p1", "patient", 1).await;

        for id in [0, 2] {
            let err = store.resolve_page(id, "patient").await.unwrap_err();
            assert!(matches!(err, FeedError::NotFound { .. }));
        }
    }

    #[tokio::test]
    async fn test_missing_database_file_rejected() {
        let dir = std::env::temp_dir().join("eventfeed_store_test_missing");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("typo.db");
        std::fs::remove_file(&path).ok();

        let result = EventStore::open(path.to_str().unwrap(), 5).await;
        assert!(matches!(result, Err(FeedError::Storage(_))));
        assert!(!path.exists(), "open must not create a database");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_existing_file_opened_read_only() {
        let dir = std::env::temp_dir().join("eventfeed_store_test_read_only");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.db");
        std::fs::remove_file(&path).ok();

        let writer = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path.display()))
            .await
            .unwrap();
        sqlx::query(CREATE_EVENT_RECORDS).execute(&writer).await.unwrap();
        sqlx::query("INSERT INTO event_records (uuid, title, timestamp) VALUES ('f1', 'Filed', 42)")
            .execute(&writer)
            .await
            .unwrap();
        writer.close().await;

        let store = EventStore::open(path.to_str().unwrap(), 5).await.unwrap();
        let recent = store.resolve_recent("").await.unwrap();
        assert_eq!(recent.page.events[0].tag_uri, "tag:atomfeed.ict4h.org:f1");

        let write = sqlx::query("DELETE FROM event_records").execute(&store.pool).await;
        assert!(write.is_err());

        store.pool.close().await;
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_row_fields_mapped() {
        let store = test_store(5).await;
        insert(&store, "p1", "patient", 1_700_000_000).await;

        let page = store.resolve_page(1, "patient").await.unwrap();
        let record = &page.events[0];
        assert_eq!(record.title, "Event p1");
        assert_eq!(record.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(record.date_created, None);
        assert_eq!(record.category.as_deref(), Some("patient"));
        assert_eq!(record.tags.as_deref(), Some("tag1,tag2"));
        assert_eq!(record.contents.as_deref(), Some("{\"uuid\":\"p1\"}"));
    }
}
