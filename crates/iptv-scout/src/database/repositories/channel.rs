//! SeaORM-based Channel repository implementation
//!
//! The channel table is an append-only union of everything discovery has
//! ever found, at most one row per `(name, stream_url)` pair.

use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set, TransactionTrait};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::entities::{channels, prelude::Channels};
use crate::errors::AppResult;
use crate::models::ChannelRecord;

/// SeaORM-based repository for Channel operations
#[derive(Clone)]
pub struct ChannelSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
    insert_batch_size: usize,
}

impl ChannelSeaOrmRepository {
    /// Create a new repository instance
    pub fn new(connection: Arc<DatabaseConnection>, insert_batch_size: usize) -> Self {
        Self {
            connection,
            insert_batch_size: insert_batch_size.max(1),
        }
    }

    /// All stored channels in insertion order
    pub async fn find_all(&self) -> AppResult<Vec<ChannelRecord>> {
        let models = Channels::find()
            .order_by_asc(channels::Column::Id)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Self::model_to_domain).collect())
    }

    /// Insert one channel, returning false when the pair is already stored
    pub async fn insert_channel(&self, name: &str, stream_url: &str) -> AppResult<bool> {
        let record = ChannelRecord::new(name, stream_url);
        let affected = Channels::insert(Self::active_model(&record, chrono::Utc::now()))
            .on_conflict(Self::on_conflict())
            .exec_without_returning(&*self.connection)
            .await?;
        Ok(affected > 0)
    }

    /// Append the pairs that are not stored yet; existing rows are never
    /// touched. Returns the number of rows written.
    pub async fn append_new(&self, records: &[ChannelRecord]) -> AppResult<u64> {
        let existing: HashSet<ChannelRecord> = self.find_all().await?.into_iter().collect();
        let mut seen = HashSet::new();
        let fresh: Vec<&ChannelRecord> = records
            .iter()
            .filter(|r| !existing.contains(*r) && seen.insert(*r))
            .collect();

        if fresh.is_empty() {
            debug!("No new channels to store");
            return Ok(0);
        }

        let now = chrono::Utc::now();
        let txn = self.connection.begin().await?;
        let mut written = 0;
        for chunk in fresh.chunks(self.insert_batch_size) {
            let models = chunk.iter().map(|r| Self::active_model(r, now));
            written += Channels::insert_many(models)
                .on_conflict(Self::on_conflict())
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        debug!("Appended {} new channels", written);
        Ok(written)
    }

    /// Remove every stored channel
    pub async fn delete_all(&self) -> AppResult<u64> {
        let result = Channels::delete_many().exec(&*self.connection).await?;
        Ok(result.rows_affected)
    }

    fn active_model(
        record: &ChannelRecord,
        now: chrono::DateTime<chrono::Utc>,
    ) -> channels::ActiveModel {
        channels::ActiveModel {
            name: Set(record.name.clone()),
            stream_url: Set(record.stream_url.clone()),
            discovered_at: Set(now),
            ..Default::default()
        }
    }

    fn on_conflict() -> OnConflict {
        OnConflict::columns([channels::Column::Name, channels::Column::StreamUrl])
            .do_nothing()
            .to_owned()
    }

    fn model_to_domain(model: channels::Model) -> ChannelRecord {
        ChannelRecord {
            name: model.name,
            stream_url: model.stream_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::Database;

    async fn memory_database() -> Database {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            insert_batch_size: 3,
            ..DatabaseConfig::default()
        };
        Database::open(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_append_only_unions_with_existing_rows() {
        let repo = memory_database().await.channels();
        assert!(repo.insert_channel("CCTV-1", "http://a/1.m3u8").await.unwrap());

        let discovered = vec![
            ChannelRecord::new("CCTV-1", "http://a/1.m3u8"),
            ChannelRecord::new("CCTV-1", "http://b/1.m3u8"),
            ChannelRecord::new("CCTV-2", "http://a/2.m3u8"),
            ChannelRecord::new("CCTV-2", "http://a/2.m3u8"),
        ];
        assert_eq!(repo.append_new(&discovered).await.unwrap(), 2);

        let stored = repo.find_all().await.unwrap();
        assert_eq!(
            stored,
            vec![
                ChannelRecord::new("CCTV-1", "http://a/1.m3u8"),
                ChannelRecord::new("CCTV-1", "http://b/1.m3u8"),
                ChannelRecord::new("CCTV-2", "http://a/2.m3u8"),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_identical_append_writes_nothing() {
        let repo = memory_database().await.channels();
        let discovered: Vec<ChannelRecord> = (0..7)
            .map(|i| ChannelRecord::new(format!("CCTV-{i}"), format!("http://a/{i}.m3u8")))
            .collect();

        assert_eq!(repo.append_new(&discovered).await.unwrap(), 7);
        assert_eq!(repo.append_new(&discovered).await.unwrap(), 0);
        assert_eq!(repo.find_all().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_duplicate_single_insert_is_ignored() {
        let repo = memory_database().await.channels();
        assert!(repo.insert_channel("CCTV-5", "http://a/5.m3u8").await.unwrap());
        assert!(!repo.insert_channel("CCTV-5", "http://a/5.m3u8").await.unwrap());
        assert_eq!(repo.delete_all().await.unwrap(), 1);
    }
}
