//! SeaORM-based repository for the last published playlist snapshot

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set, TransactionTrait};
use std::sync::Arc;
use tracing::debug;

use crate::entities::{prelude::RankedResults, ranked_results};
use crate::errors::AppResult;
use crate::models::RankedEntry;

#[derive(Clone)]
pub struct RankedResultSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
    insert_batch_size: usize,
}

impl RankedResultSeaOrmRepository {
    /// Create a new repository instance
    pub fn new(connection: Arc<DatabaseConnection>, insert_batch_size: usize) -> Self {
        Self {
            connection,
            insert_batch_size: insert_batch_size.max(1),
        }
    }

    /// Entries of the last snapshot in published order
    pub async fn find_all(&self) -> AppResult<Vec<RankedEntry>> {
        let models = RankedResults::find()
            .order_by_asc(ranked_results::Column::Id)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Self::model_to_domain).collect())
    }

    /// Replace the snapshot with `entries` in one transaction
    pub async fn replace_all(&self, entries: &[RankedEntry]) -> AppResult<u64> {
        let now = chrono::Utc::now();
        let txn = self.connection.begin().await?;

        let removed = RankedResults::delete_many().exec(&txn).await?.rows_affected;

        let mut written = 0;
        for chunk in entries.chunks(self.insert_batch_size) {
            let models = chunk.iter().map(|entry| ranked_results::ActiveModel {
                name: Set(entry.name.clone()),
                stream_url: Set(entry.stream_url.clone()),
                speed_kbps: Set(entry.speed_kbps),
                resolution_px: Set(i32::try_from(entry.resolution_px).unwrap_or(i32::MAX)),
                tested_at: Set(now),
                ..Default::default()
            });
            written += RankedResults::insert_many(models)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        debug!(
            "Replaced ranked results snapshot ({} removed, {} written)",
            removed, written
        );
        Ok(written)
    }

    fn model_to_domain(model: ranked_results::Model) -> RankedEntry {
        RankedEntry {
            name: model.name,
            stream_url: model.stream_url,
            speed_kbps: model.speed_kbps,
            resolution_px: u32::try_from(model.resolution_px).unwrap_or(0),
        }
    }
}
