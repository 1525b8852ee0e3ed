//! SeaORM-based repository for harvested portal addresses

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::entities::{addresses, prelude::Addresses};
use crate::errors::AppResult;

#[derive(Clone)]
pub struct AddressSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
    insert_batch_size: usize,
}

impl AddressSeaOrmRepository {
    /// Create a new repository instance
    pub fn new(connection: Arc<DatabaseConnection>, insert_batch_size: usize) -> Self {
        Self {
            connection,
            insert_batch_size: insert_batch_size.max(1),
        }
    }

    /// All stored addresses in insertion order
    pub async fn find_all(&self) -> AppResult<Vec<String>> {
        let values = Addresses::find()
            .select_only()
            .column(addresses::Column::Value)
            .order_by_asc(addresses::Column::Id)
            .into_tuple::<String>()
            .all(&*self.connection)
            .await?;
        Ok(values)
    }

    /// Insert a single address, returning false when it was already stored
    pub async fn insert(&self, value: &str) -> AppResult<bool> {
        let affected = Addresses::insert(Self::active_model(value, chrono::Utc::now()))
            .on_conflict(Self::on_conflict())
            .exec_without_returning(&*self.connection)
            .await?;
        Ok(affected > 0)
    }

    /// Append the addresses that are not stored yet. Returns the number of
    /// rows written.
    pub async fn append_new(&self, values: &[String]) -> AppResult<u64> {
        let existing: HashSet<String> = self.find_all().await?.into_iter().collect();
        let mut seen = HashSet::new();
        let fresh: Vec<&String> = values
            .iter()
            .filter(|v| !existing.contains(*v) && seen.insert(v.as_str()))
            .collect();

        if fresh.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now();
        let txn = self.connection.begin().await?;
        let mut written = 0;
        for chunk in fresh.chunks(self.insert_batch_size) {
            let models = chunk.iter().map(|v| Self::active_model(v, now));
            written += Addresses::insert_many(models)
                .on_conflict(Self::on_conflict())
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        debug!("Appended {} new addresses", written);
        Ok(written)
    }

    /// Remove every stored address
    pub async fn delete_all(&self) -> AppResult<u64> {
        let result = Addresses::delete_many().exec(&*self.connection).await?;
        Ok(result.rows_affected)
    }

    fn active_model(value: &str, now: chrono::DateTime<chrono::Utc>) -> addresses::ActiveModel {
        addresses::ActiveModel {
            value: Set(value.to_string()),
            discovered_at: Set(now),
            ..Default::default()
        }
    }

    fn on_conflict() -> OnConflict {
        OnConflict::column(addresses::Column::Value)
            .do_nothing()
            .to_owned()
    }
}
