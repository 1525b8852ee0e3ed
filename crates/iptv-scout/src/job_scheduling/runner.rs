//! Standalone pipeline entry points

use std::path::Path;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::config::Config;
use crate::database::Database;
use crate::errors::AppResult;
use crate::services::{
    AddressHarvestService, DiscoveryReport, HarvestReport, ManifestDiscoveryService,
    PublishReport, SpeedRankService,
};
use crate::utils::HttpClientFactory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    /// Speed test, rank and write the playlist
    Publish,
    /// Sweep stored addresses for channel manifests
    Discovery,
    /// Query search indexes for portal addresses
    Harvest,
}

/// Runs pipelines against the configured store
#[derive(Clone)]
pub struct JobRunner {
    config: Arc<Config>,
    http: HttpClientFactory,
}

impl JobRunner {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            http: HttpClientFactory::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Probe every candidate derived from the stored addresses and append
    /// newly found channels
    pub async fn run_manifest_discovery(&self) -> AppResult<DiscoveryReport> {
        let service = ManifestDiscoveryService::from_config(&self.config.discovery, &self.http)?;
        let database = Database::open(&self.config.database).await?;
        let result = service.run(&database).await;
        Self::close_after(database, result).await
    }

    /// Speed test stored channels and publish the ranked playlist
    pub async fn run_speed_rank_and_publish(
        &self,
        output_path: &Path,
        concurrency: usize,
    ) -> AppResult<PublishReport> {
        let service = SpeedRankService::from_config(
            &self.config.speed_test,
            &self.config.ranking,
            &self.config.playlist,
            &self.http,
        )?;
        let database = Database::open(&self.config.database).await?;
        let result = service.run(&database, output_path, concurrency).await;
        Self::close_after(database, result).await
    }

    /// Query the search indexes and store new portal addresses
    pub async fn run_address_harvest(&self) -> AppResult<HarvestReport> {
        let service = AddressHarvestService::from_config(&self.config.harvest, &self.http)?;
        let database = Database::open(&self.config.database).await?;
        let result = service.run(&database).await;
        Self::close_after(database, result).await
    }

    /// Run a job with its scheduled parameters
    pub async fn run_job(&self, kind: JobKind) -> AppResult<()> {
        info!("Starting {} job", kind);
        match kind {
            JobKind::Publish => {
                let report = self
                    .run_speed_rank_and_publish(
                        &self.config.playlist.output_path,
                        self.config.schedule.publish_concurrency,
                    )
                    .await?;
                info!(
                    "Publish finished: {} channels tested, {} published",
                    report.channels_tested, report.published
                );
            }
            JobKind::Discovery => {
                let report = self.run_manifest_discovery().await?;
                info!(
                    "Discovery finished: {} candidates probed, {} channels found, {} new",
                    report.candidates, report.channels_found, report.channels_added
                );
            }
            JobKind::Harvest => {
                let report = self.run_address_harvest().await?;
                info!(
                    "Harvest finished: {} addresses, {} new",
                    report.harvested, report.added
                );
            }
        }
        Ok(())
    }

    async fn close_after<T>(database: Database, result: AppResult<T>) -> AppResult<T> {
        let closed = database.close().await;
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_error) = closed {
                    warn!("Failed to close database after error: {}", close_error);
                }
                Err(e)
            }
        }
    }
}
