//! Manifest discovery pipeline: stored addresses -> candidate URLs -> probed
//! manifests -> new channel rows

use std::time::Duration;
use tracing::{info, warn};

use crate::config::DiscoveryConfig;
use crate::database::Database;
use crate::discovery::{CandidateGenerator, ManifestProber};
use crate::errors::{AppResult, UnitError};
use crate::governor::{BatchExecutor, BatchStats};
use crate::models::ChannelRecord;
use crate::utils::HttpClientFactory;

#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub addresses: usize,
    pub candidates: usize,
    pub channels_found: usize,
    pub channels_added: u64,
    pub stats: BatchStats,
}

pub struct ManifestDiscoveryService {
    generator: CandidateGenerator,
    prober: ManifestProber,
    concurrency: usize,
    unit_timeout: Duration,
}

impl ManifestDiscoveryService {
    pub fn new(
        generator: CandidateGenerator,
        prober: ManifestProber,
        concurrency: usize,
        unit_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            prober,
            concurrency,
            unit_timeout,
        }
    }

    pub fn from_config(config: &DiscoveryConfig, factory: &HttpClientFactory) -> AppResult<Self> {
        let client = factory.with_timeout(config.request_timeout)?;
        Ok(Self::new(
            CandidateGenerator::from_config(config),
            ManifestProber::new(client),
            config.concurrency,
            config.unit_timeout,
        ))
    }

    /// Probe every candidate and return all channels found, with the batch
    /// statistics
    pub async fn probe_candidates(
        &self,
        candidates: Vec<String>,
    ) -> (Vec<ChannelRecord>, BatchStats) {
        let executor = BatchExecutor::new("manifest probe", self.concurrency, self.unit_timeout);
        let prober = self.prober.clone();

        let outcome = executor
            .run(candidates, move |url: String| {
                let prober = prober.clone();
                async move {
                    let records = prober.try_probe(&url).await?;
                    Ok::<_, UnitError>((!records.is_empty()).then_some(records))
                }
            })
            .await;

        let channels = outcome.results.into_iter().flatten().collect();
        (channels, outcome.stats)
    }

    /// Sweep the stored addresses and append newly seen channels
    pub async fn run(&self, database: &Database) -> AppResult<DiscoveryReport> {
        let addresses = database.addresses().find_all().await?;
        if addresses.is_empty() {
            warn!("No portal addresses stored, run a harvest first");
            return Ok(DiscoveryReport::default());
        }

        let candidates = self.generator.generate(&addresses);
        let candidate_count = candidates.len();
        info!(
            "Probing {} candidate manifests from {} addresses",
            candidate_count,
            addresses.len()
        );

        let (channels, stats) = self.probe_candidates(candidates).await;
        info!("Found {} channels", channels.len());

        let channels_added = database.channels().append_new(&channels).await?;
        info!("Stored {} new channels", channels_added);

        Ok(DiscoveryReport {
            addresses: addresses.len(),
            candidates: candidate_count,
            channels_found: channels.len(),
            channels_added,
            stats,
        })
    }
}
