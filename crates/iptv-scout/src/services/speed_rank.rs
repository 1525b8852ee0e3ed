//! Speed test, rank and publish pipeline

use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{PlaylistConfig, RankingConfig, SpeedTestConfig};
use crate::database::Database;
use crate::errors::AppResult;
use crate::governor::{BatchExecutor, BatchStats};
use crate::models::{ChannelRecord, SpeedResult};
use crate::ranking::{PlaylistWriter, RankStrategy, reduce};
use crate::speed_test::SpeedTester;
use crate::utils::HttpClientFactory;

#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub channels_tested: usize,
    pub results: usize,
    pub published: usize,
    pub stats: BatchStats,
}

pub struct SpeedRankService {
    tester: SpeedTester,
    unit_timeout: Duration,
    strategy: RankStrategy,
    writer: PlaylistWriter,
}

impl SpeedRankService {
    pub fn new(
        tester: SpeedTester,
        unit_timeout: Duration,
        strategy: RankStrategy,
        writer: PlaylistWriter,
    ) -> Self {
        Self {
            tester,
            unit_timeout,
            strategy,
            writer,
        }
    }

    pub fn from_config(
        speed_test: &SpeedTestConfig,
        ranking: &RankingConfig,
        playlist: &PlaylistConfig,
        factory: &HttpClientFactory,
    ) -> AppResult<Self> {
        Ok(Self::new(
            SpeedTester::from_config(speed_test, factory)?,
            speed_test.effective_unit_timeout(),
            ranking.strategy,
            PlaylistWriter::new(playlist.epg_url.clone()),
        ))
    }

    /// Speed test every record under the given concurrency ceiling
    pub async fn measure(
        &self,
        records: Vec<ChannelRecord>,
        concurrency: usize,
    ) -> (Vec<SpeedResult>, BatchStats) {
        let executor = BatchExecutor::new("speed test", concurrency, self.unit_timeout);
        let tester = self.tester.clone();

        let outcome = executor
            .run(records, move |record: ChannelRecord| {
                let tester = tester.clone();
                async move { tester.test_channel(record).await }
            })
            .await;

        (outcome.results, outcome.stats)
    }

    /// Test all stored channels, keep the best source per name and write
    /// the playlist to `output_path`. The ranked entries also replace the
    /// stored snapshot of the last publish.
    pub async fn run(
        &self,
        database: &Database,
        output_path: &Path,
        concurrency: usize,
    ) -> AppResult<PublishReport> {
        let records = database.channels().find_all().await?;
        if records.is_empty() {
            warn!("Channel store is empty, run discovery first");
            return Ok(PublishReport::default());
        }

        let channels_tested = records.len();
        info!(
            "Speed testing {} channels (concurrency {}, {} strategy)",
            channels_tested, concurrency, self.strategy
        );

        let (results, stats) = self.measure(records, concurrency).await;
        let result_count = results.len();
        let ranked = reduce(results, self.strategy);
        info!(
            "{} usable results reduced to {} channels",
            result_count,
            ranked.len()
        );

        self.writer.write(output_path, &ranked).await?;
        database.ranked_results().replace_all(&ranked).await?;

        Ok(PublishReport {
            channels_tested,
            results: result_count,
            published: ranked.len(),
            stats,
        })
    }
}
