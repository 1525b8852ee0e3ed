//! Per-channel throughput test

use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::debug;

use super::playlist::resolve_segment_url;
use super::resolution::{FfprobeResolutionProbe, ResolutionProbe};
use crate::config::SpeedTestConfig;
use crate::errors::{AppResult, UnitError, UnitResult};
use crate::models::{ChannelRecord, SpeedResult};
use crate::utils::HttpClientFactory;

/// KB/s for `bytes` downloaded in `elapsed`, with the elapsed time rounded to
/// whole seconds (at least one) and the result rounded to two decimals
pub fn throughput_kbps(bytes: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64().round().max(1.0);
    let kbps = bytes as f64 / seconds / 1024.0;
    (kbps * 100.0).round() / 100.0
}

struct ResolutionMode {
    probe: Arc<dyn ResolutionProbe>,
    scratch: TempDir,
}

/// Downloads the first segment of a channel's playlist and times it
#[derive(Clone)]
pub struct SpeedTester {
    client: Client,
    min_speed_kbps: f64,
    resolution: Option<Arc<ResolutionMode>>,
}

impl SpeedTester {
    pub fn new(client: Client, min_speed_kbps: f64) -> Self {
        Self {
            client,
            min_speed_kbps,
            resolution: None,
        }
    }

    /// Build a tester from configuration. Resolution probing uses ffprobe.
    pub fn from_config(config: &SpeedTestConfig, factory: &HttpClientFactory) -> AppResult<Self> {
        let client = factory.with_connect_timeout(config.connect_timeout)?;
        let tester = Self::new(client, config.min_speed_kbps);
        if config.probe_resolution {
            let probe =
                FfprobeResolutionProbe::new(config.ffprobe_command.clone(), config.ffprobe_timeout);
            tester.with_resolution_probe(Arc::new(probe))
        } else {
            Ok(tester)
        }
    }

    /// Enable resolution probing. Segments are written to a scratch
    /// directory that is removed when the last clone of the tester drops.
    pub fn with_resolution_probe(mut self, probe: Arc<dyn ResolutionProbe>) -> AppResult<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("iptv-scout-segments-")
            .tempdir()?;
        self.resolution = Some(Arc::new(ResolutionMode {
            probe,
            scratch,
        }));
        Ok(self)
    }

    /// Results at or below the floor are discarded
    pub fn accepts(&self, speed_kbps: f64) -> bool {
        speed_kbps > self.min_speed_kbps
    }

    /// Measure one channel. `Ok(None)` means the channel was reachable but
    /// too slow.
    pub async fn test_channel(&self, record: ChannelRecord) -> UnitResult<Option<SpeedResult>> {
        let playlist_url = record.stream_url.as_str();
        let response = self
            .client
            .get(playlist_url)
            .send()
            .await
            .map_err(|e| UnitError::from_reqwest(playlist_url, e))?;
        if !response.status().is_success() {
            return Err(UnitError::Status {
                url: playlist_url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| UnitError::from_reqwest(playlist_url, e))?;

        let segment_url = resolve_segment_url(playlist_url, &body)
            .ok_or_else(|| UnitError::parse(playlist_url, "playlist has no segment lines"))?;

        let (speed_kbps, resolution_px) = match &self.resolution {
            Some(mode) => {
                let segment = tempfile::Builder::new()
                    .prefix("segment-")
                    .suffix(".ts")
                    .tempfile_in(mode.scratch.path())
                    .map_err(|e| UnitError::io(&segment_url, e))?;
                let speed = self.download(&segment_url, Some(segment.path())).await?;
                if !self.accepts(speed) {
                    (speed, 0)
                } else {
                    (speed, mode.probe.probe_height(segment.path()).await)
                }
            }
            None => (self.download(&segment_url, None).await?, 0),
        };

        if !self.accepts(speed_kbps) {
            debug!(
                "{} too slow at {} KB/s, dropping",
                record.stream_url, speed_kbps
            );
            return Ok(None);
        }

        debug!(
            "{} ({}) downloads at {} KB/s",
            record.stream_url, record.name, speed_kbps
        );
        Ok(Some(SpeedResult::new(record, speed_kbps, resolution_px)))
    }

    /// Download a segment, optionally copying it to `sink`, and return KB/s
    async fn download(&self, segment_url: &str, sink: Option<&Path>) -> UnitResult<f64> {
        let started = Instant::now();
        let mut response = self
            .client
            .get(segment_url)
            .send()
            .await
            .map_err(|e| UnitError::from_reqwest(segment_url, e))?;
        if !response.status().is_success() {
            return Err(UnitError::Status {
                url: segment_url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file = match sink {
            Some(path) => Some(
                tokio::fs::File::create(path)
                    .await
                    .map_err(|e| UnitError::io(segment_url, e))?,
            ),
            None => None,
        };

        let mut bytes: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| UnitError::from_reqwest(segment_url, e))?
        {
            bytes += chunk.len() as u64;
            if let Some(file) = file.as_mut() {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| UnitError::io(segment_url, e))?;
            }
        }
        if let Some(file) = file.as_mut() {
            file.flush().await.map_err(|e| UnitError::io(segment_url, e))?;
        }

        Ok(throughput_kbps(bytes, started.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedHeight {
        height: u32,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResolutionProbe for FixedHeight {
        async fn probe_height(&self, path: &Path) -> u32 {
            assert!(path.exists());
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.height
        }
    }

    fn tester() -> SpeedTester {
        SpeedTester::new(Client::new(), 10.0)
    }

    async fn serve_channel(server: &MockServer, segment_bytes: usize) {
        Mock::given(method("GET"))
            .and(path("/live/1/index.m3u8"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("#EXTM3U\n#EXTINF:10,\n/other/dir/seg-1.ts\n"),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/live/1/seg-1.ts"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; segment_bytes]))
            .mount(server)
            .await;
    }

    #[rstest]
    #[case(0, Duration::from_millis(10), 0.0)]
    #[case(51_200, Duration::from_millis(300), 50.0)]
    #[case(102_400, Duration::from_millis(1600), 50.0)]
    #[case(10_250, Duration::ZERO, 10.01)]
    #[case(1_000, Duration::from_secs(3), 0.33)]
    fn test_throughput_kbps(#[case] bytes: u64, #[case] elapsed: Duration, #[case] expected: f64) {
        assert_eq!(throughput_kbps(bytes, elapsed), expected);
    }

    #[test]
    fn test_threshold_is_strict() {
        let tester = tester();
        assert!(!tester.accepts(10.0));
        assert!(tester.accepts(10.01));
    }

    #[tokio::test]
    async fn test_measures_first_segment() {
        let server = MockServer::start().await;
        serve_channel(&server, 80 * 1024).await;

        let record = ChannelRecord::new("CCTV-1", format!("{}/live/1/index.m3u8", server.uri()));
        let result = tester().test_channel(record.clone()).await.unwrap().unwrap();

        assert_eq!(result.name, "CCTV-1");
        assert_eq!(result.stream_url, record.stream_url);
        assert_eq!(result.speed_kbps, 80.0);
        assert_eq!(result.resolution_px, 0);
    }

    #[tokio::test]
    async fn test_slow_channel_is_dropped() {
        let server = MockServer::start().await;
        serve_channel(&server, 10 * 1024).await;

        let record = ChannelRecord::new("CCTV-2", format!("{}/live/1/index.m3u8", server.uri()));
        assert!(tester().test_channel(record).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_segment_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live/1/index.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n"))
            .mount(&server)
            .await;

        let record = ChannelRecord::new("CCTV-3", format!("{}/live/1/index.m3u8", server.uri()));
        assert!(matches!(
            tester().test_channel(record).await,
            Err(UnitError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolution_probe_sees_downloaded_segment() {
        let server = MockServer::start().await;
        serve_channel(&server, 64 * 1024).await;

        let probe = Arc::new(FixedHeight {
            height: 1080,
            calls: AtomicUsize::new(0),
        });
        let tester = tester().with_resolution_probe(probe.clone()).unwrap();

        let record = ChannelRecord::new("CCTV-4", format!("{}/live/1/index.m3u8", server.uri()));
        let result = tester.test_channel(record).await.unwrap().unwrap();

        assert_eq!(result.resolution_px, 1080);
        assert_eq!(result.speed_kbps, 64.0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }
}
