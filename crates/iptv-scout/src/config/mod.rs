use anyhow::{Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::duration;

use crate::ranking::RankStrategy;

/// Environment variable prefix for configuration overrides, e.g.
/// `IPTV_SCOUT_SPEED_TEST__CONCURRENCY=512`.
pub const ENV_PREFIX: &str = "IPTV_SCOUT_";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub speed_test: SpeedTestConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub playlist: PlaylistConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    pub max_connections: Option<u32>,
    /// Rows per INSERT statement when appending channels/addresses
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,
}

/// Manifest discovery: candidate sweep and JSON manifest probing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_discovery_concurrency")]
    pub concurrency: usize,
    /// Deadline for a single candidate once it has been admitted
    #[serde(default = "default_discovery_unit_timeout", with = "duration")]
    pub unit_timeout: Duration,
    /// Connect and total timeout of the manifest GET
    #[serde(default = "default_manifest_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
    #[serde(default = "default_octet_start")]
    pub octet_start: u8,
    #[serde(default = "default_octet_end")]
    pub octet_end: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedTestConfig {
    #[serde(default = "default_speed_test_concurrency")]
    pub concurrency: usize,
    /// Per-channel deadline in throughput-only mode
    #[serde(default = "default_speed_test_unit_timeout", with = "duration")]
    pub unit_timeout: Duration,
    /// Per-channel deadline when resolution probing is enabled
    #[serde(default = "default_resolution_unit_timeout", with = "duration")]
    pub resolution_unit_timeout: Duration,
    #[serde(default = "default_speed_test_connect_timeout", with = "duration")]
    pub connect_timeout: Duration,
    /// Results at or below this throughput are dropped
    #[serde(default = "default_min_speed_kbps")]
    pub min_speed_kbps: f64,
    #[serde(default = "default_probe_resolution")]
    pub probe_resolution: bool,
    #[serde(default = "default_ffprobe_command")]
    pub ffprobe_command: String,
    #[serde(default = "default_ffprobe_timeout", with = "duration")]
    pub ffprobe_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RankingConfig {
    #[serde(default)]
    pub strategy: RankStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    #[serde(default = "default_playlist_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_epg_url")]
    pub epg_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryEncoding {
    Base64,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Result page markup scanned for `http://a.b.c.d:port`
    Html,
    /// JSON body with a `matches` array of host records
    JsonMatches,
}

/// One search index queried during address harvesting.
///
/// `query_template` has `{region}` substituted, is encoded with `encoding`,
/// and the result replaces `{query}` in `url_template`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestSourceConfig {
    pub name: String,
    pub url_template: String,
    pub query_template: String,
    pub encoding: QueryEncoding,
    pub format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    #[serde(default = "default_harvest_regions")]
    pub regions: Vec<String>,
    /// Pause after each search request
    #[serde(default = "default_harvest_request_delay", with = "duration")]
    pub request_delay: Duration,
    #[serde(default = "default_harvest_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_harvest_sources")]
    pub sources: Vec<HarvestSourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_publish_cron")]
    pub publish_cron: String,
    #[serde(default = "default_discovery_cron")]
    pub discovery_cron: String,
    #[serde(default = "default_harvest_cron")]
    pub harvest_cron: String,
    /// Concurrency ceiling used by the scheduled publish job
    #[serde(default = "default_publish_concurrency")]
    pub publish_concurrency: usize,
    #[serde(default = "default_schedule_poll_interval", with = "duration")]
    pub poll_interval: Duration,
}

// Database defaults
fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_insert_batch_size() -> usize {
    DEFAULT_INSERT_BATCH_SIZE
}

// Discovery defaults
fn default_discovery_concurrency() -> usize {
    DEFAULT_DISCOVERY_CONCURRENCY
}

fn default_discovery_unit_timeout() -> Duration {
    Duration::from_secs(DEFAULT_DISCOVERY_UNIT_TIMEOUT_SECS)
}

fn default_manifest_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_MANIFEST_REQUEST_TIMEOUT_SECS)
}

fn default_manifest_path() -> String {
    DEFAULT_MANIFEST_PATH.to_string()
}

fn default_octet_start() -> u8 {
    DEFAULT_OCTET_START
}

fn default_octet_end() -> u8 {
    DEFAULT_OCTET_END
}

// Speed test defaults
fn default_speed_test_concurrency() -> usize {
    DEFAULT_SPEED_TEST_CONCURRENCY
}

fn default_speed_test_unit_timeout() -> Duration {
    Duration::from_secs(DEFAULT_SPEED_TEST_UNIT_TIMEOUT_SECS)
}

fn default_resolution_unit_timeout() -> Duration {
    Duration::from_secs(DEFAULT_RESOLUTION_UNIT_TIMEOUT_SECS)
}

fn default_speed_test_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_SPEED_TEST_CONNECT_TIMEOUT_SECS)
}

fn default_min_speed_kbps() -> f64 {
    DEFAULT_MIN_SPEED_KBPS
}

fn default_probe_resolution() -> bool {
    DEFAULT_PROBE_RESOLUTION
}

fn default_ffprobe_command() -> String {
    DEFAULT_FFPROBE_COMMAND.to_string()
}

fn default_ffprobe_timeout() -> Duration {
    Duration::from_secs(DEFAULT_FFPROBE_TIMEOUT_SECS)
}

// Playlist defaults
fn default_playlist_path() -> PathBuf {
    PathBuf::from(DEFAULT_PLAYLIST_PATH)
}

fn default_epg_url() -> String {
    DEFAULT_EPG_URL.to_string()
}

// Harvest defaults
fn default_harvest_regions() -> Vec<String> {
    DEFAULT_HARVEST_REGIONS
        .iter()
        .map(|r| r.to_string())
        .collect()
}

fn default_harvest_request_delay() -> Duration {
    Duration::from_secs(DEFAULT_HARVEST_REQUEST_DELAY_SECS)
}

fn default_harvest_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_HARVEST_REQUEST_TIMEOUT_SECS)
}

fn default_harvest_sources() -> Vec<HarvestSourceConfig> {
    vec![
        HarvestSourceConfig {
            name: "zoomeye".to_string(),
            url_template: "https://www.zoomeye.org/api/search?q={query}".to_string(),
            query_template: "/iptv/live/zh_cn.js +country:\"CN\" +subdivisions:\"{region}\""
                .to_string(),
            encoding: QueryEncoding::Percent,
            format: ResponseFormat::JsonMatches,
        },
        HarvestSourceConfig {
            name: "fofa".to_string(),
            url_template: "https://fofa.info/result?qbase64={query}".to_string(),
            query_template: "\"iptv/live/zh_cn.js\" && country=\"CN\" && region=\"{region}\""
                .to_string(),
            encoding: QueryEncoding::Base64,
            format: ResponseFormat::Html,
        },
    ]
}

// Schedule defaults
fn default_publish_cron() -> String {
    DEFAULT_PUBLISH_CRON.to_string()
}

fn default_discovery_cron() -> String {
    DEFAULT_DISCOVERY_CRON.to_string()
}

fn default_harvest_cron() -> String {
    DEFAULT_HARVEST_CRON.to_string()
}

fn default_publish_concurrency() -> usize {
    DEFAULT_PUBLISH_CONCURRENCY
}

fn default_schedule_poll_interval() -> Duration {
    Duration::from_secs(DEFAULT_SCHEDULE_POLL_SECS)
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: Some(DEFAULT_MAX_CONNECTIONS),
            insert_batch_size: default_insert_batch_size(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            concurrency: default_discovery_concurrency(),
            unit_timeout: default_discovery_unit_timeout(),
            request_timeout: default_manifest_request_timeout(),
            manifest_path: default_manifest_path(),
            octet_start: default_octet_start(),
            octet_end: default_octet_end(),
        }
    }
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        Self {
            concurrency: default_speed_test_concurrency(),
            unit_timeout: default_speed_test_unit_timeout(),
            resolution_unit_timeout: default_resolution_unit_timeout(),
            connect_timeout: default_speed_test_connect_timeout(),
            min_speed_kbps: default_min_speed_kbps(),
            probe_resolution: default_probe_resolution(),
            ffprobe_command: default_ffprobe_command(),
            ffprobe_timeout: default_ffprobe_timeout(),
        }
    }
}

impl SpeedTestConfig {
    /// Per-channel deadline for the configured mode
    pub fn effective_unit_timeout(&self) -> Duration {
        if self.probe_resolution {
            self.resolution_unit_timeout
        } else {
            self.unit_timeout
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            output_path: default_playlist_path(),
            epg_url: default_epg_url(),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            regions: default_harvest_regions(),
            request_delay: default_harvest_request_delay(),
            request_timeout: default_harvest_request_timeout(),
            sources: default_harvest_sources(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            publish_cron: default_publish_cron(),
            discovery_cron: default_discovery_cron(),
            harvest_cron: default_harvest_cron(),
            publish_concurrency: default_publish_concurrency(),
            poll_interval: default_schedule_poll_interval(),
        }
    }
}

impl Config {
    /// Load configuration layered as defaults, then the TOML file, then
    /// `IPTV_SCOUT_*` environment variables. A missing file is created with
    /// the default values.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let path = Path::new(config_file);
        if !path.exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, contents)?;
            info!("Created default config file: {}", config_file);
        }

        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.discovery.concurrency == 0 || self.speed_test.concurrency == 0 {
            bail!("Concurrency ceilings must be greater than zero");
        }
        if self.schedule.publish_concurrency == 0 {
            bail!("schedule.publish_concurrency must be greater than zero");
        }
        if self.discovery.octet_start == 0 || self.discovery.octet_start > self.discovery.octet_end
        {
            bail!(
                "Invalid octet sweep {}..={}",
                self.discovery.octet_start,
                self.discovery.octet_end
            );
        }
        if self.speed_test.min_speed_kbps < 0.0 {
            bail!("speed_test.min_speed_kbps must not be negative");
        }
        if self.database.insert_batch_size == 0 {
            bail!("database.insert_batch_size must be greater than zero");
        }
        for (name, expression) in [
            ("publish_cron", &self.schedule.publish_cron),
            ("discovery_cron", &self.schedule.discovery_cron),
            ("harvest_cron", &self.schedule.harvest_cron),
        ] {
            if let Err(e) = crate::utils::cron_helper::validate_cron_expression(expression) {
                bail!("schedule.{}: {}", name, e);
            }
        }
        for source in &self.harvest.sources {
            if !source.url_template.contains("{query}") {
                bail!(
                    "harvest source '{}' url_template is missing the {{query}} placeholder",
                    source.name
                );
            }
        }
        Ok(())
    }
}
