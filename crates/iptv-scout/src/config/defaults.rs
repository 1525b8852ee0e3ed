/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/iptv-scout.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 500;

// Manifest discovery defaults
pub const DEFAULT_DISCOVERY_CONCURRENCY: usize = 5000;
pub const DEFAULT_DISCOVERY_UNIT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MANIFEST_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MANIFEST_PATH: &str = "/iptv/live/1000.json?key=txiptv";
pub const DEFAULT_OCTET_START: u8 = 1;
pub const DEFAULT_OCTET_END: u8 = 255;

// Speed test defaults
pub const DEFAULT_SPEED_TEST_CONCURRENCY: usize = 1024;
pub const DEFAULT_SPEED_TEST_UNIT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RESOLUTION_UNIT_TIMEOUT_SECS: u64 = 6000;
pub const DEFAULT_SPEED_TEST_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MIN_SPEED_KBPS: f64 = 10.0;
pub const DEFAULT_PROBE_RESOLUTION: bool = false;
pub const DEFAULT_FFPROBE_COMMAND: &str = "ffprobe";
pub const DEFAULT_FFPROBE_TIMEOUT_SECS: u64 = 30;

// Playlist defaults
pub const DEFAULT_PLAYLIST_PATH: &str = "iptv.m3u";
pub const DEFAULT_EPG_URL: &str = "http://epg.51zmt.top:8000/e.xml.gz";

// Harvest defaults
pub const DEFAULT_HARVEST_REQUEST_DELAY_SECS: u64 = 5;
pub const DEFAULT_HARVEST_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HARVEST_REGIONS: &[&str] = &[
    "beijing",
    "tianjin",
    "hebei",
    "shanxi",
    "neimenggu",
    "liaoning",
    "jilin",
    "heilongjiang",
    "shanghai",
    "jiangsu",
    "zhejiang",
    "anhui",
    "fujian",
    "jiangxi",
    "shandong",
    "henan",
    "hubei",
    "hunan",
    "guangdong",
    "hainan",
    "chongqing",
    "sichuan",
    "guizhou",
    "yunnan",
    "shaanxi",
    "gansu",
    "qinghai",
    "ningxia",
    "xinjiang",
    "xizang",
];

// Schedule defaults (sec min hour day-of-month month day-of-week)
pub const DEFAULT_PUBLISH_CRON: &str = "0 0 4 * * *";
pub const DEFAULT_DISCOVERY_CRON: &str = "0 0 5 * * *";
pub const DEFAULT_HARVEST_CRON: &str = "0 0 0 * * Mon";
pub const DEFAULT_PUBLISH_CONCURRENCY: usize = 2048;
pub const DEFAULT_SCHEDULE_POLL_SECS: u64 = 1;
