//! Shared helpers: HTTP client construction, URL handling and cron parsing

pub mod cron_helper;
pub mod http_client;
pub mod url;

pub use http_client::HttpClientFactory;
pub use self::url::UrlUtils;
