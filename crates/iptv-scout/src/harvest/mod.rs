//! Address harvesting from public search indexes
//!
//! Each configured search index is queried once per region. Result pages are
//! scanned for portal addresses (`scheme://ip:port`), which seed the manifest
//! discovery sweep.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{HarvestConfig, HarvestSourceConfig, QueryEncoding, ResponseFormat};
use crate::errors::{AppResult, UnitError, UnitResult};
use crate::utils::HttpClientFactory;

static HTTP_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http://\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}:\d+")
        .unwrap_or_else(|e| panic!("invalid address pattern: {e}"))
});

/// A search index that can be asked for portal addresses
#[async_trait]
pub trait AddressSource: Send + Sync {
    fn name(&self) -> &str;

    /// One request URL per region
    fn query_urls(&self, regions: &[String]) -> Vec<String>;

    async fn fetch_addresses(&self, url: &str) -> UnitResult<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct SearchMatches {
    matches: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    ip: Option<String>,
    portinfo: Option<PortInfo>,
}

#[derive(Debug, Deserialize)]
struct PortInfo {
    service: Option<String>,
    port: Option<u16>,
}

/// Every `http://a.b.c.d:port` in a result page, first occurrence order
pub fn extract_html_addresses(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HTTP_ADDRESS
        .find_iter(body)
        .map(|m| m.as_str().to_string())
        .filter(|address| seen.insert(address.clone()))
        .collect()
}

/// `service://ip:port` for every complete entry of a `matches` array
pub fn extract_json_addresses(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let parsed: SearchMatches = serde_json::from_str(body)?;
    let mut seen = HashSet::new();
    Ok(parsed
        .matches
        .into_iter()
        .filter_map(|m| {
            let portinfo = m.portinfo?;
            Some(format!("{}://{}:{}", portinfo.service?, m.ip?, portinfo.port?))
        })
        .filter(|address| seen.insert(address.clone()))
        .collect())
}

/// A configured search index queried over HTTP
pub struct SearchIndexSource {
    config: HarvestSourceConfig,
    client: Client,
}

impl SearchIndexSource {
    pub fn new(config: HarvestSourceConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn encode_query(&self, query: &str) -> String {
        match self.config.encoding {
            QueryEncoding::Base64 => STANDARD.encode(query.as_bytes()),
            QueryEncoding::Percent => urlencoding::encode(query).into_owned(),
        }
    }
}

#[async_trait]
impl AddressSource for SearchIndexSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn query_urls(&self, regions: &[String]) -> Vec<String> {
        regions
            .iter()
            .map(|region| {
                let query = self.config.query_template.replace("{region}", region);
                self.config
                    .url_template
                    .replace("{query}", &self.encode_query(&query))
            })
            .collect()
    }

    async fn fetch_addresses(&self, url: &str) -> UnitResult<Vec<String>> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UnitError::from_reqwest(url, e))?
            .text()
            .await
            .map_err(|e| UnitError::from_reqwest(url, e))?;

        match self.config.format {
            ResponseFormat::Html => Ok(extract_html_addresses(&body)),
            ResponseFormat::JsonMatches => {
                extract_json_addresses(&body).map_err(|e| UnitError::parse(url, e.to_string()))
            }
        }
    }
}

/// Queries every source for every region, one request at a time
pub struct Harvester {
    sources: Vec<Box<dyn AddressSource>>,
    regions: Vec<String>,
    request_delay: Duration,
}

impl Harvester {
    pub fn new(
        sources: Vec<Box<dyn AddressSource>>,
        regions: Vec<String>,
        request_delay: Duration,
    ) -> Self {
        Self {
            sources,
            regions,
            request_delay,
        }
    }

    pub fn from_config(config: &HarvestConfig, factory: &HttpClientFactory) -> AppResult<Self> {
        let client = factory.with_timeout(config.request_timeout)?;
        let sources = config
            .sources
            .iter()
            .map(|source| {
                Box::new(SearchIndexSource::new(source.clone(), client.clone()))
                    as Box<dyn AddressSource>
            })
            .collect();
        Ok(Self::new(
            sources,
            config.regions.clone(),
            config.request_delay,
        ))
    }

    /// Collect addresses from all sources. Failed queries are logged and
    /// skipped; the result is deduplicated in first-seen order.
    pub async fn harvest(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut addresses = Vec::new();

        for source in &self.sources {
            let mut from_source = 0;
            for url in source.query_urls(&self.regions) {
                debug!("Querying {}: {}", source.name(), url);
                match source.fetch_addresses(&url).await {
                    Ok(found) => {
                        debug!("{} returned {} addresses", source.name(), found.len());
                        for address in found {
                            if seen.insert(address.clone()) {
                                addresses.push(address);
                                from_source += 1;
                            }
                        }
                    }
                    Err(e) => warn!("{} query failed ({}): {}", source.name(), e.kind(), e),
                }
                if !self.request_delay.is_zero() {
                    tokio::time::sleep(self.request_delay).await;
                }
            }
            info!("{} yielded {} new addresses", source.name(), from_source);
        }

        addresses
    }
}
