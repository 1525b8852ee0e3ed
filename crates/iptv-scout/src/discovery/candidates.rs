//! Expansion of known portal addresses into manifest probe URLs
//!
//! `http://1.2.3.4:8080` becomes `http://1.2.3.1:8080/iptv/live/1000.json?key=txiptv`
//! through `http://1.2.3.255:8080/...`: the last octet in front of the port is
//! swept over the configured range.

use regex::Regex;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::config::DiscoveryConfig;

static LAST_OCTET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\d+:").unwrap_or_else(|e| panic!("invalid octet pattern: {e}"))
});

#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    manifest_path: String,
    octets: RangeInclusive<u8>,
}

impl CandidateGenerator {
    pub fn new<S: Into<String>>(manifest_path: S, octets: RangeInclusive<u8>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            octets,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(
            config.manifest_path.clone(),
            config.octet_start..=config.octet_end,
        )
    }

    /// Probe URLs for a single address, or `None` when the address has no
    /// `.<octet>:<port>` part to sweep
    pub fn expand(&self, address: &str) -> Option<Vec<String>> {
        let address = address.trim().trim_end_matches('/');
        let found = LAST_OCTET.find(address)?;
        let prefix = &address[..found.start()];
        // Keep the ':' that closed the match
        let suffix = &address[found.end() - 1..];

        Some(
            self.octets
                .clone()
                .map(|octet| format!("{prefix}.{octet}{suffix}{}", self.manifest_path))
                .collect(),
        )
    }

    /// Expand every address and drop duplicate URLs, keeping first-seen order
    pub fn generate(&self, addresses: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for address in addresses {
            match self.expand(address) {
                Some(urls) => {
                    for url in urls {
                        if seen.insert(url.clone()) {
                            candidates.push(url);
                        }
                    }
                }
                None => warn!("Skipping address without an IPv4 host and port: {}", address),
            }
        }

        debug!(
            "Generated {} candidate URLs from {} addresses",
            candidates.len(),
            addresses.len()
        );
        candidates
    }
}
