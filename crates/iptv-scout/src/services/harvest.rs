//! Address harvest pipeline

use tracing::{info, warn};

use crate::config::HarvestConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::harvest::Harvester;
use crate::utils::HttpClientFactory;

#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub harvested: usize,
    pub added: u64,
}

pub struct AddressHarvestService {
    harvester: Harvester,
}

impl AddressHarvestService {
    pub fn new(harvester: Harvester) -> Self {
        Self { harvester }
    }

    pub fn from_config(config: &HarvestConfig, factory: &HttpClientFactory) -> AppResult<Self> {
        Ok(Self::new(Harvester::from_config(config, factory)?))
    }

    /// Query the search indexes and store addresses not seen before
    pub async fn run(&self, database: &Database) -> AppResult<HarvestReport> {
        let addresses = self.harvester.harvest().await;
        if addresses.is_empty() {
            warn!("Search indexes returned no addresses, possibly rate limited");
            return Ok(HarvestReport::default());
        }

        let added = database.addresses().append_new(&addresses).await?;
        info!(
            "Harvested {} addresses, {} of them new",
            addresses.len(),
            added
        );

        Ok(HarvestReport {
            harvested: addresses.len(),
            added,
        })
    }
}
