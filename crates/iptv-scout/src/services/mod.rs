//! Pipeline services
//!
//! Each service owns the HTTP clients it needs and works against a
//! [`Database`](crate::database::Database) handed in by the job runner.

pub mod discovery;
pub mod harvest;
pub mod speed_rank;

pub use discovery::{DiscoveryReport, ManifestDiscoveryService};
pub use harvest::{AddressHarvestService, HarvestReport};
pub use speed_rank::{PublishReport, SpeedRankService};
