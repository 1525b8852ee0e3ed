pub use super::addresses::Entity as Addresses;
pub use super::channels::Entity as Channels;
pub use super::ranked_results::Entity as RankedResults;
