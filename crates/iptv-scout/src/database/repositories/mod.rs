//! SeaORM repository implementations
//!
//! One repository per table of the fixed schema. Bulk appends are split into
//! batches and written inside a single transaction.

pub mod address;
pub mod channel;
pub mod ranked_result;

// Re-export for convenience
pub use address::AddressSeaOrmRepository;
pub use channel::ChannelSeaOrmRepository;
pub use ranked_result::RankedResultSeaOrmRepository;
