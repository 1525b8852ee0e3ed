//! Manifest discovery: candidate sweep, channel name normalization and
//! JSON manifest probing

pub mod candidates;
pub mod normalize;
pub mod prober;

pub use candidates::CandidateGenerator;
pub use normalize::normalize_channel_name;
pub use prober::ManifestProber;
