//! Best-entry-per-channel reduction and M3U playlist output

pub mod reducer;
pub mod writer;

pub use reducer::{RankStrategy, reduce};
pub use writer::PlaylistWriter;
