//! Throughput measurement of discovered channels
//!
//! For every stored channel the HLS playlist is fetched, its first segment is
//! downloaded and timed, and optionally the segment is handed to ffprobe for
//! its video height.

pub mod playlist;
pub mod resolution;
pub mod tester;

pub use resolution::{FfprobeResolutionProbe, ResolutionProbe};
pub use tester::{SpeedTester, throughput_kbps};
