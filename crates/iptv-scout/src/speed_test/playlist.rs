//! Minimal HLS playlist reading: only the first segment reference matters

use crate::utils::UrlUtils;

/// First non-blank line that is not a `#` tag
pub fn first_segment_reference(body: &str) -> Option<&str> {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
}

/// URL of the first segment, placed in the playlist's directory
pub fn resolve_segment_url(playlist_url: &str, body: &str) -> Option<String> {
    first_segment_reference(body).map(|reference| UrlUtils::segment_url(playlist_url, reference))
}
