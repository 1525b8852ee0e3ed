//! URL utilities for manifest and playlist address handling

use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// `scheme://host[:port]` of a URL, as used to absolutize manifest entries
    ///
    /// ```rust
    /// use iptv_scout::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::origin("http://10.0.0.7:8080/iptv/live/1000.json?key=txiptv").as_deref(),
    ///     Some("http://10.0.0.7:8080")
    /// );
    /// ```
    pub fn origin(url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let origin = parsed.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    /// Everything up to and including the last `/` of a playlist URL
    pub fn directory_prefix(url: &str) -> &str {
        match url.rfind('/') {
            Some(index) => &url[..=index],
            None => url,
        }
    }

    /// The final `/`-separated component of a segment reference
    pub fn last_path_component(reference: &str) -> &str {
        reference.rsplit('/').next().unwrap_or(reference)
    }

    /// Resolve a segment reference against the playlist's directory, keeping
    /// only the reference's file name
    pub fn segment_url(playlist_url: &str, reference: &str) -> String {
        format!(
            "{}{}",
            Self::directory_prefix(playlist_url),
            Self::last_path_component(reference.trim())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://1.2.3.4:9901/iptv/live/1000.json?key=txiptv", Some("http://1.2.3.4:9901"))]
    #[case("https://example.com/a/b", Some("https://example.com"))]
    #[case("http://example.com:80/x", Some("http://example.com"))]
    #[case("not a url", None)]
    fn test_origin(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(UrlUtils::origin(input).as_deref(), expected);
    }

    #[rstest]
    #[case("http://a/live/1.m3u8", "seg-001.ts", "http://a/live/seg-001.ts")]
    #[case("http://a/live/1.m3u8", "/hls/x/seg-002.ts", "http://a/live/seg-002.ts")]
    #[case("http://a/live/1.m3u8", "  seg-003.ts\r", "http://a/live/seg-003.ts")]
    fn test_segment_url(#[case] playlist: &str, #[case] reference: &str, #[case] expected: &str) {
        assert_eq!(UrlUtils::segment_url(playlist, reference), expected);
    }
}
