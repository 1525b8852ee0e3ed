//! M3U playlist serialization

use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use crate::errors::AppResult;
use crate::models::RankedEntry;

#[derive(Debug, Clone)]
pub struct PlaylistWriter {
    epg_url: String,
}

impl PlaylistWriter {
    pub fn new<S: Into<String>>(epg_url: S) -> Self {
        Self {
            epg_url: epg_url.into(),
        }
    }

    /// Render entries in the order given
    pub fn render(&self, entries: &[RankedEntry]) -> String {
        let mut m3u = format!("#EXTM3U x-tvg-url=\"{}\"\n", self.epg_url);
        for entry in entries {
            let _ = write!(
                m3u,
                "#EXTINF:-1 tvg-name=\"{name}\",{name}\n{url}\n",
                name = entry.name,
                url = entry.stream_url
            );
        }
        m3u
    }

    /// Write the playlist, replacing any previous file
    pub async fn write(&self, path: &Path, entries: &[RankedEntry]) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, self.render(entries)).await?;
        info!(
            "Wrote {} channels to playlist {}",
            entries.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, url: &str) -> RankedEntry {
        RankedEntry {
            name: name.to_string(),
            stream_url: url.to_string(),
            speed_kbps: 42.0,
            resolution_px: 0,
        }
    }

    #[test]
    fn test_render_format() {
        let writer = PlaylistWriter::new("http://epg.example/e.xml.gz");
        let rendered = writer.render(&[
            entry("CCTV-1", "http://b/1.m3u8"),
            entry("湖南卫视", "http://c/2.m3u8"),
        ]);
        assert_eq!(
            rendered,
            "#EXTM3U x-tvg-url=\"http://epg.example/e.xml.gz\"\n\
             #EXTINF:-1 tvg-name=\"CCTV-1\",CCTV-1\nhttp://b/1.m3u8\n\
             #EXTINF:-1 tvg-name=\"湖南卫视\",湖南卫视\nhttp://c/2.m3u8\n"
        );
    }

    #[test]
    fn test_render_empty_has_header_only() {
        let writer = PlaylistWriter::new("http://epg");
        assert_eq!(writer.render(&[]), "#EXTM3U x-tvg-url=\"http://epg\"\n");
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public").join("iptv.m3u");
        let writer = PlaylistWriter::new("http://epg");

        writer
            .write(&path, &[entry("CCTV-1", "http://b/1.m3u8")])
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("#EXTINF:-1 tvg-name=\"CCTV-1\",CCTV-1\nhttp://b/1.m3u8\n"));
    }
}
