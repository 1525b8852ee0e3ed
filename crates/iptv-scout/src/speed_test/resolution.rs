//! Video height detection for downloaded segments

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Reports the pixel height of the first video stream in a media file,
/// or 0 when it cannot be determined
#[async_trait]
pub trait ResolutionProbe: Send + Sync {
    async fn probe_height(&self, path: &Path) -> u32;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    height: Option<u32>,
}

/// Height of the first video stream in `ffprobe -print_format json -show_streams` output
pub fn first_video_height(json: &str) -> Option<u32> {
    let output: FfprobeOutput = serde_json::from_str(json).ok()?;
    output
        .streams
        .into_iter()
        .find(|stream| stream.codec_type.as_deref() == Some("video"))
        .and_then(|stream| stream.height)
}

/// Runs the ffprobe binary against the file
pub struct FfprobeResolutionProbe {
    ffprobe_command: String,
    probe_timeout: Duration,
}

impl FfprobeResolutionProbe {
    pub fn new<S: Into<String>>(ffprobe_command: S, probe_timeout: Duration) -> Self {
        Self {
            ffprobe_command: ffprobe_command.into(),
            probe_timeout,
        }
    }
}

#[async_trait]
impl ResolutionProbe for FfprobeResolutionProbe {
    async fn probe_height(&self, path: &Path) -> u32 {
        let mut cmd = Command::new(&self.ffprobe_command);
        cmd.arg("-i")
            .arg(path)
            .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.probe_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("Failed to execute {}: {}", self.ffprobe_command, e);
                return 0;
            }
            Err(_) => {
                debug!(
                    "{} timed out after {:?} on {}",
                    self.ffprobe_command,
                    self.probe_timeout,
                    path.display()
                );
                return 0;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        first_video_height(&stdout).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_video_height_skips_audio() {
        let json = r#"{"streams": [
            {"index": 0, "codec_type": "audio", "codec_name": "aac"},
            {"index": 1, "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080}
        ]}"#;
        assert_eq!(first_video_height(json), Some(1080));
    }

    #[test]
    fn test_first_video_height_missing() {
        assert_eq!(first_video_height("{}"), None);
        assert_eq!(first_video_height(""), None);
        assert_eq!(
            first_video_height(r#"{"streams": [{"codec_type": "audio"}]}"#),
            None
        );
    }

    #[tokio::test]
    async fn test_missing_binary_reports_zero() {
        let probe = FfprobeResolutionProbe::new(
            "/nonexistent/ffprobe-for-tests",
            Duration::from_secs(5),
        );
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(probe.probe_height(file.path()).await, 0);
    }
}
