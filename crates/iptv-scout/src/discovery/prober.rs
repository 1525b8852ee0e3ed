//! JSON channel manifest probing
//!
//! A portal answering `GET <origin>/iptv/live/1000.json?key=txiptv` with
//! `{"data": [{"name": ..., "url": ...}]}` lists its channels; each `url` is
//! relative to the portal's origin.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::normalize::normalize_channel_name;
use crate::errors::{UnitError, UnitResult};
use crate::models::ChannelRecord;
use crate::utils::UrlUtils;

#[derive(Debug, Deserialize)]
struct ChannelManifest {
    data: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: String,
    url: String,
}

#[derive(Clone)]
pub struct ManifestProber {
    client: Client,
}

impl ManifestProber {
    /// `client` should carry the manifest request timeout
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch and parse one manifest. Any failure yields an empty list.
    pub async fn probe(&self, url: &str) -> Vec<ChannelRecord> {
        match self.try_probe(url).await {
            Ok(records) => records,
            Err(e) => {
                debug!("Manifest probe failed ({}): {}", e.kind(), e);
                Vec::new()
            }
        }
    }

    /// Like [`probe`](Self::probe) but reports why nothing was found
    pub async fn try_probe(&self, url: &str) -> UnitResult<Vec<ChannelRecord>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UnitError::from_reqwest(url, e))?;

        if response.status() != StatusCode::OK {
            return Err(UnitError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UnitError::from_reqwest(url, e))?;
        let manifest: ChannelManifest =
            serde_json::from_str(&body).map_err(|e| UnitError::parse(url, e.to_string()))?;

        let origin =
            UrlUtils::origin(url).ok_or_else(|| UnitError::parse(url, "probe URL has no origin"))?;

        let records: Vec<ChannelRecord> = manifest
            .data
            .into_iter()
            .map(|entry| {
                ChannelRecord::new(
                    normalize_channel_name(&entry.name),
                    format!("{origin}{}", entry.url),
                )
            })
            .collect();

        if !records.is_empty() {
            debug!("{} is valid, {} channels found", url, records.len());
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober() -> ManifestProber {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        ManifestProber::new(client)
    }

    #[tokio::test]
    async fn test_probe_parses_and_absolutizes_manifest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/iptv/live/1000.json"))
            .and(query_param("key", "txiptv"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"name": "中央1综合高清", "url": "/hls/1/index.m3u8"},
                    {"name": "湖南卫视", "url": "/hls/2/index.m3u8"}
                ]
            })))
            .mount(&server)
            .await;

        let url = format!("{}/iptv/live/1000.json?key=txiptv", server.uri());
        let records = prober().probe(&url).await;

        assert_eq!(
            records,
            vec![
                ChannelRecord::new("CCTV-1", format!("{}/hls/1/index.m3u8", server.uri())),
                ChannelRecord::new("湖南卫视", format!("{}/hls/2/index.m3u8", server.uri())),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_200_yields_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = format!("{}/iptv/live/1000.json?key=txiptv", server.uri());
        assert!(prober().probe(&url).await.is_empty());
        assert!(matches!(
            prober().try_probe(&url).await,
            Err(UnitError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_manifest_yields_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let url = format!("{}/iptv/live/1000.json?key=txiptv", server.uri());
        assert!(matches!(
            prober().try_probe(&url).await,
            Err(UnitError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_yields_nothing() {
        // Port 9 on loopback is not served in test environments
        let records = prober()
            .probe("http://127.0.0.1:9/iptv/live/1000.json?key=txiptv")
            .await;
        assert!(records.is_empty());
    }
}
