//! Manifest discovery against a mock portal and an in-memory store

use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iptv_scout::config::DatabaseConfig;
use iptv_scout::config::defaults::DEFAULT_MANIFEST_PATH;
use iptv_scout::database::Database;
use iptv_scout::discovery::{CandidateGenerator, ManifestProber};
use iptv_scout::models::ChannelRecord;
use iptv_scout::services::ManifestDiscoveryService;

async fn memory_database() -> Database {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    Database::open(&config).await.unwrap()
}

fn service() -> ManifestDiscoveryService {
    let client = Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    // Only 127.0.0.1 answers; .2 and .3 are refused
    ManifestDiscoveryService::new(
        CandidateGenerator::new(DEFAULT_MANIFEST_PATH, 1..=3),
        ManifestProber::new(client),
        16,
        Duration::from_secs(10),
    )
}

fn portal_address(server: &MockServer) -> String {
    format!("http://127.0.0.1:{}", server.address().port())
}

#[tokio::test]
async fn discovery_appends_new_channels_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/iptv/live/1000.json"))
        .and(query_param("key", "txiptv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"name": "中央1综合高清", "url": "/tsfile/live/0001_1.m3u8"},
                {"name": "CCTV-1", "url": "/tsfile/live/0001_1.m3u8"},
                {"name": "湖南卫视 HD", "url": "/tsfile/live/0002_1.m3u8"}
            ]
        })))
        .mount(&server)
        .await;

    let database = memory_database().await;
    let address = portal_address(&server);
    database.addresses().insert(&address).await.unwrap();

    let service = service();
    let first = service.run(&database).await.unwrap();
    assert_eq!(first.addresses, 1);
    assert_eq!(first.candidates, 3);
    assert_eq!(first.channels_found, 3);
    assert_eq!(first.channels_added, 2);
    assert_eq!(first.stats.completed, 1);
    assert_eq!(first.stats.failed, 2);

    let stored = database.channels().find_all().await.unwrap();
    assert_eq!(
        stored,
        vec![
            ChannelRecord::new("CCTV-1", format!("{address}/tsfile/live/0001_1.m3u8")),
            ChannelRecord::new("湖南卫视", format!("{address}/tsfile/live/0002_1.m3u8")),
        ]
    );

    // Unchanged upstream: nothing new the second time
    let second = service.run(&database).await.unwrap();
    assert_eq!(second.channels_found, 3);
    assert_eq!(second.channels_added, 0);
    assert_eq!(database.channels().find_all().await.unwrap().len(), 2);

    database.close().await.unwrap();
}

#[tokio::test]
async fn failing_portal_yields_no_channels() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let database = memory_database().await;
    database
        .addresses()
        .insert(&portal_address(&server))
        .await
        .unwrap();

    let report = service().run(&database).await.unwrap();
    assert_eq!(report.candidates, 3);
    assert_eq!(report.channels_found, 0);
    assert_eq!(report.channels_added, 0);
    assert_eq!(report.stats.total, 3);
    assert!(database.channels().find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn stalled_portal_times_out_without_blocking() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": []}))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let service = ManifestDiscoveryService::new(
        CandidateGenerator::new(DEFAULT_MANIFEST_PATH, 1..=1),
        ManifestProber::new(Client::new()),
        4,
        Duration::from_millis(500),
    );

    let url = format!(
        "{}{}",
        portal_address(&server),
        DEFAULT_MANIFEST_PATH
    );
    let (channels, stats) = service.probe_candidates(vec![url]).await;
    assert!(channels.is_empty());
    assert_eq!(stats.timed_out, 1);
}
