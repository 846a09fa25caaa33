//! Agent command tests against a mock Player API

use chrono::Utc;
use marquee_agent::{Agent, AgentConfig, AgentError, StorageKind};
use marquee_core::{HeartbeatEvent, Playlist};
use marquee_storage::PersistentStore;
use marquee_sync::SyncOutcome;
use marquee_telemetry::TelemetryQueue;
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

fn config_for(server: &MockServer, data_dir: &Path, storage: StorageKind) -> AgentConfig {
    let value = serde_json::json!({
        "api_base_url": server.uri(),
        "serial_number": "SN-0042",
        "screen_id": "screen-7",
        "data_dir": data_dir,
        "storage": storage,
    });
    let config: AgentConfig = serde_json::from_value(value).unwrap();
    config.validate().unwrap();
    config
}

async fn mount_registration(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "player_id": "player-1",
            "auth_token": "secret",
            "screen_id": "screen-7"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn heartbeat() -> HeartbeatEvent {
    HeartbeatEvent {
        player_id: "player-1".into(),
        screen_id: "screen-7".into(),
        timestamp: Utc::now(),
        status: "online".into(),
        software_version: "0.1.0".into(),
        location: None,
        metrics: None,
    }
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_is_idempotent_across_restarts() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_registration(&server, 1).await;

    let first = Agent::new(config_for(&server, dir.path(), StorageKind::File))
        .unwrap()
        .register(false)
        .await
        .unwrap();

    let second = Agent::new(config_for(&server, dir.path(), StorageKind::File))
        .unwrap()
        .register(false)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.token, "player-1:secret");
}

#[tokio::test]
async fn test_forced_registration_contacts_server_again() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_registration(&server, 2).await;

    let agent = Agent::new(config_for(&server, dir.path(), StorageKind::File)).unwrap();
    agent.register(false).await.unwrap();
    agent.register(true).await.unwrap();
}

#[tokio::test]
async fn test_registration_failure_is_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(403).set_body_string("unknown serial"))
        .mount(&server)
        .await;

    let agent = Agent::new(config_for(&server, dir.path(), StorageKind::File)).unwrap();
    let result = agent.register(false).await;

    assert!(matches!(result, Err(AgentError::Sync(_))));
    assert!(agent.status().await.identity.is_none());
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test]
async fn test_status_before_registration() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let agent = Agent::new(config_for(&server, dir.path(), StorageKind::File)).unwrap();
    let status = agent.status().await;

    assert!(status.durable);
    assert!(status.identity.is_none());
    assert!(status.playlist.is_none());
    assert_eq!(status.pending.playbacks, 0);

    let rendered = status.to_string();
    assert!(rendered.contains("not registered"));
    assert!(rendered.contains("none cached"));
}

#[tokio::test]
async fn test_status_reports_identity_and_queues() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_registration(&server, 1).await;

    let config = config_for(&server, dir.path(), StorageKind::File);
    let queue = TelemetryQueue::new(PersistentStore::file(config.state_dir()));
    queue.enqueue_heartbeat(heartbeat()).await.unwrap();

    let agent = Agent::new(config).unwrap();
    agent.register(false).await.unwrap();
    let status = agent.status().await;

    assert_eq!(
        status.identity.map(|i| i.player_id),
        Some("player-1".to_string())
    );
    assert_eq!(status.pending.heartbeats, 1);
}

#[tokio::test]
async fn test_memory_storage_is_not_durable() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let agent = Agent::new(config_for(&server, dir.path(), StorageKind::Memory)).unwrap();
    assert!(!agent.status().await.durable);
    assert!(!dir.path().join("state").exists());
}

// =============================================================================
// Playlist Sync
// =============================================================================

#[tokio::test]
async fn test_sync_tick_restores_deleted_asset() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_registration(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/playlist"))
        .and(query_param("config_hash", "h1"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "screen_id": "screen-7",
            "config_hash": "h1",
            "playlist": [
                {"creative_id": "c1", "url": format!("{}/media/c1.png", server.uri()), "duration": 5}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/c1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 32]))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_for(&server, dir.path(), StorageKind::File);
    let asset = config.media_dir().join("c1.png");
    let agent = Agent::new(config).unwrap();
    let identity = agent.register(false).await.unwrap();
    let (playlist_tx, playlist_rx) = watch::channel(Playlist::fallback());

    let outcome = agent.sync_playlist(&identity, &playlist_tx).await;
    assert_eq!(outcome, SyncOutcome::Remote);
    assert!(asset.is_file());
    assert_eq!(playlist_rx.borrow().config_hash.as_deref(), Some("h1"));

    std::fs::remove_file(&asset).unwrap();

    let outcome = agent.sync_playlist(&identity, &playlist_tx).await;
    assert_eq!(outcome, SyncOutcome::Unchanged);
    assert!(marquee_core::is_valid(Some(asset.as_path())));
    let published = playlist_rx.borrow().clone();
    assert_eq!(published.items[0].local_path.as_deref(), Some(asset.as_path()));

    let status = agent.status().await;
    assert_eq!(status.playlist.map(|p| p.cached_items), Some(1));
}

// =============================================================================
// Flush
// =============================================================================

#[tokio::test]
async fn test_flush_requires_registration() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let agent = Agent::new(config_for(&server, dir.path(), StorageKind::File)).unwrap();
    assert!(matches!(agent.flush().await, Err(AgentError::NotRegistered)));
}

#[tokio::test]
async fn test_flush_delivers_persisted_backlog() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_registration(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/heartbeat"))
        .and(header("authorization", "Bearer player-1:secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_for(&server, dir.path(), StorageKind::File);
    let queue = TelemetryQueue::new(PersistentStore::file(config.state_dir()));
    queue.enqueue_heartbeat(heartbeat()).await.unwrap();
    queue.enqueue_heartbeat(heartbeat()).await.unwrap();

    let agent = Agent::new(config).unwrap();
    agent.register(false).await.unwrap();
    let report = agent.flush().await.unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.delivered, 2);
    assert_eq!(agent.status().await.pending.heartbeats, 0);
}
