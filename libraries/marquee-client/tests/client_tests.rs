//! Tests for the Player API client.
//!
//! These tests use mock servers to verify client behavior without
//! requiring a real Player API.

use marquee_client::{
    AssetDownloader, ClientConfig, ClientError, PlayerApi, PlayerApiClient, PlaylistFetch,
    RegistrationRequest,
};
use marquee_core::{HeartbeatEvent, MediaType, PlaybackEvent, PlaybackStatus};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "player-1:secret";

fn client_for(server: &MockServer) -> PlayerApiClient {
    PlayerApiClient::new(ClientConfig::new(server.uri())).unwrap()
}

fn sample_playback() -> PlaybackEvent {
    PlaybackEvent {
        creative_id: "c1".into(),
        screen_id: "screen-1".into(),
        played_at: chrono::Utc::now(),
        duration: 5,
        status: PlaybackStatus::Success,
        location: None,
    }
}

// =============================================================================
// Registration
// =============================================================================

mod registration {
    use super::*;

    #[tokio::test]
    async fn test_successful_registration() {
        let mock_server = MockServer::start().await;

        let request = RegistrationRequest {
            serial_number: "SN-1".into(),
            screen_id: "screen-1".into(),
            provisioning_code: Some("PROV".into()),
        };

        Mock::given(method("POST"))
            .and(path("/register"))
            .and(body_json(&request))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "player_id": "player-1",
                "auth_token": "secret",
                "screen_id": "screen-1"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let response = client.register(&request).await.unwrap();

        assert_eq!(response.player_id, "player-1");
        assert_eq!(response.auth_token, "secret");
        assert_eq!(response.screen_id, "screen-1");
    }

    #[tokio::test]
    async fn test_provisioning_code_omitted_when_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/register"))
            .and(body_json(serde_json::json!({
                "serial_number": "SN-2",
                "screen_id": "screen-2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "player_id": "player-2",
                "auth_token": "t",
                "screen_id": "screen-2"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = RegistrationRequest {
            serial_number: "SN-2".into(),
            screen_id: "screen-2".into(),
            provisioning_code: None,
        };
        assert!(client.register(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_registration_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(403).set_body_string("unknown serial"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = RegistrationRequest {
            serial_number: "bogus".into(),
            screen_id: "screen-1".into(),
            provisioning_code: None,
        };

        match client.register(&request).await.unwrap_err() {
            ClientError::ServerError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "unknown serial");
            }
            e => panic!("Expected ServerError, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_malformed_registration_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = RegistrationRequest {
            serial_number: "SN".into(),
            screen_id: "s".into(),
            provisioning_code: None,
        };

        assert!(matches!(
            client.register(&request).await.unwrap_err(),
            ClientError::ParseError(_)
        ));
    }
}

// =============================================================================
// Playlist
// =============================================================================

mod playlist {
    use super::*;

    #[tokio::test]
    async fn test_fetch_new_playlist() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/playlist"))
            .and(header("Authorization", "Bearer player-1:secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "screen_id": "screen-1",
                "region": "north",
                "city": "Bergen",
                "config_hash": "rev-2",
                "playlist": [
                    {"creative_id": "c1", "type": "video", "url": "https://cdn/a.mp4", "duration": 15},
                    {"creative_id": "c2", "url": "https://cdn/b.jpg", "duration": 10}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let fetch = client.fetch_playlist(TOKEN, None).await.unwrap();

        let PlaylistFetch::Updated(playlist) = fetch else {
            panic!("Expected a new playlist");
        };
        assert_eq!(playlist.config_hash.as_deref(), Some("rev-2"));
        assert_eq!(playlist.city.as_deref(), Some("Bergen"));
        assert_eq!(playlist.items.len(), 2);
        assert_eq!(playlist.items[0].media_type, Some(MediaType::Video));
        assert_eq!(playlist.items[1].media_type, None);
    }

    #[tokio::test]
    async fn test_fetch_sends_config_hash_and_handles_304() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/playlist"))
            .and(query_param("config_hash", "rev-1"))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let fetch = client.fetch_playlist(TOKEN, Some("rev-1")).await.unwrap();
        assert_eq!(fetch, PlaylistFetch::Unchanged);
    }

    #[tokio::test]
    async fn test_fetch_unauthorized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/playlist"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        assert!(matches!(
            client.fetch_playlist(TOKEN, None).await.unwrap_err(),
            ClientError::AuthFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/playlist"))
            .respond_with(ResponseTemplate::new(304).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let config = ClientConfig::new(mock_server.uri()).with_timeouts(
            Duration::from_millis(200),
            Duration::from_millis(200),
            Duration::from_millis(200),
        );
        let client = PlayerApiClient::new(config).unwrap();

        let err = client.fetch_playlist(TOKEN, None).await.unwrap_err();
        assert!(matches!(err, ClientError::ServerUnreachable(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = PlayerApiClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();

        match client.fetch_playlist(TOKEN, None).await.unwrap_err() {
            ClientError::ServerUnreachable(_) | ClientError::Request(_) => {}
            e => panic!("Expected ServerUnreachable or Request error, got: {:?}", e),
        }
    }
}

// =============================================================================
// Telemetry
// =============================================================================

mod telemetry {
    use super::*;

    #[tokio::test]
    async fn test_send_playback() {
        let mock_server = MockServer::start().await;
        let event = sample_playback();

        Mock::given(method("POST"))
            .and(path("/events/playbacks"))
            .and(header("Authorization", "Bearer player-1:secret"))
            .and(body_json(&event))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        client.send_playback(TOKEN, &event).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_heartbeat() {
        let mock_server = MockServer::start().await;
        let heartbeat = HeartbeatEvent {
            player_id: "player-1".into(),
            screen_id: "screen-1".into(),
            timestamp: chrono::Utc::now(),
            status: "online".into(),
            software_version: "0.1.0".into(),
            location: None,
            metrics: None,
        };

        Mock::given(method("POST"))
            .and(path("/heartbeat"))
            .and(body_json(&heartbeat))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        client.send_heartbeat(TOKEN, &heartbeat).await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/events/playbacks"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.send_playback(TOKEN, &sample_playback()).await.unwrap_err();
        assert!(err.is_transient());
    }
}

// =============================================================================
// Media download
// =============================================================================

mod download {
    use super::*;

    #[tokio::test]
    async fn test_download_writes_file() {
        let mock_server = MockServer::start().await;
        let body = vec![7u8; 4096];

        Mock::given(method("GET"))
            .and(path("/media/c1.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("media").join("c1.mp4");
        let client = client_for(&mock_server);

        let url = format!("{}/media/c1.mp4", mock_server.uri());
        let written = client.download(&url, &dest).await.unwrap();

        assert_eq!(written, 4096);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
        assert!(!dest.with_extension("mp4.part").exists());
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/media/empty.png"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.png");
        let client = client_for(&mock_server);

        let url = format!("{}/media/empty.png", mock_server.uri());
        let err = client.download(&url, &dest).await.unwrap_err();

        assert!(matches!(err, ClientError::EmptyBody(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_not_found_leaves_no_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/media/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("gone.png");
        let client = client_for(&mock_server);

        let url = format!("{}/media/gone.png", mock_server.uri());
        match client.download(&url, &dest).await.unwrap_err() {
            ClientError::ServerError { status, .. } => assert_eq!(status, 404),
            e => panic!("Expected ServerError, got: {:?}", e),
        }
        assert!(!dest.exists());
    }
}
