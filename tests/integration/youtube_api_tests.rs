//! Integration tests for the YouTube Data API client
//!
//! wiremock plays the API; the client is pointed at it through `api_base`.

use ref_cli::fetch::build_api_client;
use ref_cli::platform::{MetadataError, VideoMetadataApi, YouTubeDataApi};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer) -> YouTubeDataApi {
    YouTubeDataApi::new(
        build_api_client(5).expect("Failed to build client"),
        server.uri(),
        Some("test-key".to_string()),
    )
}

fn playlist_item(id: &str, title: &str) -> serde_json::Value {
    json!({
        "snippet": {
            "title": title,
            "channelTitle": "Playlist Owner",
            "videoOwnerChannelTitle": "Video Owner",
            "publishedAt": "2024-01-01T00:00:00Z",
            "resourceId": { "kind": "youtube#video", "videoId": id }
        }
    })
}

#[tokio::test]
async fn test_video_lookup() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "abc123"))
        .and(query_param("key", "test-key"))
        .and(query_param("part", "snippet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "snippet": {
                    "title": "A Talk: Part 1",
                    "channelTitle": "Conference",
                    "publishedAt": "2023-05-01T12:00:00Z"
                }
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let info = api(&mock_server).video("abc123").await.unwrap();
    assert_eq!(info.id, "abc123");
    assert_eq!(info.title, "A Talk: Part 1");
    assert_eq!(info.channel, "Conference");
    assert_eq!(info.published_at.as_deref(), Some("2023-05-01T12:00:00Z"));
}

#[tokio::test]
async fn test_unknown_video() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&mock_server)
        .await;

    let err = api(&mock_server).video("missing").await.unwrap_err();
    assert!(matches!(err, MetadataError::VideoNotFound(ref id) if id == "missing"));
}

#[tokio::test]
async fn test_api_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
        .mount(&mock_server)
        .await;

    let err = api(&mock_server).video("abc").await.unwrap_err();
    assert!(matches!(err, MetadataError::Api { status: 403, .. }));
}

#[tokio::test]
async fn test_playlist_follows_next_page_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("id", "PL1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "snippet": { "title": "My Playlist", "channelTitle": "Curator" } }]
        })))
        .mount(&mock_server)
        .await;

    // Second page first so it wins for requests carrying the token
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("pageToken", "PAGE2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [playlist_item("v3", "Third")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("playlistId", "PL1"))
        .and(query_param("maxResults", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nextPageToken": "PAGE2",
            "items": [
                playlist_item("v1", "First"),
                { "snippet": { "title": "Deleted video", "resourceId": { "kind": "youtube#video" } } },
                playlist_item("v2", "Second")
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let playlist = api(&mock_server).playlist("PL1").await.unwrap();
    assert_eq!(playlist.title, "My Playlist");
    assert_eq!(playlist.channel, "Curator");

    let ids: Vec<&str> = playlist.videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v2", "v3"]);
    assert_eq!(playlist.videos[0].channel, "Video Owner");
}

#[tokio::test]
async fn test_playlist_stops_on_repeated_page_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "snippet": { "title": "Looping", "channelTitle": "Curator" } }]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("pageToken", "AGAIN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nextPageToken": "AGAIN",
            "items": [playlist_item("v2", "Second")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nextPageToken": "AGAIN",
            "items": [playlist_item("v1", "First")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let playlist = api(&mock_server).playlist("PLLOOP").await.unwrap();
    let ids: Vec<&str> = playlist.videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v2"]);
}

#[tokio::test]
async fn test_unknown_playlist() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&mock_server)
        .await;

    let err = api(&mock_server).playlist("PLX").await.unwrap_err();
    assert!(matches!(err, MetadataError::PlaylistNotFound(_)));
}
