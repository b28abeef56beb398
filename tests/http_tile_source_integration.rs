//! Integration tests for the reqwest-backed tile source.
//!
//! Each test points an HttpTileSource at a mock tile server and checks the
//! request it sends or the error it maps the response to.

use std::time::Duration;

use tile_downloader::download::{FetchError, HttpSettings, HttpTileSource, TileSource};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return socket_skip_return();
        };
        mock_server
    }};
}

// ==================== Helper Functions ====================

fn test_settings() -> HttpSettings {
    HttpSettings {
        user_agent: "TileTest/1.0 (+ops@example.com)".to_string(),
        headers: vec![("Referer".to_string(), "https://maps.example.com".to_string())],
        timeout: Duration::from_secs(5),
    }
}

// ==================== Request Tests ====================

#[tokio::test]
async fn test_fetch_sends_user_agent_and_headers() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/6/39/24.png"))
        .and(header("User-Agent", "TileTest/1.0 (+ops@example.com)"))
        .and(header("Referer", "https://maps.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = HttpTileSource::new(&test_settings())?;
    let body = source
        .fetch(&format!("{}/6/39/24.png", mock_server.uri()))
        .await?;

    assert_eq!(body.as_ref(), b"png-bytes");
    Ok(())
}

// ==================== Error Mapping Tests ====================

#[tokio::test]
async fn test_fetch_maps_error_status() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let source = HttpTileSource::new(&test_settings())?;
    let result = source
        .fetch(&format!("{}/1/0/0.png", mock_server.uri()))
        .await;

    assert!(
        matches!(result, Err(FetchError::HttpStatus { status: 403, .. })),
        "got {result:?}"
    );
    Ok(())
}

#[tokio::test]
async fn test_fetch_maps_slow_response_to_timeout() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"late")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let settings = HttpSettings {
        timeout: Duration::from_millis(50),
        ..test_settings()
    };
    let source = HttpTileSource::new(&settings)?;
    let result = source
        .fetch(&format!("{}/1/0/0.png", mock_server.uri()))
        .await;

    assert!(
        matches!(result, Err(FetchError::Timeout { .. })),
        "got {result:?}"
    );
    Ok(())
}
