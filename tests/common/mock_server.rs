//! WireMock helpers that imitate a qBittorrent Web UI.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_SID: &str = "test_session_id";
pub const TEST_USERNAME: &str = "admin";
pub const TEST_PASSWORD: &str = "adminadmin";

/// Mock server that accepts `admin` / `adminadmin` and answers version calls
pub async fn setup_mock_server() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .and(wiremock::matchers::body_string(format!(
            "username={}&password={}",
            TEST_USERNAME, TEST_PASSWORD
        )))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("SID={}; HttpOnly; path=/", TEST_SID).as_str())
                .set_body_string("Ok."),
        )
        .mount(&mock_server)
        .await;

    // Anything else on the login endpoint is a wrong password.
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Fails."))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v2/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/app/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("v4.6.2"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/app/webapiVersion"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2.9.3"))
        .mount(&mock_server)
        .await;

    mock_server
}

/// Mock server whose `torrents/info` returns `torrents` to a logged-in session
pub async fn setup_mock_server_with_torrents(torrents: serde_json::Value) -> MockServer {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/torrents/info"))
        .and(header("cookie", format!("SID={}", TEST_SID).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(torrents))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/torrents/info"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&mock_server)
        .await;

    mock_server
}
