use crate::api::types::*;
use crate::config::ApiConfig;
use crate::error::{QbtError, QbtResult};
use reqwest::header::{COOKIE, REFERER};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, trace, warn};

/// Session cookie issued by `auth/login`, kept under whatever name the
/// server chose (`SID` on most builds, `QBT_SID_<port>` on newer ones).
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    value: String,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `name=value`, ready for a `Cookie` header
    pub fn header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &"***")
            .finish()
    }
}

/// HTTP client for the qBittorrent Web API (v2)
pub struct QbitClient {
    client: Client,
    base_url: Url,
    api_url: Url,
    session: RwLock<Option<SessionCookie>>,
}

impl QbitClient {
    /// Create a new QbitClient with default configuration
    pub fn new(base_url: &str) -> QbtResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(ApiConfig::default().timeout))
    }

    /// Create a QbitClient from the API section of the configuration
    pub fn with_config(config: &ApiConfig) -> QbtResult<Self> {
        Self::with_timeout(&config.url, Duration::from_secs(config.timeout))
    }

    /// Create a new QbitClient with a custom request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> QbtResult<Self> {
        // Validate URL at construction time (fail fast on invalid URL)
        let mut base_url = Url::parse(base_url)
            .map_err(|e| QbtError::InvalidArgument(format!("Invalid URL '{}': {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let api_url = base_url
            .join("api/v2/")
            .map_err(|e| QbtError::InvalidArgument(format!("Invalid URL: {}", e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QbtError::IoError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_url,
            session: RwLock::new(None),
        })
    }

    /// Web UI root, always ending in `/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Root of the v2 API, `<base>/api/v2/`
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Whether a session cookie is currently held
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Name of the session cookie currently held, if any
    pub async fn session_cookie_name(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|cookie| cookie.name().to_string())
    }

    fn endpoint(&self, path: &str) -> QbtResult<Url> {
        self.api_url
            .join(path)
            .map_err(|e| QbtError::InvalidArgument(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Build a request carrying the Referer header the Web UI expects
    fn request(&self, method: Method, path: &str) -> QbtResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        trace!(%method, %url, "Building request");
        Ok(self
            .client
            .request(method, url)
            .header(REFERER, self.base_url.as_str()))
    }

    /// Build a request that must carry the session cookie
    async fn authenticated_request(&self, method: Method, path: &str) -> QbtResult<RequestBuilder> {
        let session = self.session.read().await.clone();
        match session {
            Some(cookie) => Ok(self
                .request(method, path)?
                .header(COOKIE, cookie.header_value())),
            None => {
                error!(endpoint = path, "Not authenticated. Please log in first.");
                Err(QbtError::NotAuthenticated)
            }
        }
    }

    /// Build a request that sends the session cookie when there is one
    async fn optional_session_request(&self, method: Method, path: &str) -> QbtResult<RequestBuilder> {
        let session = self.session.read().await.clone();
        let request = self.request(method, path)?;
        Ok(match session {
            Some(cookie) => request.header(COOKIE, cookie.header_value()),
            None => request,
        })
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> QbtResult<Response> {
        let response = request.send().await.map_err(|e| {
            let err: QbtError = e.into();
            error!(endpoint, error = %err, "Request failed");
            err
        })?;
        self.check_response(endpoint, response).await
    }

    /// Helper to check response status and convert errors
    async fn check_response(&self, endpoint: &str, response: Response) -> QbtResult<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(endpoint, status = status.as_u16(), "Session rejected by server");
            return Err(QbtError::NotAuthenticated);
        }

        Err(api_error(endpoint, response).await)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in to the Web UI and keep the session cookie
    #[instrument(skip(self, password), fields(api_op = "login"))]
    pub async fn login(&self, username: &str, password: &str) -> QbtResult<()> {
        info!("Attempting to log in to qBittorrent Web UI");
        *self.session.write().await = None;

        let request = self
            .request(Method::POST, "auth/login")?
            .form(&[("username", username), ("password", password)]);
        let response = request.send().await.map_err(|e| {
            let err: QbtError = e.into();
            error!(error = %err, "Login request failed");
            err
        })?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            error!("Login refused: IP is banned for too many failed login attempts");
            return Err(QbtError::AuthenticationFailed(
                "IP is banned for too many failed login attempts".to_string(),
            ));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(QbtError::AuthenticationFailed(
                "Invalid username or password".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(api_error("auth/login", response).await);
        }

        let cookie = session_cookie(&response);
        let body = response.text().await?;
        if body.trim() == "Fails." {
            error!("Login failed: invalid username or password");
            return Err(QbtError::AuthenticationFailed(
                "Invalid username or password".to_string(),
            ));
        }

        match cookie {
            Some(cookie) => {
                debug!(cookie = cookie.name(), "Received session cookie");
                *self.session.write().await = Some(cookie);
                info!("Successfully logged in to qBittorrent Web UI");
                Ok(())
            }
            None => {
                warn!("Login successful but no session cookie received");
                Err(QbtError::AuthenticationFailed(
                    "No session cookie received".to_string(),
                ))
            }
        }
    }

    /// Log out and forget the session; does nothing when not logged in
    #[instrument(skip(self), fields(api_op = "logout"))]
    pub async fn logout(&self) -> QbtResult<()> {
        let session = self.session.write().await.take();
        let Some(cookie) = session else {
            debug!("Not logged in, nothing to log out");
            return Ok(());
        };

        info!("Logging out from qBittorrent Web UI");
        let request = self
            .request(Method::POST, "auth/logout")?
            .header(COOKIE, cookie.header_value());
        self.send("auth/logout", request).await?;
        info!("Successfully logged out from qBittorrent Web UI");
        Ok(())
    }

    // =========================================================================
    // Torrents
    // =========================================================================

    /// List torrents matching the query
    #[instrument(skip(self), fields(api_op = "get_torrents", filter = %query.filter))]
    pub async fn get_torrents(&self, query: &TorrentQuery) -> QbtResult<Vec<TorrentRecord>> {
        let request = self
            .authenticated_request(Method::GET, "torrents/info")
            .await?
            .query(&query.to_params());

        info!("Getting torrents with filter: {}", query.filter);
        let response = self.send("torrents/info", request).await?;
        let torrents: Vec<TorrentRecord> = response.json().await?;

        info!("Retrieved {} torrents", torrents.len());
        Ok(torrents)
    }

    /// Get the extended properties of one torrent
    #[instrument(skip(self), fields(api_op = "get_torrent_properties"))]
    pub async fn get_torrent_properties(&self, hash: &str) -> QbtResult<TorrentProperties> {
        let request = self
            .authenticated_request(Method::GET, "torrents/properties")
            .await?
            .query(&[("hash", hash)]);

        let response = match self.send("torrents/properties", request).await {
            Ok(response) => response,
            Err(QbtError::ApiError { status: 404, .. }) => {
                return Err(QbtError::NotFound(format!("torrent {}", hash)));
            }
            Err(e) => return Err(e),
        };

        let body = response.text().await?;
        let body = body.trim();
        if body.is_empty() || body == "null" {
            return Err(QbtError::NotFound(format!("torrent {}", hash)));
        }

        let properties: TorrentProperties = serde_json::from_str(body)?;
        debug!(hash, fields = properties.len(), "Retrieved torrent properties");
        Ok(properties)
    }

    /// Rename a torrent
    #[instrument(skip(self), fields(api_op = "rename_torrent"))]
    pub async fn rename_torrent(&self, hash: &str, name: &str) -> QbtResult<()> {
        if name.trim().is_empty() {
            return Err(QbtError::InvalidArgument(
                "torrent name cannot be empty".to_string(),
            ));
        }

        let request = self
            .authenticated_request(Method::POST, "torrents/rename")
            .await?
            .form(&[("hash", hash), ("name", name)]);

        match self.send("torrents/rename", request).await {
            Ok(_) => {
                info!(hash, name, "Renamed torrent");
                Ok(())
            }
            Err(QbtError::ApiError { status: 404, .. }) => {
                Err(QbtError::NotFound(format!("torrent {}", hash)))
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Application
    // =========================================================================

    async fn get_text(&self, path: &str) -> QbtResult<String> {
        let request = self.optional_session_request(Method::GET, path).await?;
        let response = self.send(path, request).await?;
        Ok(response.text().await?.trim().to_string())
    }

    /// qBittorrent application version, e.g. `v4.6.2`
    #[instrument(skip(self), fields(api_op = "get_app_version"))]
    pub async fn get_app_version(&self) -> QbtResult<String> {
        let version = self.get_text("app/version").await?;
        info!("qBittorrent version: {}", version);
        Ok(version)
    }

    /// Web API version, e.g. `2.9.3`
    #[instrument(skip(self), fields(api_op = "get_api_version"))]
    pub async fn get_api_version(&self) -> QbtResult<String> {
        let version = self.get_text("app/webapiVersion").await?;
        info!("qBittorrent Web API version: {}", version);
        Ok(version)
    }
}

/// Turn a non-success response into an `ApiError` carrying the body text
async fn api_error(endpoint: &str, response: Response) -> QbtError {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(message) => {
            error!(endpoint, status, %message, "API returned error");
            QbtError::ApiError { status, message }
        }
        Err(e) => QbtError::NetworkError(format!("Failed to read error response body: {}", e)),
    }
}

/// Pick the session cookie out of a login response.
///
/// A cookie whose name contains `SID` wins; otherwise the first non-empty
/// cookie the server set is taken.
fn session_cookie(response: &Response) -> Option<SessionCookie> {
    let cookies: Vec<SessionCookie> = response
        .cookies()
        .filter(|cookie| !cookie.value().is_empty())
        .map(|cookie| SessionCookie::new(cookie.name(), cookie.value()))
        .collect();

    let preferred = cookies
        .iter()
        .position(|cookie| cookie.name().to_ascii_uppercase().contains("SID"))
        .unwrap_or(0);
    cookies.into_iter().nth(preferred)
}
