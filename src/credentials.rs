//! Local credential cache.
//!
//! A single URL/username/password record is kept in one file, by default
//! `.qbittorrent_credentials` in the platform temporary directory. The record
//! is JSON wrapped in base64. That only keeps the password out of plain
//! sight; the file itself is restricted to the owning user (mode `0600`).
//!
//! Reading never fails hard: a missing, unreadable or malformed file is
//! reported as "no cached credentials".

use crate::config::DEFAULT_URL;
use crate::error::{QbtError, QbtResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name used inside the temporary directory.
pub const CREDENTIALS_FILE_NAME: &str = ".qbittorrent_credentials";

/// A cached connection record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection parameters after merging explicit values with the cache.
///
/// Username and password stay `None` when neither source had them.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Reads and writes the credential cache file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<temp dir>/.qbittorrent_credentials`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(CREDENTIALS_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the record, replacing any previous one.
    pub fn save(&self, credentials: &Credentials) -> QbtResult<()> {
        let encoded = encode(credentials)?;

        let mut file = open_private(&self.path)?;
        file.write_all(encoded.as_bytes())?;
        file.flush()?;
        restrict_permissions(&self.path)?;

        info!(path = %self.path.display(), "Credentials saved");
        Ok(())
    }

    /// Read the cached record, if there is a usable one.
    pub fn load(&self) -> Option<Credentials> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Credentials file not found");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credentials");
                return None;
            }
        };

        match decode(&content) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring malformed credentials file");
                None
            }
        }
    }

    /// Like [`load`](Self::load), but only when the cached URL matches `url`.
    pub fn load_for_url(&self, url: &str) -> Option<Credentials> {
        let credentials = self.load()?;
        if same_url(&credentials.url, url) {
            Some(credentials)
        } else {
            debug!(url, "No cached credentials for URL");
            None
        }
    }

    /// Remove the record. Returns whether a file was actually deleted.
    pub fn clear(&self) -> QbtResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Credentials cleared");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Fill in whatever the caller did not supply from the cache.
    ///
    /// A record matching `url` is preferred; otherwise any cached record is
    /// used. The URL falls back to [`DEFAULT_URL`].
    pub fn resolve(
        &self,
        url: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ConnectionParams {
        let cached = url
            .and_then(|u| self.load_for_url(u))
            .or_else(|| self.load());

        let url = url
            .map(str::to_string)
            .or_else(|| cached.as_ref().map(|c| c.url.clone()))
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let username = username
            .map(str::to_string)
            .or_else(|| cached.as_ref().map(|c| c.username.clone()));
        let password = password
            .map(str::to_string)
            .or_else(|| cached.as_ref().map(|c| c.password.clone()));

        ConnectionParams {
            url,
            username,
            password,
        }
    }
}

fn encode(credentials: &Credentials) -> QbtResult<String> {
    let json = serde_json::to_vec(credentials)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

fn decode(content: &str) -> QbtResult<Credentials> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(content.trim())?;
    let credentials: Credentials = serde_json::from_slice(&bytes)?;
    if credentials.url.is_empty() {
        return Err(QbtError::ParseError("cached URL is empty".to_string()));
    }
    Ok(credentials)
}

fn same_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// `mode` only applies on creation, so a pre-existing file is tightened here.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
