pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod torrent;

pub use api::{QbitClient, TorrentFilter, TorrentQuery, TorrentRecord};
pub use config::{CliArgs, Config};
pub use credentials::{ConnectionParams, CredentialStore, Credentials};
pub use error::{QbtError, QbtResult};
pub use torrent::Torrent;
