pub mod client;
pub mod types;

pub use client::{QbitClient, SessionCookie};
pub use types::{TorrentFilter, TorrentProperties, TorrentQuery, TorrentRecord};
