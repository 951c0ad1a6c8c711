//! Common test utilities for qbt-client
//!
//! - Mock qBittorrent server setup
//! - Torrent record fixtures

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_server;
