use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw field mapping for one torrent, exactly as `torrents/info` returns it.
pub type TorrentRecord = serde_json::Map<String, serde_json::Value>;

/// Raw field mapping returned by `torrents/properties`.
pub type TorrentProperties = serde_json::Map<String, serde_json::Value>;

/// Status filter accepted by `torrents/info`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TorrentFilter {
    #[default]
    All,
    Downloading,
    Seeding,
    Completed,
    Paused,
    Active,
    Inactive,
    Resumed,
    Stalled,
    StalledUploading,
    StalledDownloading,
    Errored,
}

/// Parameters for listing torrents. Only fields that are set go on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TorrentQuery {
    pub filter: TorrentFilter,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<String>,
    pub reverse: bool,
    pub limit: Option<u32>,
    pub offset: Option<i64>,
    pub hashes: Vec<String>,
    /// Additional criteria forwarded verbatim.
    pub extra: BTreeMap<String, String>,
}

impl TorrentQuery {
    pub fn new(filter: TorrentFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn sort(mut self, key: impl Into<String>, reverse: bool) -> Self {
        self.sort = Some(key.into());
        self.reverse = reverse;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hashes.push(hash.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// URL query pairs in the order the Web API documents them.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("filter".to_string(), self.filter.to_string())];

        if let Some(category) = &self.category {
            params.push(("category".to_string(), category.clone()));
        }
        if let Some(tag) = &self.tag {
            params.push(("tag".to_string(), tag.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort".to_string(), sort.clone()));
        }
        if self.reverse {
            params.push(("reverse".to_string(), "true".to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        if !self.hashes.is_empty() {
            params.push(("hashes".to_string(), self.hashes.join("|")));
        }
        for (key, value) in &self.extra {
            params.push((key.clone(), value.clone()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_filter_wire_names() {
        assert_eq!(TorrentFilter::All.to_string(), "all");
        assert_eq!(TorrentFilter::Downloading.to_string(), "downloading");
        assert_eq!(
            TorrentFilter::StalledDownloading.to_string(),
            "stalled_downloading"
        );
        assert_eq!(
            TorrentFilter::from_str("stalled_uploading").unwrap(),
            TorrentFilter::StalledUploading
        );
        assert!(TorrentFilter::from_str("sideways").is_err());
    }

    #[test]
    fn test_filter_names_parse_back() {
        for filter in TorrentFilter::iter() {
            assert_eq!(TorrentFilter::from_str(filter.as_ref()).unwrap(), filter);
        }
    }

    #[test]
    fn test_default_query_only_sends_filter() {
        let params = TorrentQuery::default().to_params();
        assert_eq!(params, vec![("filter".to_string(), "all".to_string())]);
    }

    #[test]
    fn test_full_query_params() {
        let query = TorrentQuery::new(TorrentFilter::Seeding)
            .category("linux")
            .tag("iso")
            .sort("ratio", true)
            .limit(10)
            .offset(-5)
            .hash("aaa")
            .hash("bbb")
            .param("private", "true");

        let params: BTreeMap<_, _> = query.to_params().into_iter().collect();
        assert_eq!(params["filter"], "seeding");
        assert_eq!(params["category"], "linux");
        assert_eq!(params["tag"], "iso");
        assert_eq!(params["sort"], "ratio");
        assert_eq!(params["reverse"], "true");
        assert_eq!(params["limit"], "10");
        assert_eq!(params["offset"], "-5");
        assert_eq!(params["hashes"], "aaa|bbb");
        assert_eq!(params["private"], "true");
    }

    #[test]
    fn test_sort_without_reverse_omits_flag() {
        let params = TorrentQuery::default().sort("name", false).to_params();
        assert!(params.iter().any(|(k, v)| k == "sort" && v == "name"));
        assert!(!params.iter().any(|(k, _)| k == "reverse"));
    }
}
