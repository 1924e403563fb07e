use serde::{Deserialize, Serialize};

/// Open Graph metadata attached to a bookmark after enrichment.
///
/// `loaded` is set once enrichment has been attempted, successful or not,
/// so a record is never retried indefinitely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OgpInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub loaded: bool,
}

impl OgpInfo {
    /// Marker for a record whose enrichment was attempted but yielded nothing.
    pub fn attempted() -> Self {
        Self {
            loaded: true,
            ..Self::default()
        }
    }
}

/// Represents a saved link with all its metadata.
///
/// JSON field names are camelCase (`addDate`, `lastModified`) to match the
/// export dialect this tool reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Local store rowid; absent until the record has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub url: String,
    /// Creation/import timestamp, Unix seconds.
    pub add_date: i64,
    /// Last mutation timestamp, Unix seconds; `stamp()` falls back to `add_date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ogp: Option<OgpInfo>,
}

impl Bookmark {
    /// Create a new Bookmark with the minimal required fields
    pub fn new(url: String, title: String, add_date: i64) -> Self {
        Self {
            id: None,
            title,
            url,
            add_date,
            last_modified: None,
            icon: None,
            tags: Vec::new(),
            image: None,
            ogp: None,
        }
    }

    /// Timestamp used for last-write-wins comparisons
    pub fn stamp(&self) -> i64 {
        self.last_modified.unwrap_or(self.add_date)
    }

    /// Display label; falls back to the URL when the title is empty
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    /// Record a mutation by refreshing the last-modified timestamp
    pub fn touch(&mut self, now: i64) {
        self.last_modified = Some(now);
    }

    /// Whether metadata enrichment is still pending for this record
    pub fn needs_enrichment(&self) -> bool {
        match &self.ogp {
            Some(ogp) => !ogp.loaded,
            None => true,
        }
    }
}
