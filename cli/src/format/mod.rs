use crate::{
    format::{json::JsonBookmark, plain::PlainBookmark, traits::BookmarkFormat},
    output::colorize::{Colorize, ColorizeBookmark},
};
use tsundoku::models::Bookmark;

pub mod json;
pub mod plain;
pub mod traits;

#[derive(Clone, Copy)]
pub enum OutputFormat {
    Json,
    Plain,
    Colored,
}

impl OutputFormat {
    pub fn from_string(format: &str) -> Self {
        match format {
            "json" => OutputFormat::Json,
            "plain" => OutputFormat::Plain,
            _ => OutputFormat::Colored,
        }
    }

    pub fn print_bookmarks(self, records: &[Bookmark], no_color: bool) {
        for b in records {
            let rendered = match self {
                OutputFormat::Json => JsonBookmark(b).to_string(),
                OutputFormat::Plain => PlainBookmark(b).to_string(),
                OutputFormat::Colored if no_color => PlainBookmark(b).to_string(),
                OutputFormat::Colored => ColorizeBookmark(b).to_colored(),
            };
            println!("{}", rendered);
        }
    }
}

/// Render a Unix timestamp as a calendar day for terminal display.
pub fn format_date(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
