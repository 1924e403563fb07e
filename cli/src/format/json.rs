use crate::format::traits::BookmarkFormat;
use tsundoku::models::Bookmark;

/// Pretty-printed JSON, one document per bookmark. Field names match the
/// export document (`addDate`, `lastModified`) so the output can be piped
/// into jq or fed back to a remote store unchanged.
pub struct JsonBookmark<'a>(pub &'a Bookmark);

impl<'a> BookmarkFormat for JsonBookmark<'a> {
    fn to_string(&self) -> String {
        serde_json::to_string_pretty(self.0).unwrap()
    }
}
