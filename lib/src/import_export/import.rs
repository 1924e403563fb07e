use crate::models::Bookmark;
use crate::store::BookmarkStore;
use crate::tags::parse_tags;
use std::path::Path;

use super::unescape_html;

/// Trait for importing bookmarks from different sources
pub trait BookmarkImporter {
    fn import(&self, store: &BookmarkStore, path: &Path) -> crate::error::Result<ImportReport>;
}

/// Outcome of a file import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records written to the store (new or replacing an existing URL).
    pub imported: usize,
    /// Anchors dropped because they carried no usable URL.
    pub skipped: usize,
}

/// Records extracted from one document, plus how many anchors were dropped.
#[derive(Debug, Default)]
pub struct ParseSummary {
    pub records: Vec<Bookmark>,
    pub skipped: usize,
}

/// Parse a browser bookmark export (the Netscape `<DT><A ...>` dialect).
///
/// Every anchor element becomes one record, in document order, regardless of
/// folder nesting. An anchor without an `HREF` value is dropped; any other
/// missing attribute falls back to its default (`add_date` 0, `last_modified`
/// unset, empty tag list). Malformed surrounding markup is not an error, and
/// a document without anchors yields an empty list.
pub fn parse_bookmark_document(html: &str) -> crate::error::Result<ParseSummary> {
    let dom = tl::parse(html, tl::ParserOptions::default())?;
    let parser = dom.parser();

    let mut summary = ParseSummary::default();

    for node in dom.nodes() {
        if let Some(tag) = node.as_tag() {
            match tag.name().as_utf8_str().as_ref() {
                "A" | "a" => {
                    let url = attr(tag, "HREF", "href").unwrap_or_default();
                    if url.is_empty() {
                        log::debug!("dropping anchor without HREF");
                        summary.skipped += 1;
                        continue;
                    }

                    let title = unescape_html(tag.inner_text(parser).as_ref());
                    let add_date = attr(tag, "ADD_DATE", "add_date")
                        .and_then(|v| parse_stamp(&v))
                        .unwrap_or(0);
                    let last_modified =
                        attr(tag, "LAST_MODIFIED", "last_modified").and_then(|v| parse_stamp(&v));
                    let icon = attr(tag, "ICON", "icon").filter(|v| !v.is_empty());
                    let tags = attr(tag, "TAGS", "tags")
                        .map(|v| parse_tags(&v))
                        .unwrap_or_default();

                    summary.records.push(Bookmark {
                        id: None,
                        title,
                        url,
                        add_date,
                        last_modified,
                        icon,
                        tags,
                        image: None,
                        ogp: None,
                    });
                }
                _ => {}
            }
        }
    }

    Ok(summary)
}

/// Parse a bookmark document, returning only the extracted records.
pub fn parse_bookmark_html(html: &str) -> crate::error::Result<Vec<Bookmark>> {
    Ok(parse_bookmark_document(html)?.records)
}

/// Look up an attribute under both the uppercase and lowercase spelling
/// (browser exports traditionally shout, hand-written files often do not)
/// and decode any HTML entities in its value.
fn attr(tag: &tl::HTMLTag, upper: &'static str, lower: &'static str) -> Option<String> {
    tag.attributes()
        .get(upper)
        .or_else(|| tag.attributes().get(lower))
        .flatten()
        .map(|value| unescape_html(value.as_utf8_str().as_ref()))
}

/// Parse a timestamp attribute. Whitespace is tolerated; anything that is not
/// a whole number is treated as absent.
fn parse_stamp(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// HTML/Netscape bookmark file importer
pub struct HtmlImporter;

impl BookmarkImporter for HtmlImporter {
    fn import(&self, store: &BookmarkStore, path: &Path) -> crate::error::Result<ImportReport> {
        let html = std::fs::read_to_string(path)?;
        let summary = parse_bookmark_document(&html)?;
        let imported = store.import_records(&summary.records)?;
        Ok(ImportReport {
            imported,
            skipped: summary.skipped,
        })
    }
}

/// Import bookmarks from a browser HTML export file.
///
/// Existing records with the same URL are replaced by the file's version.
pub fn import_bookmarks(store: &BookmarkStore, file_path: &str) -> crate::error::Result<ImportReport> {
    let importer = HtmlImporter;
    importer.import(store, Path::new(file_path))
}
