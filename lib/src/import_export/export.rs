use crate::models::Bookmark;
use crate::store::BookmarkStore;
use crate::tags::join_tags;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::escape_html;

/// Trait for exporting bookmarks to different formats
pub trait BookmarkExporter {
    fn export(&self, records: &[Bookmark], path: &Path) -> crate::error::Result<()>;
}

/// Export format, derived from the target file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") => {
                Some(Self::Html)
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render a collection as a Netscape bookmark document.
///
/// One `<DT><A ...>` line per record; `LAST_MODIFIED` falls back to the
/// record's `add_date`, and `ICON`/`TAGS` appear only when the record carries
/// them. The output re-parses to the same records.
pub fn render_html(records: &[Bookmark]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE NETSCAPE-Bookmark-file-1>\n");
    out.push_str("<!-- This is an automatically generated file.\n");
    out.push_str("     It will be read and overwritten.\n");
    out.push_str("     DO NOT EDIT! -->\n");
    out.push_str("<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n");
    out.push_str("<TITLE>Bookmarks</TITLE>\n");
    out.push_str("<H1>Bookmarks</H1>\n");
    out.push_str("<DL><p>\n");

    for record in records {
        out.push_str(&format!(
            "    <DT><A HREF=\"{}\" ADD_DATE=\"{}\" LAST_MODIFIED=\"{}\"",
            escape_html(&record.url),
            record.add_date,
            record.stamp(),
        ));
        if let Some(icon) = &record.icon {
            out.push_str(&format!(" ICON=\"{}\"", escape_html(icon)));
        }
        if !record.tags.is_empty() {
            out.push_str(&format!(
                " TAGS=\"{}\"",
                escape_html(&join_tags(&record.tags))
            ));
        }
        out.push_str(&format!(">{}</A>\n", escape_html(&record.title)));
    }

    out.push_str("</DL><p>\n");
    out
}

/// Render a collection as a JSON array, every field preserved.
pub fn render_json(records: &[Bookmark]) -> crate::error::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// HTML/Netscape bookmark file exporter
pub struct HtmlExporter;

impl BookmarkExporter for HtmlExporter {
    fn export(&self, records: &[Bookmark], path: &Path) -> crate::error::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(render_html(records).as_bytes())?;
        Ok(())
    }
}

/// Lossless JSON exporter
pub struct JsonExporter;

impl BookmarkExporter for JsonExporter {
    fn export(&self, records: &[Bookmark], path: &Path) -> crate::error::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(render_json(records)?.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

/// Export the whole store to a file, picking the format from its extension.
pub fn export_bookmarks(store: &BookmarkStore, file_path: &str) -> crate::error::Result<()> {
    let path = Path::new(file_path);
    let records = store.records()?;

    let exporter: Box<dyn BookmarkExporter> = match ExportFormat::from_path(path) {
        Some(ExportFormat::Html) => Box::new(HtmlExporter),
        Some(ExportFormat::Json) => Box::new(JsonExporter),
        None => {
            return Err(crate::error::TsundokuError::InvalidInput(format!(
                "unsupported export format: {}",
                path.display()
            )))
        }
    };

    exporter.export(&records, path)
}
