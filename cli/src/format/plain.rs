use crate::format::format_date;
use crate::format::traits::BookmarkFormat;
use tsundoku::models::Bookmark;

pub struct PlainBookmark<'a>(pub &'a Bookmark);

impl<'a> BookmarkFormat for PlainBookmark<'a> {
    fn to_string(&self) -> String {
        let b = self.0;
        let id = b.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());

        let mut s = format!(
            "{}. {} ({})\n",
            id,
            b.display_title(),
            format_date(b.add_date)
        );
        let padding = id.len() + 3;
        s.push_str(&format!("{:>padding$} {}\n", ">", b.url));

        if let Some(desc) = b.ogp.as_ref().and_then(|ogp| ogp.description.as_deref()) {
            if !desc.trim().is_empty() {
                s.push_str(&format!("{:>padding$} {}\n", "+", desc));
            }
        }

        if !b.tags.is_empty() {
            s.push_str(&format!("{:>padding$} {}\n", "#", b.tags.join(", ")));
        }
        s
    }
}
