use crate::format::format_date;
use owo_colors::OwoColorize;
use tsundoku::models::Bookmark;

pub trait Colorize {
    fn to_colored(&self) -> String;
}

pub struct ColorizeBookmark<'a>(pub &'a Bookmark);

impl<'a> Colorize for ColorizeBookmark<'a> {
    fn to_colored(&self) -> String {
        let b = self.0;
        let mut s = String::new();
        let id = b.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        s.push_str(&format!(
            "{}. {} {}\n",
            id.bright_blue(),
            b.display_title().bold().green(),
            format_date(b.add_date).dimmed(),
        ));
        let padding = id.len() + 3;
        // padding for alignment
        s.push_str(&format!("{:>padding$} {}\n", ">".red(), b.url.yellow()));

        // Only show a description if the page yielded one
        if let Some(desc) = b.ogp.as_ref().and_then(|ogp| ogp.description.as_deref()) {
            if !desc.trim().is_empty() {
                s.push_str(&format!("{:>padding$} {}\n", "+".red(), desc));
            }
        }

        if !b.tags.is_empty() {
            let tags_str = b.tags.join(", ");
            s.push_str(&format!("{:>padding$} {}\n", "#".red(), tags_str.blue()));
        }
        s
    }
}
