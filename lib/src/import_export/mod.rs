pub mod export;
pub mod import;

pub use export::{export_bookmarks, ExportFormat};
pub use import::{import_bookmarks, parse_bookmark_html};

/// Escapes the characters that would corrupt the bookmark document when a
/// title, URL or tag contains markup (`&`, `<`, `>`, `"`).
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Decodes HTML entities produced by [`escape_html`] as well as the numeric
/// and apostrophe forms other browsers emit in their exports.
pub fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match decode_entity(rest) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes a single entity at the start of `text`, returning the character
/// and the number of bytes consumed. `None` leaves the ampersand literal.
fn decode_entity(text: &str) -> Option<(char, usize)> {
    for (entity, decoded) in [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#39;", '\''),
        ("&apos;", '\''),
        ("&nbsp;", '\u{a0}'),
    ] {
        if text.starts_with(entity) {
            return Some((decoded, entity.len()));
        }
    }
    let semi = text.find(';')?;
    let body = &text[1..semi];
    let code = if let Some(hex) = body
        .strip_prefix('#')
        .and_then(|b| b.strip_prefix('x').or_else(|| b.strip_prefix('X')))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = body.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).map(|c| (c, semi + 1))
}
