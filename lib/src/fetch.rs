use crate::error::{Result, TsundokuError};
use crate::import_export::unescape_html;
use crate::models::OgpInfo;
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::time::Duration;
use tl::ParserOptions;

/// Remote pages that have not answered within this window are treated as
/// failed; enrichment moves on to the next record.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches the text of a remote page. Implementations must be shareable
/// across the enrichment worker threads.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send()?;

        let status = resp.status();
        if !status.is_success() {
            // Provide helpful error messages based on status code
            let error_msg = match status.as_u16() {
                403 => {
                    "HTTP 403 Forbidden - This is often caused by user-agent blocking.\n\
                     Try customizing the user-agent in ~/.config/tsundoku/config.yml"
                }
                401 => {
                    "HTTP 401 Unauthorized - The website requires authentication or is blocking your request.\n\
                     This might be due to user-agent or other access restrictions."
                }
                404 => "HTTP 404 Not Found - The URL does not exist",
                429 => "HTTP 429 Too Many Requests - You are being rate limited",
                500..=599 => "HTTP 5xx Server Error - The website is experiencing issues",
                _ => "HTTP request failed with non-success status",
            };
            return Err(TsundokuError::Other(format!(
                "{} (Status: {})",
                error_msg, status
            )));
        }

        Ok(resp.text()?)
    }
}

/// Extract Open Graph metadata from a fetched page.
///
/// Lookup order per field: the `og:` meta tag, then the `twitter:` one, then
/// the document's own `<title>` / `description` meta. Within one spelling the
/// first occurrence wins, and a `property=` attribution beats a `name=` one
/// wherever it appears in the document. An image URL is resolved against the
/// page's own URL so relative references survive being stored.
pub fn extract_ogp(html: &str, page_url: &str) -> Result<OgpInfo> {
    let dom = tl::parse(html, ParserOptions::default())?;
    let parser = dom.parser();

    let mut by_property: HashMap<String, String> = HashMap::new();
    let mut by_name: HashMap<String, String> = HashMap::new();

    for node in dom.nodes() {
        if let Some(tag) = node.as_tag() {
            if !tag.name().as_utf8_str().eq_ignore_ascii_case("meta") {
                continue;
            }
            let content = match attr(tag, "content") {
                // An empty content is as good as no tag; later fallbacks apply.
                Some(content) if !content.is_empty() => content,
                _ => continue,
            };
            if let Some(property) = attr(tag, "property") {
                by_property.entry(property).or_insert(content);
            } else if let Some(name) = attr(tag, "name") {
                by_name.entry(name).or_insert(content);
            }
        }
    }

    let get_meta =
        |key: &str| -> Option<String> { by_property.get(key).or_else(|| by_name.get(key)).cloned() };

    let title = get_meta("og:title")
        .or_else(|| get_meta("twitter:title"))
        .or_else(|| document_title(&dom, parser));
    let description = get_meta("og:description")
        .or_else(|| get_meta("twitter:description"))
        .or_else(|| get_meta("description"));
    let image = get_meta("og:image")
        .or_else(|| get_meta("twitter:image"))
        .map(|image| resolve_image_url(image, page_url));

    Ok(OgpInfo {
        title,
        description,
        image,
        loaded: true,
    })
}

fn document_title(dom: &tl::VDom, parser: &tl::Parser) -> Option<String> {
    dom.query_selector("title")
        .and_then(|mut iter| iter.next())
        .and_then(|handle| handle.get(parser))
        .map(|node| unescape_html(node.inner_text(parser).as_ref()))
        .filter(|title| !title.is_empty())
}

fn attr(tag: &tl::HTMLTag, name: &'static str) -> Option<String> {
    tag.attributes()
        .get(name)
        .flatten()
        .map(|value| unescape_html(value.as_utf8_str().as_ref()))
}

/// Resolve a possibly-relative image reference against the page it came
/// from. Anything that cannot be resolved is kept as-is.
fn resolve_image_url(image: String, page_url: &str) -> String {
    match reqwest::Url::parse(page_url).and_then(|base| base.join(&image)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => image,
    }
}
