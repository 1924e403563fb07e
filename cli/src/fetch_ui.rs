use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tsundoku::enrich::{enrich_pending, EnrichOptions, EnrichReport};
use tsundoku::error::{Result, TsundokuError};
use tsundoku::fetch::{extract_ogp, HttpFetcher, PageFetcher};
use tsundoku::models::OgpInfo;
use tsundoku::store::BookmarkStore;

/// Fetch one page's metadata with visual spinner feedback
///
/// Shows an animated spinner while fetching, then displays success/failure
/// status with categorized error messages.
pub fn fetch_with_spinner(url: &str, user_agent: &str) -> Result<OgpInfo> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );

    let url_display = truncate_url(url, 60);
    spinner.set_message(format!("Fetching: {}", url_display));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = HttpFetcher::new(user_agent)
        .and_then(|fetcher| fetcher.fetch(url))
        .and_then(|html| extract_ogp(&html, url));

    match &result {
        Ok(_) => spinner.finish_with_message(format!("✓ {}", url_display)),
        Err(e) => {
            let error_msg = categorize_error(e);
            spinner.finish_with_message(format!("✗ {} ({})", url_display, error_msg));
        }
    }

    result
}

/// Run a metadata refresh pass behind a spinner; the caller prints the
/// summary.
pub fn refresh_with_progress(
    store: &BookmarkStore,
    fetcher: &dyn PageFetcher,
    opts: &EnrichOptions,
) -> Result<EnrichReport> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message("Refreshing metadata...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = enrich_pending(store, fetcher, opts);
    spinner.finish_and_clear();
    result
}

/// Shortens a URL for the spinner message, appending an ellipsis.
pub fn truncate_url(url: &str, max_len: usize) -> String {
    if url.chars().count() > max_len {
        let keep = max_len.saturating_sub(3); // Reserve 3 chars for "..."
        let head: String = url.chars().take(keep).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}

/// Collapses a fetch failure into a short label for the status line.
///
/// First matching rule wins, so "timeout" outranks the generic
/// "connection" bucket.
pub fn categorize_error(error: &TsundokuError) -> &'static str {
    const RULES: [(&str, &str); 6] = [
        ("403", "blocked"),
        ("401", "unauthorized"),
        ("404", "not found"),
        ("timeout", "timeout"),
        ("dns", "dns error"),
        ("connection", "connection error"),
    ];

    let text = error.to_string();
    RULES
        .iter()
        .find(|(needle, _)| text.contains(needle))
        .map_or("fetch error", |(_, label)| *label)
}
