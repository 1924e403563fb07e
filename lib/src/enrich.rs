use crate::config::Config;
use crate::error::{Result, TsundokuError};
use crate::fetch::{extract_ogp, PageFetcher};
use crate::models::{Bookmark, OgpInfo};
use crate::store::BookmarkStore;
use std::thread;
use std::time::Duration;

/// Pacing for the metadata refresh loop. The defaults keep the crawl polite
/// (three pages at a time, a second of quiet between batches) and can be
/// overridden from the config file.
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl EnrichOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.fetch_batch_size,
            batch_delay: Duration::from_millis(config.fetch_batch_delay_ms),
        }
    }
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Records that still lacked metadata when the pass started.
    pub pending: usize,
    pub enriched: usize,
    pub failed: usize,
}

/// Fetch Open Graph metadata for every record that has never been looked at.
///
/// Pages inside a batch are fetched on worker threads, then the results are
/// written back one by one on the caller's thread. A page that cannot be
/// fetched or parsed is marked as attempted so the next pass does not retry
/// it; the pass itself keeps going. Database errors abort the pass.
pub fn enrich_pending(
    store: &BookmarkStore,
    fetcher: &dyn PageFetcher,
    opts: &EnrichOptions,
) -> Result<EnrichReport> {
    let pending: Vec<Bookmark> = store
        .records()?
        .into_iter()
        .filter(Bookmark::needs_enrichment)
        .collect();

    let mut report = EnrichReport {
        pending: pending.len(),
        ..EnrichReport::default()
    };
    if pending.is_empty() {
        return Ok(report);
    }

    let batch_size = opts.batch_size.max(1);
    for (nth, batch) in pending.chunks(batch_size).enumerate() {
        if nth > 0 && !opts.batch_delay.is_zero() {
            thread::sleep(opts.batch_delay);
        }

        thread::scope(|scope| -> Result<()> {
            let workers: Vec<_> = batch
                .iter()
                .map(|rec| (rec, scope.spawn(move || fetch_one(fetcher, &rec.url))))
                .collect();

            for (rec, worker) in workers {
                let Some(id) = rec.id else { continue };
                let outcome = worker.join().unwrap_or_else(|_| {
                    Err(TsundokuError::Other("metadata worker panicked".to_string()))
                });
                match outcome {
                    Ok(ogp) => {
                        store.set_ogp(id, &ogp)?;
                        report.enriched += 1;
                    }
                    Err(err) => {
                        log::warn!("metadata fetch for {} failed: {}", rec.url, err);
                        store.set_ogp(id, &OgpInfo::attempted())?;
                        report.failed += 1;
                    }
                }
            }
            Ok(())
        })?;
    }

    log::info!(
        "metadata refresh: {} pending, {} enriched, {} failed",
        report.pending,
        report.enriched,
        report.failed
    );
    Ok(report)
}

fn fetch_one(fetcher: &dyn PageFetcher, url: &str) -> Result<OgpInfo> {
    let html = fetcher.fetch(url)?;
    extract_ogp(&html, url)
}
