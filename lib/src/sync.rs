use crate::error::{Result, TsundokuError};
use crate::models::Bookmark;
use crate::store::BookmarkStore;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A mirror of the collection living somewhere else, keyed by URL.
pub trait RemoteStore {
    fn fetch_all(&self) -> Result<Vec<Bookmark>>;
    fn put(&self, bookmark: &Bookmark) -> Result<()>;
    fn delete(&self, url: &str) -> Result<()>;
}

/// Where a sync currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// One record the remote side refused to accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub url: String,
    pub reason: String,
}

/// What a merge did: the unified collection plus the writes it took to get
/// each side there.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// One record per distinct URL across both inputs; local records first in
    /// stored order, then remote-only records in remote order.
    pub unified: Vec<Bookmark>,
    /// Local records written to the remote (new there, or newer here).
    pub pushed: usize,
    /// Remote-only records inserted locally.
    pub pulled: usize,
    /// Local records overwritten because the remote copy was newer.
    pub refreshed: usize,
    pub failures: Vec<SyncFailure>,
}

impl MergeOutcome {
    pub fn had_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Everything `push_all` managed to write, and what it could not.
#[derive(Debug, Default)]
pub struct PushOutcome {
    pub pushed: usize,
    pub failures: Vec<SyncFailure>,
}

/// Merge the local collection with the remote one, last write wins per URL.
///
/// The newer side's record (by `last_modified`, falling back to `add_date`)
/// is written to the older side; on an equal stamp neither side is written.
/// A record the remote refuses is reported in `failures` and skipped, never
/// aborting the rest of the run. A failure to even fetch the remote
/// collection is returned as an error with the local store untouched.
pub fn merge(store: &BookmarkStore, remote: &dyn RemoteStore) -> Result<MergeOutcome> {
    let local = store.records()?;
    let remote_records = remote.fetch_all()?;

    // Key the remote set by URL, keeping first-seen order for the leftovers.
    let mut remote_map: HashMap<String, Bookmark> = HashMap::new();
    let mut remote_order: Vec<String> = Vec::new();
    for record in remote_records {
        if !remote_map.contains_key(&record.url) {
            remote_order.push(record.url.clone());
        }
        remote_map.insert(record.url.clone(), record);
    }

    let mut outcome = MergeOutcome::default();

    for local_record in local {
        match remote_map.remove(&local_record.url) {
            None => {
                // New to the remote side.
                push_one(remote, &local_record, &mut outcome.pushed, &mut outcome.failures);
                outcome.unified.push(local_record);
            }
            Some(remote_record) => {
                let local_stamp = local_record.stamp();
                let remote_stamp = remote_record.stamp();
                if remote_stamp > local_stamp {
                    store.upsert(&remote_record)?;
                    outcome.refreshed += 1;
                    outcome.unified.push(remote_record);
                } else if local_stamp > remote_stamp {
                    push_one(remote, &local_record, &mut outcome.pushed, &mut outcome.failures);
                    outcome.unified.push(local_record);
                } else {
                    outcome.unified.push(local_record);
                }
            }
        }
    }

    // Whatever the local pass did not consume is new to this side.
    for url in remote_order {
        if let Some(remote_record) = remote_map.remove(&url) {
            store.upsert(&remote_record)?;
            outcome.pulled += 1;
            outcome.unified.push(remote_record);
        }
    }

    log::info!(
        "merge complete: {} unified, {} pushed, {} pulled, {} refreshed, {} failed",
        outcome.unified.len(),
        outcome.pushed,
        outcome.pulled,
        outcome.refreshed,
        outcome.failures.len()
    );
    Ok(outcome)
}

fn push_one(
    remote: &dyn RemoteStore,
    record: &Bookmark,
    pushed: &mut usize,
    failures: &mut Vec<SyncFailure>,
) {
    match remote.put(record) {
        Ok(()) => *pushed += 1,
        Err(e) => {
            log::warn!("remote write failed for {}: {}", record.url, e);
            failures.push(SyncFailure {
                url: record.url.clone(),
                reason: e.to_string(),
            });
        }
    }
}

/// Write every local record to the remote, regardless of stamps.
pub fn push_all(store: &BookmarkStore, remote: &dyn RemoteStore) -> Result<PushOutcome> {
    let mut outcome = PushOutcome::default();
    for record in store.records()? {
        push_one(remote, &record, &mut outcome.pushed, &mut outcome.failures);
    }
    Ok(outcome)
}

/// Replace the local collection with a remote snapshot, atomically.
pub fn apply_remote_snapshot(store: &BookmarkStore, remote: &dyn RemoteStore) -> Result<usize> {
    let snapshot = remote.fetch_all()?;
    store.replace_all(&snapshot)
}

/// A remote store held in a single JSON file, typically on a synced or
/// network-mounted path. Writes are whole-file.
pub struct JsonFileRemote {
    path: PathBuf,
}

impl JsonFileRemote {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<Bookmark>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                TsundokuError::Remote(format!(
                    "malformed remote data in {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            // A missing file is an empty remote, not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(TsundokuError::Remote(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write(&self, records: &[Bookmark]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| TsundokuError::Remote(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| {
            TsundokuError::Remote(format!("cannot write {}: {}", self.path.display(), e))
        })
    }
}

impl RemoteStore for JsonFileRemote {
    fn fetch_all(&self) -> Result<Vec<Bookmark>> {
        self.read()
    }

    fn put(&self, bookmark: &Bookmark) -> Result<()> {
        let mut records = self.read()?;
        match records.iter_mut().find(|r| r.url == bookmark.url) {
            Some(slot) => *slot = bookmark.clone(),
            None => records.push(bookmark.clone()),
        }
        self.write(&records)
    }

    fn delete(&self, url: &str) -> Result<()> {
        let mut records = self.read()?;
        records.retain(|r| r.url != url);
        self.write(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// In-memory remote; can be told to refuse writes for specific URLs or
    /// to fail fetching outright.
    #[derive(Default)]
    struct MemoryRemote {
        records: RefCell<Vec<Bookmark>>,
        fail_puts_for: Vec<String>,
        fail_fetch: bool,
        puts: Cell<usize>,
    }

    impl MemoryRemote {
        fn seeded(records: Vec<Bookmark>) -> Self {
            Self {
                records: RefCell::new(records),
                ..Self::default()
            }
        }

        fn urls(&self) -> Vec<String> {
            self.records.borrow().iter().map(|r| r.url.clone()).collect()
        }
    }

    impl RemoteStore for MemoryRemote {
        fn fetch_all(&self) -> Result<Vec<Bookmark>> {
            if self.fail_fetch {
                return Err(TsundokuError::Remote("remote unavailable".into()));
            }
            Ok(self.records.borrow().clone())
        }

        fn put(&self, bookmark: &Bookmark) -> Result<()> {
            if self.fail_puts_for.contains(&bookmark.url) {
                return Err(TsundokuError::Remote(format!(
                    "write refused for {}",
                    bookmark.url
                )));
            }
            self.puts.set(self.puts.get() + 1);
            let mut records = self.records.borrow_mut();
            match records.iter_mut().find(|r| r.url == bookmark.url) {
                Some(slot) => *slot = bookmark.clone(),
                None => records.push(bookmark.clone()),
            }
            Ok(())
        }

        fn delete(&self, url: &str) -> Result<()> {
            self.records.borrow_mut().retain(|r| r.url != url);
            Ok(())
        }
    }

    fn stamped(url: &str, title: &str, add_date: i64, last_modified: Option<i64>) -> Bookmark {
        Bookmark {
            last_modified,
            ..Bookmark::new(url.into(), title.into(), add_date)
        }
    }

    fn store_with(records: &[Bookmark]) -> BookmarkStore {
        let store = BookmarkStore::open_in_memory().unwrap();
        store.import_records(records).unwrap();
        store
    }

    #[test]
    fn test_newer_remote_wins_and_updates_local_only() {
        let store = store_with(&[stamped("https://x.com", "local", 10, Some(100))]);
        let remote = MemoryRemote::seeded(vec![stamped("https://x.com", "remote", 10, Some(200))]);

        let outcome = merge(&store, &remote).unwrap();

        assert_eq!(outcome.refreshed, 1);
        assert_eq!(outcome.pushed, 0);
        assert_eq!(outcome.pulled, 0);
        assert_eq!(outcome.unified.len(), 1);
        assert_eq!(outcome.unified[0].title, "remote");
        // Local store reflects the remote version; the remote saw no write.
        let local = store.get_by_url("https://x.com").unwrap().unwrap();
        assert_eq!(local.title, "remote");
        assert_eq!(local.last_modified, Some(200));
        assert_eq!(remote.puts.get(), 0);
    }

    #[test]
    fn test_newer_local_wins_and_writes_remote_only() {
        let store = store_with(&[stamped("https://x.com", "local", 10, Some(300))]);
        let remote = MemoryRemote::seeded(vec![stamped("https://x.com", "remote", 10, Some(200))]);

        let outcome = merge(&store, &remote).unwrap();

        assert_eq!(outcome.pushed, 1);
        assert_eq!(outcome.refreshed, 0);
        assert_eq!(outcome.unified[0].title, "local");
        assert_eq!(remote.records.borrow()[0].title, "local");
        assert_eq!(
            store.get_by_url("https://x.com").unwrap().unwrap().title,
            "local"
        );
    }

    #[test]
    fn test_local_only_record_is_pushed_once() {
        let store = store_with(&[stamped("https://y.com", "mine", 10, Some(50))]);
        let remote = MemoryRemote::default();

        let outcome = merge(&store, &remote).unwrap();

        assert_eq!(outcome.pushed, 1);
        assert_eq!(remote.puts.get(), 1);
        assert_eq!(remote.urls(), vec!["https://y.com"]);
        assert_eq!(outcome.unified[0].title, "mine");
    }

    #[test]
    fn test_equal_stamps_keep_local_and_write_nothing() {
        let store = store_with(&[stamped("https://x.com", "local words", 10, Some(100))]);
        let remote =
            MemoryRemote::seeded(vec![stamped("https://x.com", "remote words", 10, Some(100))]);

        let outcome = merge(&store, &remote).unwrap();

        assert_eq!(outcome.pushed + outcome.pulled + outcome.refreshed, 0);
        assert_eq!(remote.puts.get(), 0);
        assert_eq!(outcome.unified[0].title, "local words");
        assert_eq!(
            store.get_by_url("https://x.com").unwrap().unwrap().title,
            "local words"
        );
    }

    #[test]
    fn test_stamp_falls_back_to_add_date() {
        // No last_modified on the local side; its add_date of 300 beats the
        // remote's explicit stamp of 200.
        let store = store_with(&[stamped("https://x.com", "local", 300, None)]);
        let remote = MemoryRemote::seeded(vec![stamped("https://x.com", "remote", 10, Some(200))]);

        let outcome = merge(&store, &remote).unwrap();
        assert_eq!(outcome.pushed, 1);
        assert_eq!(remote.records.borrow()[0].title, "local");
    }

    #[test]
    fn test_remote_only_records_append_in_remote_order() {
        let store = store_with(&[stamped("https://a.com", "a", 1, None)]);
        let remote = MemoryRemote::seeded(vec![
            stamped("https://b.com", "b", 2, None),
            stamped("https://a.com", "a", 1, None),
            stamped("https://c.com", "c", 3, None),
        ]);

        let outcome = merge(&store, &remote).unwrap();

        assert_eq!(outcome.pulled, 2);
        let urls: Vec<&str> = outcome.unified.iter().map(|b| b.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
        assert!(store.get_by_url("https://b.com").unwrap().is_some());
        assert!(store.get_by_url("https://c.com").unwrap().is_some());
    }

    #[test]
    fn test_unified_has_one_record_per_url() {
        let store = store_with(&[
            stamped("https://a.com", "a", 1, None),
            stamped("https://b.com", "b", 2, None),
        ]);
        let remote = MemoryRemote::seeded(vec![
            stamped("https://b.com", "b2", 2, Some(9)),
            stamped("https://c.com", "c", 3, None),
        ]);

        let outcome = merge(&store, &remote).unwrap();
        let mut urls: Vec<&str> = outcome.unified.iter().map(|b| b.url.as_str()).collect();
        urls.sort_unstable();
        assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
    }

    #[test]
    fn test_failed_remote_write_does_not_abort_the_rest() {
        let store = store_with(&[
            stamped("https://bad.com", "bad", 1, Some(10)),
            stamped("https://good.com", "good", 2, Some(20)),
        ]);
        let remote = MemoryRemote {
            fail_puts_for: vec!["https://bad.com".into()],
            ..MemoryRemote::default()
        };

        let outcome = merge(&store, &remote).unwrap();

        assert!(outcome.had_failures());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].url, "https://bad.com");
        // The record after the failure still made it out.
        assert_eq!(outcome.pushed, 1);
        assert_eq!(remote.urls(), vec!["https://good.com"]);
        // Both records remain in the unified view.
        assert_eq!(outcome.unified.len(), 2);
    }

    #[test]
    fn test_unreachable_remote_leaves_local_intact() {
        let store = store_with(&[stamped("https://a.com", "a", 1, None)]);
        let remote = MemoryRemote {
            fail_fetch: true,
            ..MemoryRemote::default()
        };

        assert!(matches!(
            merge(&store, &remote),
            Err(TsundokuError::Remote(_))
        ));
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(
            store.get_by_url("https://a.com").unwrap().unwrap().title,
            "a"
        );
    }

    #[test]
    fn test_merge_twice_converges() {
        let store = store_with(&[
            stamped("https://a.com", "a", 1, Some(100)),
            stamped("https://b.com", "b", 2, None),
        ]);
        let remote = MemoryRemote::seeded(vec![stamped("https://c.com", "c", 3, Some(30))]);

        merge(&store, &remote).unwrap();
        let again = merge(&store, &remote).unwrap();

        assert_eq!(again.pushed, 0);
        assert_eq!(again.pulled, 0);
        assert_eq!(again.refreshed, 0);
        assert_eq!(again.unified.len(), 3);
    }

    #[test]
    fn test_push_all_covers_every_record_and_isolates_failures() {
        let store = store_with(&[
            stamped("https://a.com", "a", 1, None),
            stamped("https://bad.com", "bad", 2, None),
            stamped("https://c.com", "c", 3, None),
        ]);
        let remote = MemoryRemote {
            fail_puts_for: vec!["https://bad.com".into()],
            ..MemoryRemote::default()
        };

        let outcome = push_all(&store, &remote).unwrap();
        assert_eq!(outcome.pushed, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(remote.urls(), vec!["https://a.com", "https://c.com"]);
    }

    #[test]
    fn test_apply_remote_snapshot_replaces_local() {
        let store = store_with(&[stamped("https://gone.com", "gone", 1, None)]);
        let remote = MemoryRemote::seeded(vec![
            stamped("https://a.com", "a", 2, None),
            stamped("https://b.com", "b", 3, None),
        ]);

        assert_eq!(apply_remote_snapshot(&store, &remote).unwrap(), 2);
        assert!(store.get_by_url("https://gone.com").unwrap().is_none());
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_sync_status_display() {
        assert_eq!(SyncStatus::Idle.to_string(), "idle");
        assert_eq!(SyncStatus::Syncing.to_string(), "syncing");
        assert_eq!(SyncStatus::Synced.to_string(), "synced");
        assert_eq!(SyncStatus::Error.to_string(), "error");
    }

    mod json_file_remote {
        use super::*;

        #[test]
        fn test_missing_file_reads_as_empty() {
            let dir = tempfile::tempdir().unwrap();
            let remote = JsonFileRemote::new(dir.path().join("remote.json"));
            assert!(remote.fetch_all().unwrap().is_empty());
        }

        #[test]
        fn test_put_creates_then_replaces_by_url() {
            let dir = tempfile::tempdir().unwrap();
            let remote = JsonFileRemote::new(dir.path().join("remote.json"));

            remote
                .put(&stamped("https://a.com", "first", 1, None))
                .unwrap();
            remote
                .put(&stamped("https://b.com", "b", 2, None))
                .unwrap();
            remote
                .put(&stamped("https://a.com", "second", 3, Some(4)))
                .unwrap();

            let records = remote.fetch_all().unwrap();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].title, "second");
            assert_eq!(records[0].last_modified, Some(4));
        }

        #[test]
        fn test_delete_removes_matching_url_quietly() {
            let dir = tempfile::tempdir().unwrap();
            let remote = JsonFileRemote::new(dir.path().join("remote.json"));
            remote.put(&stamped("https://a.com", "a", 1, None)).unwrap();

            remote.delete("https://a.com").unwrap();
            remote.delete("https://never-there.com").unwrap();
            assert!(remote.fetch_all().unwrap().is_empty());
        }

        #[test]
        fn test_malformed_file_is_a_remote_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("remote.json");
            std::fs::write(&path, "{ not json").unwrap();

            let remote = JsonFileRemote::new(path);
            assert!(matches!(
                remote.fetch_all(),
                Err(TsundokuError::Remote(_))
            ));
        }

        #[test]
        fn test_merge_through_file_remote() {
            let dir = tempfile::tempdir().unwrap();
            let remote = JsonFileRemote::new(dir.path().join("remote.json"));
            remote
                .put(&stamped("https://r.com", "remote only", 5, None))
                .unwrap();

            let store = store_with(&[stamped("https://l.com", "local only", 1, None)]);
            let outcome = merge(&store, &remote).unwrap();

            assert_eq!(outcome.pushed, 1);
            assert_eq!(outcome.pulled, 1);
            assert_eq!(store.count().unwrap(), 2);
            assert_eq!(remote.fetch_all().unwrap().len(), 2);
        }
    }
}
