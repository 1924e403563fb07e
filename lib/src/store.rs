use crate::db::{TsunDb, UpsertOutcome};
use crate::error::{Result, TsundokuError};
use crate::models::bookmark::{Bookmark, OgpInfo};
use crate::utils;
use std::path::Path;

/// A change that went through the store. Bulk operations emit one event for
/// the whole batch, single-record operations one event per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added(i64),
    Updated(i64),
    Deleted(i64),
    Cleared,
    Imported(usize),
    Replaced(usize),
}

/// Observer notified after every committed mutation. Notification happens
/// once the write is durable, so an observer always sees the new state when
/// it reads back.
pub trait StoreObserver {
    fn name(&self) -> &str;
    fn on_event(&self, event: &StoreEvent);
}

/// The local bookmark collection: a database handle plus the observers that
/// watch it change.
///
/// All mutations go through here so that `last_modified` stamping and change
/// notification cannot be skipped. User edits refresh `last_modified`;
/// writes that replay already-stamped records (import, sync) keep the
/// record's own stamps.
pub struct BookmarkStore {
    db: TsunDb,
    observers: Vec<Box<dyn StoreObserver>>,
}

impl BookmarkStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            db: TsunDb::init(db_path)?,
            observers: Vec::new(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            db: TsunDb::init_in_memory()?,
            observers: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.db.get_path()
    }

    pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) {
        log::debug!("observer '{}' subscribed", observer.name());
        self.observers.push(observer);
    }

    fn notify(&self, event: &StoreEvent) {
        log::debug!(
            "notifying {} observers of {:?}",
            self.observers.len(),
            event
        );
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    pub fn records(&self) -> Result<Vec<Bookmark>> {
        Ok(self.db.get_rec_all()?)
    }

    pub fn get(&self, id: i64) -> Result<Option<Bookmark>> {
        Ok(self.db.get_rec_by_id(id)?)
    }

    pub fn get_by_url(&self, url: &str) -> Result<Option<Bookmark>> {
        Ok(self.db.get_rec_by_url(url)?)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.db.count()?)
    }

    /// Add a brand-new record. The URL must be non-empty and not already in
    /// the collection. Returns the stored record, id filled in.
    pub fn add(&self, mut bookmark: Bookmark) -> Result<Bookmark> {
        if bookmark.url.is_empty() {
            return Err(TsundokuError::InvalidInput(
                "URL must not be empty".to_string(),
            ));
        }
        let id = self
            .db
            .add_rec(&bookmark)
            .map_err(|e| map_constraint(e, &bookmark.url))?;
        bookmark.id = Some(id);
        self.notify(&StoreEvent::Added(id));
        Ok(bookmark)
    }

    /// Persist a user edit of the whole record, refreshing `last_modified`.
    pub fn update(&self, mut bookmark: Bookmark) -> Result<Bookmark> {
        bookmark.touch(utils::now_secs());
        let url = bookmark.url.clone();
        self.db
            .update_rec(&bookmark)
            .map_err(|e| map_constraint(e, &url))?;
        let id = bookmark.id.unwrap_or_default();
        self.notify(&StoreEvent::Updated(id));
        Ok(bookmark)
    }

    /// Change the URL and/or title of an existing record.
    pub fn edit(&self, id: i64, url: Option<&str>, title: Option<&str>) -> Result<Bookmark> {
        let mut bookmark = self
            .get(id)?
            .ok_or(TsundokuError::BookmarkNotFound(id))?;
        if let Some(url) = url {
            if url.is_empty() {
                return Err(TsundokuError::InvalidInput(
                    "URL must not be empty".to_string(),
                ));
            }
            bookmark.url = url.to_string();
        }
        if let Some(title) = title {
            bookmark.title = title.to_string();
        }
        self.update(bookmark)
    }

    /// Replace a record's tag list.
    pub fn set_tags(&self, id: i64, tags: Vec<String>) -> Result<Bookmark> {
        let mut bookmark = self
            .get(id)?
            .ok_or(TsundokuError::BookmarkNotFound(id))?;
        bookmark.tags = tags;
        self.update(bookmark)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        match self.db.delete_rec(id) {
            Ok(()) => {
                self.notify(&StoreEvent::Deleted(id));
                Ok(())
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(TsundokuError::BookmarkNotFound(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drop every record, returning how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.db.clear()?;
        self.notify(&StoreEvent::Cleared);
        Ok(removed)
    }

    /// Bulk upsert of parsed records. The records' own timestamps are kept;
    /// an existing record with the same URL is replaced by the file's
    /// version.
    pub fn import_records(&self, records: &[Bookmark]) -> Result<usize> {
        let written = self.db.bulk_put(records)?;
        self.notify(&StoreEvent::Imported(written));
        Ok(written)
    }

    /// Write one record exactly as given, keyed by URL. Used when applying
    /// the other side of a sync, which must not re-stamp `last_modified`.
    pub fn upsert(&self, bookmark: &Bookmark) -> Result<UpsertOutcome> {
        let outcome = self.db.upsert_rec(bookmark)?;
        match outcome {
            UpsertOutcome::Inserted(id) => self.notify(&StoreEvent::Added(id)),
            UpsertOutcome::Updated(id) => self.notify(&StoreEvent::Updated(id)),
        }
        Ok(outcome)
    }

    /// Atomically swap the whole collection for a snapshot.
    pub fn replace_all(&self, records: &[Bookmark]) -> Result<usize> {
        let written = self.db.replace_all(records)?;
        self.notify(&StoreEvent::Replaced(written));
        Ok(written)
    }

    /// Attach fetched page metadata to a record without changing any
    /// user-visible field or its modification stamp.
    pub fn set_ogp(&self, id: i64, ogp: &OgpInfo) -> Result<()> {
        match self.db.set_ogp(id, ogp) {
            Ok(()) => {
                self.notify(&StoreEvent::Updated(id));
                Ok(())
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(TsundokuError::BookmarkNotFound(id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn map_constraint(err: rusqlite::Error, url: &str) -> TsundokuError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            TsundokuError::DuplicateUrl(url.to_string())
        }
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingObserver {
        events: Arc<Mutex<Vec<StoreEvent>>>,
    }

    impl StoreObserver for RecordingObserver {
        fn name(&self) -> &str {
            "recording"
        }

        fn on_event(&self, event: &StoreEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn observed_store() -> (BookmarkStore, Arc<Mutex<Vec<StoreEvent>>>) {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        store.subscribe(Box::new(RecordingObserver {
            events: Arc::clone(&events),
        }));
        (store, events)
    }

    fn record(url: &str, title: &str, add_date: i64) -> Bookmark {
        Bookmark::new(url.into(), title.into(), add_date)
    }

    #[test]
    fn test_add_assigns_id_and_notifies() {
        let (store, events) = observed_store();
        let stored = store.add(record("https://a.example/", "a", 1)).unwrap();
        assert_eq!(stored.id, Some(1));
        assert_eq!(*events.lock().unwrap(), vec![StoreEvent::Added(1)]);
    }

    #[test]
    fn test_add_rejects_empty_url() {
        let (store, events) = observed_store();
        let result = store.add(record("", "no url", 1));
        assert!(matches!(result, Err(TsundokuError::InvalidInput(_))));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_add_duplicate_url_is_reported_as_such() {
        let (store, _) = observed_store();
        store.add(record("https://a.example/", "a", 1)).unwrap();
        let err = store
            .add(record("https://a.example/", "again", 2))
            .unwrap_err();
        match err {
            TsundokuError::DuplicateUrl(url) => assert_eq!(url, "https://a.example/"),
            other => panic!("expected DuplicateUrl, got {:?}", other),
        }
    }

    #[test]
    fn test_update_refreshes_last_modified() {
        let (store, events) = observed_store();
        let stored = store.add(record("https://a.example/", "a", 1)).unwrap();
        assert_eq!(stored.last_modified, None);

        let mut edited = stored.clone();
        edited.title = "renamed".into();
        let updated = store.update(edited).unwrap();

        assert!(updated.last_modified.is_some());
        let reread = store.get(updated.id.unwrap()).unwrap().unwrap();
        assert_eq!(reread.title, "renamed");
        assert_eq!(reread.last_modified, updated.last_modified);
        assert_eq!(
            *events.lock().unwrap(),
            vec![StoreEvent::Added(1), StoreEvent::Updated(1)]
        );
    }

    #[test]
    fn test_edit_changes_only_requested_fields() {
        let (store, _) = observed_store();
        let stored = store.add(record("https://a.example/", "a", 1)).unwrap();

        let edited = store
            .edit(stored.id.unwrap(), None, Some("new title"))
            .unwrap();
        assert_eq!(edited.url, "https://a.example/");
        assert_eq!(edited.title, "new title");
    }

    #[test]
    fn test_edit_missing_record() {
        let (store, _) = observed_store();
        assert!(matches!(
            store.edit(404, None, Some("x")),
            Err(TsundokuError::BookmarkNotFound(404))
        ));
    }

    #[test]
    fn test_edit_to_colliding_url_fails() {
        let (store, _) = observed_store();
        store.add(record("https://a.example/", "a", 1)).unwrap();
        let b = store.add(record("https://b.example/", "b", 2)).unwrap();

        let err = store
            .edit(b.id.unwrap(), Some("https://a.example/"), None)
            .unwrap_err();
        assert!(matches!(err, TsundokuError::DuplicateUrl(_)));
    }

    #[test]
    fn test_set_tags_replaces_and_stamps() {
        let (store, _) = observed_store();
        let mut seed = record("https://a.example/", "a", 1);
        seed.tags = vec!["old".into()];
        let stored = store.add(seed).unwrap();

        let tagged = store
            .set_tags(stored.id.unwrap(), vec!["rust".into(), "reading".into()])
            .unwrap();
        assert_eq!(tagged.tags, vec!["rust", "reading"]);
        assert!(tagged.last_modified.is_some());
    }

    #[test]
    fn test_delete_and_missing_delete() {
        let (store, events) = observed_store();
        let stored = store.add(record("https://a.example/", "a", 1)).unwrap();
        let id = stored.id.unwrap();

        store.delete(id).unwrap();
        assert!(store.get(id).unwrap().is_none());
        assert!(matches!(
            store.delete(id),
            Err(TsundokuError::BookmarkNotFound(_))
        ));
        assert_eq!(
            *events.lock().unwrap(),
            vec![StoreEvent::Added(id), StoreEvent::Deleted(id)]
        );
    }

    #[test]
    fn test_clear_reports_count_and_notifies_once() {
        let (store, events) = observed_store();
        store.add(record("https://a.example/", "a", 1)).unwrap();
        store.add(record("https://b.example/", "b", 2)).unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(events.lock().unwrap().last(), Some(&StoreEvent::Cleared));
    }

    #[test]
    fn test_import_records_upserts_and_keeps_file_stamps() {
        let (store, events) = observed_store();
        store.add(record("https://a.example/", "local", 1)).unwrap();

        let mut incoming = record("https://a.example/", "from file", 10);
        incoming.last_modified = Some(20);
        let fresh = record("https://b.example/", "new", 30);

        let written = store.import_records(&[incoming, fresh]).unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.count().unwrap(), 2);

        let a = store.get_by_url("https://a.example/").unwrap().unwrap();
        assert_eq!(a.title, "from file");
        // The file's stamp, not a fresh touch.
        assert_eq!(a.last_modified, Some(20));
        assert_eq!(events.lock().unwrap().last(), Some(&StoreEvent::Imported(2)));
    }

    #[test]
    fn test_upsert_writes_verbatim_without_restamping() {
        let (store, events) = observed_store();
        store.add(record("https://a.example/", "local", 1)).unwrap();

        let mut remote = record("https://a.example/", "remote", 1);
        remote.last_modified = Some(999);
        let outcome = store.upsert(&remote).unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated(1));

        let stored = store.get_by_url("https://a.example/").unwrap().unwrap();
        assert_eq!(stored.title, "remote");
        assert_eq!(stored.last_modified, Some(999));

        let mut fresh = record("https://c.example/", "pulled", 5);
        fresh.last_modified = Some(6);
        let outcome = store.upsert(&fresh).unwrap();
        assert!(matches!(outcome, UpsertOutcome::Inserted(_)));
        assert_eq!(
            events.lock().unwrap().last(),
            Some(&StoreEvent::Added(outcome.id()))
        );
    }

    #[test]
    fn test_replace_all_swaps_snapshot() {
        let (store, events) = observed_store();
        store.add(record("https://old.example/", "old", 1)).unwrap();

        let snapshot = vec![
            record("https://n1.example/", "n1", 2),
            record("https://n2.example/", "n2", 3),
        ];
        assert_eq!(store.replace_all(&snapshot).unwrap(), 2);
        assert!(store.get_by_url("https://old.example/").unwrap().is_none());
        assert_eq!(events.lock().unwrap().last(), Some(&StoreEvent::Replaced(2)));
    }

    #[test]
    fn test_set_ogp_clears_pending_state_only() {
        let (store, _) = observed_store();
        let stored = store.add(record("https://a.example/", "a", 1)).unwrap();
        let id = stored.id.unwrap();
        assert!(stored.needs_enrichment());

        store.set_ogp(id, &OgpInfo::attempted()).unwrap();
        let reread = store.get(id).unwrap().unwrap();
        assert!(!reread.needs_enrichment());
        assert_eq!(reread.last_modified, None);

        assert!(matches!(
            store.set_ogp(404, &OgpInfo::attempted()),
            Err(TsundokuError::BookmarkNotFound(404))
        ));
    }
}
