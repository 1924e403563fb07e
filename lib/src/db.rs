use crate::models::bookmark::{Bookmark, OgpInfo};
use crate::tags::{parse_tags, wrap_tags};
use rusqlite::{Connection, Result, Row};
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: i32 = 1;

/// Result of an upsert: either a fresh row or an overwrite of the row that
/// already held the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Updated(i64),
}

impl UpsertOutcome {
    pub fn id(&self) -> i64 {
        match self {
            Self::Inserted(id) | Self::Updated(id) => *id,
        }
    }
}

pub struct TsunDb {
    conn: Connection,
    db_path: PathBuf,
}

impl TsunDb {
    pub fn init_in_memory() -> Result<Self> {
        Self::from_conn(Connection::open_in_memory()?, PathBuf::from(":memory:"))
    }

    pub fn init(db_path: &Path) -> Result<Self> {
        Self::from_conn(Connection::open(db_path)?, db_path.to_path_buf())
    }

    fn from_conn(conn: Connection, db_path: PathBuf) -> Result<Self> {
        let db = Self { conn, db_path };
        db.setup_tables()?;
        Ok(db)
    }

    /// Get the database file path
    pub fn get_path(&self) -> &Path {
        &self.db_path
    }

    fn setup_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE if not exists bookmarks (
                id integer PRIMARY KEY,
                url text NOT NULL UNIQUE,
                title text NOT NULL default '',
                add_date integer NOT NULL default 0,
                last_modified integer default NULL,
                icon text default NULL,
                tags text NOT NULL default ',',
                image text default NULL,
                ogp text default NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_url ON bookmarks(url)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_add_date ON bookmarks(add_date)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_title ON bookmarks(title)",
            [],
        )?;

        self.conn
            .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn add_rec(&self, bookmark: &Bookmark) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO bookmarks (url, title, add_date, last_modified, icon, tags, image, ogp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                &bookmark.url,
                &bookmark.title,
                bookmark.add_date,
                bookmark.last_modified,
                bookmark.icon.as_deref(),
                wrap_tags(&bookmark.tags),
                bookmark.image.as_deref(),
                ogp_to_sql(&bookmark.ogp)?,
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_rec_by_id(&self, id: i64) -> Result<Option<Bookmark>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, add_date, last_modified, icon, tags, image, ogp
             FROM bookmarks WHERE id = ?1",
        )?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_bookmark(row)?)),
            None => Ok(None),
        }
    }

    pub fn get_rec_by_url(&self, url: &str) -> Result<Option<Bookmark>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, add_date, last_modified, icon, tags, image, ogp
             FROM bookmarks WHERE url = ?1",
        )?;
        let mut rows = stmt.query([url])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_bookmark(row)?)),
            None => Ok(None),
        }
    }

    /// All records in insertion order (rowid order).
    pub fn get_rec_all(&self) -> Result<Vec<Bookmark>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, add_date, last_modified, icon, tags, image, ogp
             FROM bookmarks ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| row_to_bookmark(row))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Overwrite the row identified by `bookmark.id` with every field of the
    /// given record.
    pub fn update_rec(&self, bookmark: &Bookmark) -> Result<()> {
        let id = bookmark.id.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let changed = self.conn.execute(
            "UPDATE bookmarks
             SET url = ?1, title = ?2, add_date = ?3, last_modified = ?4,
                 icon = ?5, tags = ?6, image = ?7, ogp = ?8
             WHERE id = ?9",
            (
                &bookmark.url,
                &bookmark.title,
                bookmark.add_date,
                bookmark.last_modified,
                bookmark.icon.as_deref(),
                wrap_tags(&bookmark.tags),
                bookmark.image.as_deref(),
                ogp_to_sql(&bookmark.ogp)?,
                id,
            ),
        )?;
        if changed == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    /// Insert the record, or overwrite the existing row holding its URL. The
    /// row keeps its id across overwrites; any id on the incoming record is
    /// ignored.
    pub fn upsert_rec(&self, bookmark: &Bookmark) -> Result<UpsertOutcome> {
        upsert_on(&self.conn, bookmark)
    }

    /// Upsert a batch inside one transaction; a later record wins over an
    /// earlier one with the same URL.
    pub fn bulk_put(&self, records: &[Bookmark]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for record in records {
            upsert_on(&tx, record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Replace the page-metadata column only; every user-visible field is
    /// left untouched.
    pub fn set_ogp(&self, id: i64, ogp: &OgpInfo) -> Result<()> {
        let json = serde_json::to_string(ogp)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let changed = self
            .conn
            .execute("UPDATE bookmarks SET ogp = ?1 WHERE id = ?2", (json, id))?;
        if changed == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    pub fn delete_rec(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(rusqlite::Error::QueryReturnedNoRows);
        }
        Ok(())
    }

    /// Delete every record, returning how many there were.
    pub fn clear(&self) -> Result<usize> {
        self.conn.execute("DELETE FROM bookmarks", [])
    }

    /// Atomically swap the whole collection for `records`: either the new
    /// set is fully in place or the old one is untouched.
    pub fn replace_all(&self, records: &[Bookmark]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM bookmarks", [])?;
        for record in records {
            tx.execute(
                "INSERT INTO bookmarks (url, title, add_date, last_modified, icon, tags, image, ogp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                (
                    &record.url,
                    &record.title,
                    record.add_date,
                    record.last_modified,
                    record.icon.as_deref(),
                    wrap_tags(&record.tags),
                    record.image.as_deref(),
                    ogp_to_sql(&record.ogp)?,
                ),
            )?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn upsert_on(conn: &Connection, bookmark: &Bookmark) -> Result<UpsertOutcome> {
    let existing: Option<i64> = {
        let mut stmt = conn.prepare("SELECT id FROM bookmarks WHERE url = ?1")?;
        let mut rows = stmt.query([&bookmark.url])?;
        match rows.next()? {
            Some(row) => Some(row.get(0)?),
            None => None,
        }
    };

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE bookmarks
                 SET title = ?1, add_date = ?2, last_modified = ?3,
                     icon = ?4, tags = ?5, image = ?6, ogp = ?7
                 WHERE id = ?8",
                (
                    &bookmark.title,
                    bookmark.add_date,
                    bookmark.last_modified,
                    bookmark.icon.as_deref(),
                    wrap_tags(&bookmark.tags),
                    bookmark.image.as_deref(),
                    ogp_to_sql(&bookmark.ogp)?,
                    id,
                ),
            )?;
            Ok(UpsertOutcome::Updated(id))
        }
        None => {
            conn.execute(
                "INSERT INTO bookmarks (url, title, add_date, last_modified, icon, tags, image, ogp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                (
                    &bookmark.url,
                    &bookmark.title,
                    bookmark.add_date,
                    bookmark.last_modified,
                    bookmark.icon.as_deref(),
                    wrap_tags(&bookmark.tags),
                    bookmark.image.as_deref(),
                    ogp_to_sql(&bookmark.ogp)?,
                ),
            )?;
            Ok(UpsertOutcome::Inserted(conn.last_insert_rowid()))
        }
    }
}

fn row_to_bookmark(row: &Row) -> Result<Bookmark> {
    let tags: String = row.get(6)?;
    let ogp: Option<String> = row.get(8)?;
    Ok(Bookmark {
        id: Some(row.get(0)?),
        url: row.get(1)?,
        title: row.get(2)?,
        add_date: row.get(3)?,
        last_modified: row.get(4)?,
        icon: row.get(5)?,
        tags: parse_tags(&tags),
        image: row.get(7)?,
        // A corrupt metadata blob degrades to "not enriched yet".
        ogp: ogp.and_then(|json| serde_json::from_str(&json).ok()),
    })
}

fn ogp_to_sql(ogp: &Option<OgpInfo>) -> Result<Option<String>> {
    match ogp {
        Some(info) => serde_json::to_string(info)
            .map(Some)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e))),
        None => Ok(None),
    }
}
