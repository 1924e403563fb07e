use std::collections::HashSet;
use tsundoku::models::Bookmark;
use tsundoku::store::BookmarkStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    All,
    ByIds,
}

pub struct Selection {
    pub mode: SelectionMode,
    pub records: Vec<Bookmark>,
}

/// Parse index arguments into concrete ids. Accepts single indices,
/// inclusive ranges like `2-5`, and `*` for every record (returned as
/// `None`). Duplicates are dropped, first occurrence wins.
pub fn parse_ids(args: &[String]) -> Result<Option<Vec<i64>>, String> {
    if args.iter().any(|arg| arg == "*") {
        return Ok(None);
    }

    let mut ids = Vec::new();
    for arg in args {
        if let Some((lo, hi)) = arg.split_once('-') {
            let lo: i64 = lo
                .trim()
                .parse()
                .map_err(|_| format!("Invalid range: {}", arg))?;
            let hi: i64 = hi
                .trim()
                .parse()
                .map_err(|_| format!("Invalid range: {}", arg))?;
            if lo > hi {
                return Err(format!("Invalid range: {} (start exceeds end)", arg));
            }
            ids.extend(lo..=hi);
        } else {
            let id: i64 = arg
                .trim()
                .parse()
                .map_err(|_| format!("Invalid index: {}", arg))?;
            ids.push(id);
        }
    }

    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
    Ok(Some(ids))
}

/// Turn index arguments into the records they name. Indices that don't
/// exist are reported and skipped.
pub fn resolve(
    args: &[String],
    store: &BookmarkStore,
) -> Result<Selection, Box<dyn std::error::Error>> {
    match parse_ids(args)? {
        None => Ok(Selection {
            mode: SelectionMode::All,
            records: store.records()?,
        }),
        Some(ids) => {
            let mut records = Vec::new();
            for id in ids {
                match store.get(id)? {
                    Some(rec) => records.push(rec),
                    None => eprintln!("Index {} not found", id),
                }
            }
            Ok(Selection {
                mode: SelectionMode::ByIds,
                records,
            })
        }
    }
}
