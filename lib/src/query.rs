use crate::models::Bookmark;
use chrono::{NaiveDate, NaiveTime};

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Date,
    Title,
}

impl SortBy {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "date" => Some(Self::Date),
            "title" => Some(Self::Title),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// A composed query over the collection: free-text search, creation-date
/// range, exact tag (`None` or an empty string selects all tags), and an
/// ordering. The default is everything, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub search: String,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tag: Option<String>,
}

impl Filter {
    /// Run the query. The input is never mutated; records the predicates
    /// keep are cloned into a fresh, ordered vector.
    pub fn apply(&self, records: &[Bookmark]) -> Vec<Bookmark> {
        let terms = search_terms(&self.search);
        // With both bounds absent there is no date predicate at all. With one
        // bound, the other defaults to the epoch or the far future.
        let range = match (self.start_date, self.end_date) {
            (None, None) => None,
            (start, end) => Some((
                start.map(day_start).unwrap_or(0),
                end.map(day_end).unwrap_or(i64::MAX),
            )),
        };

        let mut kept: Vec<Bookmark> = records
            .iter()
            .filter(|b| {
                matches_terms(b, &terms)
                    && range.map_or(true, |(lo, hi)| (lo..=hi).contains(&b.add_date))
                    && matches_tag(b, self.tag.as_deref())
            })
            .cloned()
            .collect();

        // A stable sort with the comparator reversed for descending order:
        // records that compare equal keep their stored order either way.
        kept.sort_by(|a, b| {
            let ordering = match self.sort_by {
                SortBy::Date => a.add_date.cmp(&b.add_date),
                SortBy::Title => compare_titles(&a.title, &b.title),
            };
            match self.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        kept
    }
}

/// Split a search string into lowercase terms on any Unicode whitespace,
/// the ideographic space included.
fn search_terms(search: &str) -> Vec<String> {
    search
        .split_whitespace()
        .map(|term| term.to_lowercase())
        .collect()
}

/// Every term must appear somewhere in the title, the URL, or a tag.
fn matches_terms(bookmark: &Bookmark, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let title = bookmark.title.to_lowercase();
    let url = bookmark.url.to_lowercase();
    let tags: Vec<String> = bookmark.tags.iter().map(|t| t.to_lowercase()).collect();
    terms.iter().all(|term| {
        title.contains(term) || url.contains(term) || tags.iter().any(|t| t.contains(term))
    })
}

fn matches_tag(bookmark: &Bookmark, tag: Option<&str>) -> bool {
    match tag {
        // An empty selection is the "all tags" choice, not a filter.
        Some(tag) if !tag.is_empty() => bookmark.tags.iter().any(|t| t == tag),
        _ => true,
    }
}

/// Case-insensitive title ordering; ties between distinct spellings break on
/// the raw bytes so the result does not depend on input order.
fn compare_titles(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// First second of the day, UTC.
fn day_start(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Last second of the day, UTC. The range is inclusive at both ends.
fn day_end(date: NaiveDate) -> i64 {
    date.succ_opt()
        .map(|next| day_start(next) - 1)
        .unwrap_or(i64::MAX)
}
