use crate::fetch_ui::{fetch_with_spinner, refresh_with_progress};
use crate::format::OutputFormat;
use crate::selection::{self, SelectionMode};
use crate::tag_ops::{apply_tag_operations, parse_tag_operations};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use tsundoku::config::Config;
use tsundoku::enrich::EnrichOptions;
use tsundoku::fetch::HttpFetcher;
use tsundoku::models::{Bookmark, OgpInfo};
use tsundoku::query::{Filter, SortBy, SortOrder};
use tsundoku::store::BookmarkStore;
use tsundoku::sync::{JsonFileRemote, SyncStatus};
use tsundoku::{browser, import_export, sync, utils};

fn get_exe_name() -> &'static str {
    static EXE_NAME: OnceLock<String> = OnceLock::new();
    EXE_NAME.get_or_init(|| {
        let argv0 = std::env::args().next();
        argv0
            .as_deref()
            .map(std::path::Path::new)
            .and_then(|p| p.file_name()?.to_str())
            .unwrap_or("tsundoku")
            .to_string()
    })
}

#[derive(Parser)]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Print the version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Use this database file instead of the default
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Use this configuration file instead of the default
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub nc: bool,

    /// Enable debug logging
    #[arg(short = 'g', long = "debug")]
    pub debug: bool,

    /// Output format: colored (default), plain, json
    #[arg(short = 'f', long)]
    pub format: Option<String>,

    /// Open the first matching bookmark in the browser
    #[arg(short = 'o', long)]
    pub open: bool,

    /// Show at most this many results
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Keywords to search for when no subcommand is given
    #[arg(name = "KEYWORD")]
    pub keywords: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new bookmark
    Add {
        /// Address of the page to save
        url: String,

        /// Tags, comma separated (the flag may repeat)
        #[arg(short, long, value_delimiter = ',')]
        tag: Option<Vec<String>>,

        /// Bookmark title (fetched from the page when omitted)
        #[arg(long)]
        title: Option<String>,

        /// Add without connecting to the web
        #[arg(long)]
        offline: bool,
    },

    /// List bookmarks, newest first
    List {
        /// Keywords matched against title, URL and tags (all must match)
        keywords: Vec<String>,

        /// Sort key: date (default) or title
        #[arg(long)]
        sort: Option<String>,

        /// Sort direction: desc (default) or asc
        #[arg(long)]
        order: Option<String>,

        /// Only bookmarks added on or after this day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only bookmarks added on or before this day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only bookmarks carrying exactly this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// List tags, or bookmarks carrying the given tags
    Tag {
        /// Tags to filter by (exact match, all must be present)
        #[arg(num_args = 0..)]
        tags: Vec<String>,
    },

    /// Edit an existing bookmark
    Edit {
        /// Bookmark index
        id: i64,

        /// New URL
        #[arg(long)]
        url: Option<String>,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// Tag operations (supports: +add, -remove, ~old:new, or plain tag to add)
        /// Examples: +urgent, -archived, ~todo:done
        #[arg(short, long)]
        tag: Option<Vec<String>>,
    },

    /// Delete bookmark(s)
    Delete {
        /// Bookmark indices, ranges (e.g., 1-5), or * for all
        #[arg(num_args = 0..)]
        ids: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Import bookmarks from a Netscape bookmark HTML file
    Import {
        /// File path to import from
        file: String,
    },

    /// Export bookmarks to a file (.html or .json)
    Export {
        /// File path to export to
        file: String,
    },

    /// Fetch page metadata for bookmarks that don't have it yet
    Refresh,

    /// Merge the local collection with a remote one (last write wins)
    Sync {
        /// Remote JSON document (defaults to remote_path from the config)
        #[arg(long)]
        remote: Option<PathBuf>,
    },

    /// Write every local bookmark to the remote
    Push {
        /// Remote JSON document (defaults to remote_path from the config)
        #[arg(long)]
        remote: Option<PathBuf>,
    },

    /// Replace the local collection with the remote one
    Pull {
        /// Remote JSON document (defaults to remote_path from the config)
        #[arg(long)]
        remote: Option<PathBuf>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Open bookmark(s) in the browser
    Open {
        /// Bookmark indices or ranges to open
        #[arg(num_args = 0..)]
        ids: Vec<String>,
    },
}

pub fn handle_args(
    cli: Cli,
    store: &BookmarkStore,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Some(Commands::Add {
            url,
            tag,
            title,
            offline,
        }) => {
            let tags = tag.unwrap_or_default();
            if let Some(bad) = tags.iter().find(|t| t.contains(' ')) {
                return Err(
                    format!("Tag '{}' contains spaces. Tags cannot contain spaces.", bad).into(),
                );
            }

            let ogp = if !offline {
                match fetch_with_spinner(&url, &config.user_agent) {
                    Ok(ogp) => Some(ogp),
                    Err(e) => {
                        eprintln!("Warning: Failed to fetch metadata: {}", e);
                        eprintln!("Saving without metadata...");
                        Some(OgpInfo::attempted())
                    }
                }
            } else {
                None
            };

            let final_title = title
                .or_else(|| ogp.as_ref().and_then(|o| o.title.clone()))
                .unwrap_or_else(|| url.clone());

            let mut record = Bookmark::new(url, final_title, utils::now_secs());
            record.tags = tags;
            record.image = ogp.as_ref().and_then(|o| o.image.clone());
            record.ogp = ogp;

            let added = store.add(record)?;
            if let Some(id) = added.id {
                eprintln!("Added bookmark at index {}", id);
            }
        }

        Some(Commands::List {
            keywords,
            sort,
            order,
            from,
            to,
            tag,
        }) => {
            let filter = Filter {
                search: keywords.join(" "),
                sort_by: sort.as_deref().and_then(SortBy::from_string).unwrap_or_default(),
                sort_order: order
                    .as_deref()
                    .and_then(SortOrder::from_string)
                    .unwrap_or_default(),
                start_date: from.as_deref().map(parse_date).transpose()?,
                end_date: to.as_deref().map(parse_date).transpose()?,
                tag,
            };

            let records = store.records()?;
            show_records(
                filter.apply(&records),
                cli.limit,
                cli.open,
                cli.format.as_deref(),
                cli.nc,
            )?;
        }

        Some(Commands::Tag { tags }) => {
            if tags.is_empty() {
                let records = store.records()?;
                let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                for rec in &records {
                    for tag in &rec.tags {
                        *counts.entry(tag.clone()).or_insert(0) += 1;
                    }
                }
                if counts.is_empty() {
                    eprintln!("No tags found.");
                } else {
                    for (tag, count) in counts {
                        println!("{} ({})", tag, count);
                    }
                }
            } else {
                let mut records = store.records()?;
                records.retain(|rec| tags.iter().all(|t| rec.tags.iter().any(|rt| rt == t)));
                if records.is_empty() {
                    eprintln!("No bookmarks found with the specified tags.");
                    return Ok(());
                }
                show_records(
                    Filter::default().apply(&records),
                    cli.limit,
                    cli.open,
                    cli.format.as_deref(),
                    cli.nc,
                )?;
            }
        }

        Some(Commands::Edit {
            id,
            url,
            title,
            tag,
        }) => {
            let tag_operations = tag.as_ref().map(|specs| parse_tag_operations(specs));
            let has_field_edits = url.is_some() || title.is_some();
            let has_tag_edits = tag_operations
                .as_ref()
                .map_or(false, |ops| !ops.is_empty());

            if !has_field_edits && !has_tag_edits {
                eprintln!(
                    "Usage: {} edit <ID> [--url URL] [--title TITLE] [--tag OP]...",
                    get_exe_name()
                );
                eprintln!("Tag operations: +add, -remove, ~old:new (a plain tag adds)");
                return Err("No edit options specified".into());
            }

            if has_field_edits {
                store.edit(id, url.as_deref(), title.as_deref())?;
            }

            if let Some(ops) = tag_operations {
                if !ops.is_empty() {
                    let record = store
                        .get(id)?
                        .ok_or_else(|| format!("Bookmark {} not found", id))?;
                    let new_tags = apply_tag_operations(&record.tags, &ops);
                    store.set_tags(id, new_tags)?;
                }
            }

            eprintln!("✓ Updated bookmark {}", id);
        }

        Some(Commands::Delete { ids, force }) => {
            if ids.is_empty() {
                eprintln!("Usage: {} delete <ID|RANGE|*> [--force]", get_exe_name());
                return Err("No bookmark IDs specified".into());
            }

            let selection = selection::resolve(&ids, store)?;
            if selection.records.is_empty() {
                eprintln!("No bookmarks to delete.");
                return Ok(());
            }

            match selection.mode {
                SelectionMode::All => eprintln!("⚠️  DELETE ALL BOOKMARKS:"),
                SelectionMode::ByIds => eprintln!("Bookmarks to be deleted:"),
            }
            for rec in &selection.records {
                if let Some(id) = rec.id {
                    eprintln!("  {}. {} - {}", id, rec.display_title(), rec.url);
                }
            }

            let confirmed = if force {
                true
            } else {
                let prompt = match selection.mode {
                    SelectionMode::All => format!(
                        "\n⚠️  DELETE ALL {} bookmark(s)? [y/N]: ",
                        selection.records.len()
                    ),
                    SelectionMode::ByIds => {
                        format!("\nDelete {} bookmark(s)? [y/N]: ", selection.records.len())
                    }
                };
                confirm(&prompt)?
            };

            if confirmed {
                let mut count = 0;
                for rec in &selection.records {
                    if let Some(id) = rec.id {
                        store.delete(id)?;
                        count += 1;
                    }
                }
                eprintln!("Deleted {} bookmark(s).", count);
            } else {
                eprintln!("Deletion cancelled.");
            }
        }

        Some(Commands::Import { file }) => {
            let report = import_export::import_bookmarks(store, &file)?;
            if report.skipped > 0 {
                eprintln!(
                    "✓ Imported {} bookmark(s) from {} ({} skipped)",
                    report.imported, file, report.skipped
                );
            } else {
                eprintln!("✓ Imported {} bookmark(s) from {}", report.imported, file);
            }
        }

        Some(Commands::Export { file }) => {
            import_export::export_bookmarks(store, &file)?;
            eprintln!("Exported bookmarks to {}", file);
        }

        Some(Commands::Refresh) => {
            let fetcher = HttpFetcher::new(&config.user_agent)?;
            let opts = EnrichOptions::from_config(config);
            let report = refresh_with_progress(store, &fetcher, &opts)?;

            if report.pending == 0 {
                eprintln!("All bookmarks already have metadata.");
            } else {
                if report.enriched > 0 {
                    eprintln!("✓ Refreshed metadata for {} bookmark(s)", report.enriched);
                }
                if report.failed > 0 {
                    eprintln!("✗ Failed to fetch {} page(s)", report.failed);
                }
            }
        }

        Some(Commands::Sync { remote }) => {
            let remote = remote_from(remote, config)?;
            eprintln!("Sync status: {}", SyncStatus::Syncing);
            let outcome = sync::merge(store, &remote)?;
            eprintln!(
                "✓ Sync complete: {} record(s) total, {} pushed, {} pulled, {} refreshed",
                outcome.unified.len(),
                outcome.pushed,
                outcome.pulled,
                outcome.refreshed
            );
            for failure in &outcome.failures {
                eprintln!("✗ {}: {}", failure.url, failure.reason);
            }
            let status = if outcome.had_failures() {
                SyncStatus::Error
            } else {
                SyncStatus::Synced
            };
            eprintln!("Sync status: {}", status);
            if outcome.had_failures() {
                return Err(format!(
                    "{} record(s) could not be pushed",
                    outcome.failures.len()
                )
                .into());
            }
        }

        Some(Commands::Push { remote }) => {
            let remote = remote_from(remote, config)?;
            let outcome = sync::push_all(store, &remote)?;
            eprintln!("✓ Pushed {} bookmark(s) to remote", outcome.pushed);
            for failure in &outcome.failures {
                eprintln!("✗ {}: {}", failure.url, failure.reason);
            }
            if !outcome.failures.is_empty() {
                return Err(format!(
                    "{} record(s) could not be pushed",
                    outcome.failures.len()
                )
                .into());
            }
        }

        Some(Commands::Pull { remote, force }) => {
            let remote = remote_from(remote, config)?;
            let local_count = store.count()?;

            let confirmed = if force || local_count == 0 {
                true
            } else {
                confirm(&format!(
                    "Replace all {} local bookmark(s) with the remote copy? [y/N]: ",
                    local_count
                ))?
            };

            if confirmed {
                let count = sync::apply_remote_snapshot(store, &remote)?;
                eprintln!("✓ Pulled {} bookmark(s) from remote", count);
            } else {
                eprintln!("Pull cancelled.");
            }
        }

        Some(Commands::Open { ids }) => {
            if ids.is_empty() {
                eprintln!("Usage: {} open <ID|RANGE>...", get_exe_name());
                return Err("No bookmark IDs specified".into());
            }
            let selection = selection::resolve(&ids, store)?;
            for rec in &selection.records {
                eprintln!("Opening: {}", rec.url);
                browser::open_url(&rec.url)?;
            }
        }

        None => {
            // No subcommand: treat the bare keywords as a search
            let filter = Filter {
                search: cli.keywords.join(" "),
                ..Filter::default()
            };
            let records = store.records()?;
            show_records(
                filter.apply(&records),
                cli.limit,
                cli.open,
                cli.format.as_deref(),
                cli.nc,
            )?;
        }
    }

    Ok(())
}

fn show_records(
    mut records: Vec<Bookmark>,
    limit: Option<usize>,
    open_first: bool,
    format: Option<&str>,
    no_color: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if records.is_empty() {
        eprintln!("No bookmarks found.");
        return Ok(());
    }

    if let Some(limit) = limit {
        records.truncate(limit);
    }

    if open_first {
        if let Some(first) = records.first() {
            eprintln!("Opening: {}", first.url);
            browser::open_url(&first.url)?;
            return Ok(());
        }
    }

    let format = format
        .map(OutputFormat::from_string)
        .unwrap_or(OutputFormat::Colored);
    format.print_bookmarks(&records, no_color);
    Ok(())
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}' (expected YYYY-MM-DD)", value))
}

fn remote_from(
    remote: Option<PathBuf>,
    config: &Config,
) -> Result<JsonFileRemote, Box<dyn std::error::Error>> {
    let path = remote.or_else(|| config.remote_path.clone()).ok_or(
        "No remote configured. Pass --remote <FILE> or set remote_path in the config file",
    )?;
    Ok(JsonFileRemote::new(path))
}

fn confirm(prompt: &str) -> Result<bool, Box<dyn std::error::Error>> {
    use std::io::{self, Write};

    print!("{}", prompt);
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    let response = response.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
