mod cli;
mod fetch_ui;
mod format;
mod output;
mod selection;
mod tag_ops;

use clap::Parser;
use tsundoku::{config, store, utils};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::Cli::parse();

    // Initialize logger
    let mut builder = env_logger::Builder::from_default_env();
    if args.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    if args.version {
        println!("tsundoku {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| utils::get_default_dbdir().join("bookmarks.db"));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = store::BookmarkStore::open(&db_path)?;

    // Load configuration
    let cfg = if let Some(config_path) = &args.config {
        config::Config::load_from_path(config_path)?
    } else {
        config::Config::load()
    };

    cli::handle_args(args, &store, &cfg)?;

    Ok(())
}
