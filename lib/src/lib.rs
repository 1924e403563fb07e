pub mod browser;
pub mod config;
pub mod db;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod import_export;
pub mod models;
pub mod query;
pub mod store;
pub mod sync;
pub mod tags;
pub mod utils;

// Re-export error types for convenience
pub use error::TsundokuError;
