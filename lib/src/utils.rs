use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn get_default_dbdir() -> PathBuf {
    if let Ok(path) = std::env::var("TSUNDOKU_DEFAULT_DBDIR") {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(path).join("tsundoku");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/share/tsundoku");
    }

    #[cfg(target_os = "windows")]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join("tsundoku");
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn get_config_dir() -> PathBuf {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(path).join("tsundoku");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config/tsundoku");
    }

    #[cfg(target_os = "windows")]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join("tsundoku");
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Current wall-clock time as Unix seconds
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
