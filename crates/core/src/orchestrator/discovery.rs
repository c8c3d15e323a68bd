//! Inbox discovery.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, TimeZone};

/// Batch identifier for a run started at `now`: `YYYYMMDD_HHMMSS`.
pub fn batch_id<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Regular files directly inside `inbox` with a `.zip` extension (any case),
/// oldest modification time first. Equal times are ordered by file name.
pub fn discover_archives(inbox: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found: Vec<(SystemTime, String, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(inbox)? {
        let entry = entry?;
        let path = entry.path();
        if !is_zip(&path) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let name = entry.file_name().to_string_lossy().to_string();
        found.push((modified, name, path));
    }

    found.sort();
    Ok(found.into_iter().map(|(_, _, path)| path).collect())
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}
