//! Date-partitioned directory layout.
//!
//! Done, work and failed roots are split by year; logs by year and month.
//! The layout is resolved per batch run so long-lived processes roll over.

use chrono::{DateTime, Datelike, TimeZone};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::PathsConfig;

/// Concrete directories for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayout {
    pub inbox: PathBuf,
    pub done: PathBuf,
    pub work: PathBuf,
    pub failed: PathBuf,
    pub log: PathBuf,
}

impl DirectoryLayout {
    /// Resolves the partitions for the given moment.
    pub fn resolve<Tz: TimeZone>(paths: &PathsConfig, now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let year = now.format("%Y").to_string();
        Self {
            inbox: paths.inbox_dir.clone(),
            done: paths.done_dir.join(&year),
            work: paths.work_dir.join(&year),
            failed: paths.failed_root().join(&year),
            log: log_partition(&paths.log_dir, now),
        }
    }

    /// Creates every directory in the layout.
    pub fn ensure(&self) -> io::Result<()> {
        for dir in [&self.inbox, &self.done, &self.work, &self.failed, &self.log] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// `<root>/YYYY/MM_MonthName`, e.g. `logs/2026/02_February`.
pub fn log_partition<Tz: TimeZone>(root: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    root.join(now.year().to_string())
        .join(format!("{:02}_{}", now.month(), now.format("%B")))
}
