//! Session file listing and cleanup

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::store::FileType;

/// Number of sessions shown as "recent"
pub const RECENT_LIMIT: usize = 10;

/// A session file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// File stem, which is the session name
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

impl SessionEntry {
    /// Modified time as shown in listings, e.g. `04 Mar 2025 17:20`
    pub fn modified_label(&self) -> String {
        let local: DateTime<Local> = self.modified.into();
        local.format("%d %b %Y %H:%M").to_string()
    }
}

/// A file that could not be removed by [`clear_sessions`]
#[derive(Debug)]
pub struct ClearFailure {
    pub path: PathBuf,
    pub error: std::io::Error,
}

/// All csv/xlsx files in the sessions folder, newest first
pub fn list_sessions(dir: &Path) -> Result<Vec<SessionEntry>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    let read_dir = fs::read_dir(dir)
        .with_context(|| format!("Failed to list sessions in {}", dir.display()))?;

    for entry in read_dir {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() || FileType::from_path(&path).is_err() {
            continue;
        }

        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Hidden partial writes are not sessions
        if name.starts_with('.') {
            continue;
        }

        entries.push(SessionEntry {
            name,
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            size: metadata.len(),
            path,
        });
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

/// The most recently modified sessions
pub fn recent_sessions(dir: &Path) -> Result<Vec<SessionEntry>> {
    let mut entries = list_sessions(dir)?;
    entries.truncate(RECENT_LIMIT);
    Ok(entries)
}

/// Find a session by name (file stem)
pub fn find_session(dir: &Path, name: &str) -> Result<Option<SessionEntry>> {
    Ok(list_sessions(dir)?.into_iter().find(|e| e.name == name))
}

/// Delete every session file, collecting failures instead of stopping
pub fn clear_sessions(dir: &Path) -> Result<(usize, Vec<ClearFailure>)> {
    let mut removed = 0;
    let mut failures = Vec::new();

    for entry in list_sessions(dir)? {
        match fs::remove_file(&entry.path) {
            Ok(()) => removed += 1,
            Err(error) => {
                log::warn!("Failed to delete {}: {}", entry.path.display(), error);
                failures.push(ClearFailure {
                    path: entry.path,
                    error,
                });
            }
        }
    }

    log::info!("Cleared {} session files", removed);
    Ok((removed, failures))
}

/// Human-readable file size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}
