//! Application configuration: data locations, settings and the column map
//!
//! Everything is owned by an explicit [`App`] value that commands borrow;
//! settings and the column map are only written through `save`.

pub mod column_map;
pub mod repository;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use column_map::{ColumnMap, LogicalField, MappingError};

use crate::store::FileType;

/// Environment variable overriding the data directory
pub const HOME_ENV: &str = "ROLLCALL_HOME";

const SESSIONS_DIR: &str = "sessions";
const ARCHIVE_DIR: &str = "archive";
const SETTINGS_FILE: &str = "settings.toml";
const COLUMN_MAP_FILE: &str = "column_map.toml";

/// On-disk layout under the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    base: PathBuf,
}

impl Paths {
    /// Use an explicit base directory
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Paths { base: base.into() }
    }

    /// Resolve the base directory: explicit override, then `ROLLCALL_HOME`,
    /// then the platform data directory
    pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = override_dir {
            return Ok(Paths::new(dir));
        }
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Paths::new(dir));
        }
        let data_dir = dirs::data_dir()
            .context("Could not determine a data directory; set ROLLCALL_HOME or pass --data-dir")?;
        Ok(Paths::new(data_dir.join("rollcall")))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.base.join(SESSIONS_DIR)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.base.join(ARCHIVE_DIR)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.archive_dir().join(SETTINGS_FILE)
    }

    pub fn column_map_file(&self) -> PathBuf {
        self.archive_dir().join(COLUMN_MAP_FILE)
    }

    /// Session file path for a session name and format
    pub fn session_file(&self, name: &str, file_type: FileType) -> PathBuf {
        self.sessions_dir()
            .join(format!("{}.{}", name, file_type.extension()))
    }

    /// Create the sessions and archive folders
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.sessions_dir(), self.archive_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Which grade requirements gate an `ok` scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restrictions {
    #[serde(default)]
    pub exam: bool,
    #[serde(default)]
    pub homework: bool,
}

impl Default for Restrictions {
    fn default() -> Self {
        Restrictions {
            exam: true,
            homework: true,
        }
    }
}

impl Restrictions {
    /// No requirement enforced
    pub fn none() -> Self {
        Restrictions {
            exam: false,
            homework: false,
        }
    }
}

/// User-editable settings persisted in `settings.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Ordered stage labels offered when starting a session
    pub stage_options: Vec<String>,
    /// Ordered center labels offered when starting a session
    pub center_options: Vec<String>,
    /// Format for newly created session files
    pub file_type: FileType,
    pub restrictions: Restrictions,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            stage_options: vec!["2nd".into(), "3rd".into()],
            center_options: [
                "October",
                "Ferdous",
                "Helwan",
                "Hadayek Helwan",
                "Zayed",
                "Haram",
                "Dokki",
                "Maadi",
                "15 May",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            file_type: FileType::Xlsx,
            restrictions: Restrictions::default(),
        }
    }
}

impl AppSettings {
    /// Load from TOML; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(AppSettings::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Append a label if it is new; returns false for blanks and repeats
    pub fn add_option(options: &mut Vec<String>, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || options.iter().any(|o| o == label) {
            return false;
        }
        options.push(label.to_string());
        true
    }

    /// Remove a label; returns false when it was not present
    pub fn remove_option(options: &mut Vec<String>, label: &str) -> bool {
        let before = options.len();
        options.retain(|o| o != label.trim());
        options.len() != before
    }
}

/// Top-level application context
#[derive(Debug, Clone)]
pub struct App {
    pub paths: Paths,
    pub settings: AppSettings,
    pub column_map: ColumnMap,
}

impl App {
    /// Prepare folders and load settings and column map
    pub fn load(paths: Paths) -> Result<Self> {
        paths.ensure_dirs()?;
        let settings = AppSettings::load(&paths.settings_file())?;
        let column_map = ColumnMap::load(&paths.column_map_file())?;
        log::debug!("Using data directory {}", paths.base().display());
        Ok(App {
            paths,
            settings,
            column_map,
        })
    }

    pub fn save_settings(&self) -> Result<()> {
        self.settings.save(&self.paths.settings_file())
    }

    pub fn save_column_map(&self) -> Result<()> {
        self.column_map.save(&self.paths.column_map_file())
    }
}
