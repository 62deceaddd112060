//! Roster import and session creation

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use super::store::SessionStore;
use super::types::normalize_card;
use crate::config::{App, ColumnMap, LogicalField};
use crate::store::{self, Table, clean_value};

/// Reasons a session cannot be set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// Roster import needs at least one mapped column
    MappingNotConfigured,
    MissingStage,
    MissingCenter,
    /// Session number is empty or not a plain number
    InvalidNumber(String),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::MappingNotConfigured => write!(
                f,
                "no column mapping configured; run 'rollcall mapping set' first"
            ),
            SetupError::MissingStage => write!(f, "a stage is required"),
            SetupError::MissingCenter => write!(f, "a center is required"),
            SetupError::InvalidNumber(raw) => {
                write!(f, "session number must be numeric, got '{}'", raw)
            }
        }
    }
}

impl std::error::Error for SetupError {}

/// Name of a session: stage, center and running number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionName {
    stage: String,
    center: String,
    number: u32,
}

impl SessionName {
    pub fn new(stage: &str, center: &str, number: &str) -> Result<Self, SetupError> {
        let stage = stage.trim();
        let center = center.trim();
        let number = number.trim();
        if stage.is_empty() {
            return Err(SetupError::MissingStage);
        }
        if center.is_empty() {
            return Err(SetupError::MissingCenter);
        }
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(SetupError::InvalidNumber(number.to_string()));
        }
        let number = number
            .parse()
            .map_err(|_| SetupError::InvalidNumber(number.to_string()))?;

        Ok(SessionName {
            stage: stage.to_string(),
            center: center.to_string(),
            number,
        })
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} session {}", self.stage, self.center, self.number)
    }
}

/// Load a roster file and prepare it for a new session
pub fn import_roster(path: &Path, column_map: &ColumnMap) -> Result<Table> {
    if !column_map.is_configured() {
        return Err(SetupError::MappingNotConfigured.into());
    }
    let mut table = store::load(path)
        .with_context(|| format!("Failed to import roster: {}", path.display()))?;
    prepare_roster(&mut table, column_map);
    log::info!("Imported {} roster rows from {}", table.len(), path.display());
    Ok(table)
}

/// Fill blank card ids with `null N`, pad numeric ones, and clear the
/// attendance and timestamp columns
pub fn prepare_roster(table: &mut Table, column_map: &ColumnMap) {
    if let Some(col) = table.column_index(column_map.header_for(LogicalField::CardId)) {
        let mut blanks = 0;
        for row in 0..table.len() {
            let raw = clean_value(&table.rows()[row][col]);
            let card_id = if raw.is_empty() {
                blanks += 1;
                format!("null {}", blanks)
            } else {
                normalize_card(&raw)
            };
            table.set_cell(row, col, card_id);
        }
        if blanks > 0 {
            log::warn!("{} roster rows had no card id", blanks);
        }
    }

    for field in [LogicalField::Attendance, LogicalField::Timestamp] {
        if let Some(col) = table.column_index(column_map.header_for(field)) {
            for row in 0..table.len() {
                table.set_cell(row, col, "");
            }
        }
    }
}

/// Bind a session name to its file, writing the roster only for a new file
///
/// Returns the store and whether the file was created.
pub fn create_or_open(app: &App, name: &SessionName, roster: &Table) -> Result<(SessionStore, bool)> {
    let name = name.to_string();
    let path = app.paths.session_file(&name, app.settings.file_type);

    let created = !path.exists();
    if created {
        store::save(roster, &path)
            .with_context(|| format!("Failed to create session file: {}", path.display()))?;
        log::info!("Created session '{}' at {}", name, path.display());
    } else {
        log::info!("Resuming existing session '{}'", name);
    }

    let session = SessionStore::new(
        name,
        path,
        app.column_map.clone(),
        app.settings.restrictions,
    );
    Ok((session, created))
}
