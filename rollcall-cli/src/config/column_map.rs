//! Logical field to spreadsheet header mapping

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A field the attendance engine knows about, independent of header naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogicalField {
    CardId,
    StudentId,
    Name,
    Phone,
    Attendance,
    Notes,
    Timestamp,
    Exam,
    Homework,
}

impl LogicalField {
    pub const ALL: [LogicalField; 9] = [
        LogicalField::CardId,
        LogicalField::StudentId,
        LogicalField::Name,
        LogicalField::Phone,
        LogicalField::Attendance,
        LogicalField::Notes,
        LogicalField::Timestamp,
        LogicalField::Exam,
        LogicalField::Homework,
    ];

    /// Key used in the mapping file and as the fallback header
    pub fn key(&self) -> &'static str {
        match self {
            LogicalField::CardId => "card_id",
            LogicalField::StudentId => "student_id",
            LogicalField::Name => "name",
            LogicalField::Phone => "phone",
            LogicalField::Attendance => "attendance",
            LogicalField::Notes => "notes",
            LogicalField::Timestamp => "timestamp",
            LogicalField::Exam => "exam",
            LogicalField::Homework => "homework",
        }
    }

    /// Get display label for prompts and listings
    pub fn label(&self) -> &'static str {
        match self {
            LogicalField::CardId => "Card ID",
            LogicalField::StudentId => "Student ID",
            LogicalField::Name => "Name",
            LogicalField::Phone => "Phone",
            LogicalField::Attendance => "Attendance",
            LogicalField::Notes => "Notes",
            LogicalField::Timestamp => "Timestamp",
            LogicalField::Exam => "Exam",
            LogicalField::Homework => "Homework",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LogicalField {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        LogicalField::ALL
            .into_iter()
            .find(|f| f.key() == key)
            .ok_or_else(|| MappingError::UnknownField(key.to_string()))
    }
}

/// Reasons a column map is rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Field name is not one of the nine logical fields
    UnknownField(String),
    /// Assignment is not of the form `field=header`
    MalformedAssignment(String),
    /// Fields without a header when a complete mapping is required
    Incomplete { missing: Vec<LogicalField> },
    /// Two or more fields point at the same header
    DuplicateHeader {
        header: String,
        fields: Vec<LogicalField>,
    },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::UnknownField(name) => {
                let known: Vec<_> = LogicalField::ALL.iter().map(|f| f.key()).collect();
                write!(
                    f,
                    "unknown field '{}' (expected one of: {})",
                    name,
                    known.join(", ")
                )
            }
            MappingError::MalformedAssignment(raw) => {
                write!(f, "expected field=header, got '{}'", raw)
            }
            MappingError::Incomplete { missing } => {
                let names: Vec<_> = missing.iter().map(|f| f.key()).collect();
                write!(f, "every field must be mapped; missing: {}", names.join(", "))
            }
            MappingError::DuplicateHeader { header, fields } => {
                let names: Vec<_> = fields.iter().map(|f| f.key()).collect();
                write!(
                    f,
                    "each field must map to a unique column; '{}' is used by {}",
                    header,
                    names.join(" and ")
                )
            }
        }
    }
}

impl std::error::Error for MappingError {}

/// Logical field to header mapping as persisted in `column_map.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct ColumnMap {
    entries: BTreeMap<LogicalField, String>,
}

impl TryFrom<BTreeMap<String, String>> for ColumnMap {
    type Error = MappingError;

    fn try_from(raw: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let mut map = ColumnMap::default();
        for (key, header) in raw {
            map.set(key.parse()?, header);
        }
        Ok(map)
    }
}

impl From<ColumnMap> for BTreeMap<String, String> {
    fn from(map: ColumnMap) -> Self {
        map.entries
            .into_iter()
            .map(|(field, header)| (field.key().to_string(), header))
            .collect()
    }
}

impl ColumnMap {
    /// Fields the session store writes back
    const WRITTEN: [LogicalField; 3] = [
        LogicalField::Attendance,
        LogicalField::Notes,
        LogicalField::Timestamp,
    ];

    /// Build from `(field, header)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (LogicalField, S)>,
        S: Into<String>,
    {
        let mut map = ColumnMap::default();
        for (field, header) in pairs {
            map.set(field, header);
        }
        map
    }

    /// Header for a field, falling back to the field's own key when unmapped
    pub fn header_for(&self, field: LogicalField) -> &str {
        match self.entries.get(&field) {
            Some(header) if !header.is_empty() => header,
            _ => field.key(),
        }
    }

    /// Explicitly mapped header, if any
    pub fn get(&self, field: LogicalField) -> Option<&str> {
        self.entries
            .get(&field)
            .map(String::as_str)
            .filter(|h| !h.is_empty())
    }

    /// Map a field to a header; an empty header clears the entry
    pub fn set(&mut self, field: LogicalField, header: impl Into<String>) {
        let header = header.into().trim().to_string();
        if header.is_empty() {
            self.entries.remove(&field);
        } else {
            self.entries.insert(field, header);
        }
    }

    /// Apply a `field=header` assignment
    pub fn assign(&mut self, raw: &str) -> Result<(), MappingError> {
        let (field, header) = raw
            .split_once('=')
            .ok_or_else(|| MappingError::MalformedAssignment(raw.to_string()))?;
        let field: LogicalField = field.parse()?;
        self.set(field, header);
        Ok(())
    }

    /// True when at least one field is mapped
    pub fn is_configured(&self) -> bool {
        self.entries.values().any(|h| !h.is_empty())
    }

    /// Mapped entries in field order
    pub fn entries(&self) -> impl Iterator<Item = (LogicalField, &str)> {
        self.entries
            .iter()
            .filter(|(_, h)| !h.is_empty())
            .map(|(f, h)| (*f, h.as_str()))
    }

    /// Reject any header shared by two fields
    ///
    /// Attendance, notes and timestamp are written on every save, so an
    /// explicit header equal to the fallback key of one of them while it is
    /// unmapped counts as shared too.
    pub fn validate(&self) -> Result<(), MappingError> {
        let mut by_header: BTreeMap<&str, Vec<LogicalField>> = BTreeMap::new();
        for (field, header) in self.entries() {
            by_header.entry(header).or_default().push(field);
        }
        for field in Self::WRITTEN {
            if self.get(field).is_none() {
                if let Some(fields) = by_header.get_mut(field.key()) {
                    fields.push(field);
                }
            }
        }

        match by_header.into_iter().find(|(_, fields)| fields.len() > 1) {
            Some((header, fields)) => Err(MappingError::DuplicateHeader {
                header: header.to_string(),
                fields,
            }),
            None => Ok(()),
        }
    }

    /// Require every field to be mapped, then check uniqueness
    pub fn validate_complete(&self) -> Result<(), MappingError> {
        let missing: Vec<LogicalField> = LogicalField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(MappingError::Incomplete { missing });
        }
        self.validate()
    }

    /// Load from a TOML file; a missing file is an empty map, a map with a
    /// shared header is an error
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No column map at {}, starting empty", path.display());
            return Ok(ColumnMap::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read column map: {}", path.display()))?;
        let map: ColumnMap = toml::from_str(&content)
            .with_context(|| format!("Failed to parse column map: {}", path.display()))?;
        map.validate()
            .with_context(|| format!("Invalid column map: {}", path.display()))?;
        Ok(map)
    }

    /// Validate, then write as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize column map")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write column map: {}", path.display()))?;
        log::info!("Column map saved to {}", path.display());
        Ok(())
    }
}
