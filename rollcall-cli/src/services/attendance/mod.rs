// Attendance service
//
// Holds the records of an active run, applies operator actions and
// commits each change to the session file as it happens.

pub mod run;
pub mod summary;

use std::fmt;

use crate::services::scan::{ScanAction, ScanStatus};
use crate::session::StudentRecord;

pub use run::{AttendanceRun, ScanReport};
pub use summary::SessionSummary;

/// Notes written for a student added by hand when none are given
pub const DEFAULT_MANUAL_NOTE: &str = "manual addition";

/// Reasons an attendance action is refused or fails
#[derive(Debug)]
pub enum AttendanceError {
    /// Session was opened for viewing only
    ReadOnly,
    /// Student is already marked as attending
    AlreadyAttended { name: String },
    /// Action is not offered for the record's current status
    ActionNotAvailable { action: ScanAction, status: ScanStatus },
    /// No record at this index
    UnknownRecord(usize),
    /// Required manual-entry fields left blank
    IncompleteStudent { missing: Vec<&'static str> },
    /// Student id or phone already present in the session file
    DuplicateStudent { student_id: bool, phone: bool },
    /// Card already belongs to a loaded record
    CardAlreadyLinked(String),
    /// Session file could not be read for a check
    Storage(anyhow::Error),
    /// Writing the change failed; the record holds what was attempted
    CommitFailed {
        record: Box<StudentRecord>,
        source: anyhow::Error,
    },
}

impl fmt::Display for AttendanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceError::ReadOnly => write!(f, "session is open read-only"),
            AttendanceError::AlreadyAttended { name } => {
                write!(f, "{} is already attended", name)
            }
            AttendanceError::ActionNotAvailable { action, status } => write!(
                f,
                "'{}' is not available for status {}",
                action.label(),
                status
            ),
            AttendanceError::UnknownRecord(index) => write!(f, "no record at index {}", index),
            AttendanceError::IncompleteStudent { missing } => {
                write!(f, "missing required fields: {}", missing.join(", "))
            }
            AttendanceError::DuplicateStudent { student_id, phone } => {
                let mut taken = Vec::new();
                if *student_id {
                    taken.push("student id");
                }
                if *phone {
                    taken.push("phone");
                }
                write!(f, "{} already exists in this session", taken.join(" and "))
            }
            AttendanceError::CardAlreadyLinked(card) => {
                write!(f, "card {} already belongs to a student", card)
            }
            AttendanceError::Storage(e) => write!(f, "failed to read session: {}", e),
            AttendanceError::CommitFailed { record, source } => write!(
                f,
                "failed to save {} (card {}): {}",
                record.display_name(),
                record.card_id,
                source
            ),
        }
    }
}

impl std::error::Error for AttendanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttendanceError::Storage(e) | AttendanceError::CommitFailed { source: e, .. } => {
                Some(e.as_ref())
            }
            _ => None,
        }
    }
}
