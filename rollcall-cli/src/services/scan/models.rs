use std::fmt;

/// A grade requirement a student must satisfy to enter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Requirement {
    Exam,
    Homework,
}

impl Requirement {
    /// Get display label for audit notes and prompts
    pub fn label(&self) -> &'static str {
        match self {
            Requirement::Exam => "Exam",
            Requirement::Homework => "Homework",
        }
    }
}

/// Outcome of looking up one scanned card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    NotFound,
    Duplicate,
    Ok,
    MissingRequirement(Vec<Requirement>), // never empty
}

impl ScanStatus {
    /// Stable name, as shown in logs and JSON
    pub fn label(&self) -> &'static str {
        match self {
            ScanStatus::NotFound => "not_found",
            ScanStatus::Duplicate => "duplicate",
            ScanStatus::Ok => "ok",
            ScanStatus::MissingRequirement(_) => "missing_requirement",
        }
    }

    pub fn missing(&self) -> &[Requirement] {
        match self {
            ScanStatus::MissingRequirement(missing) => missing,
            _ => &[],
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operator action offered for a resolved scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanAction {
    AddStudent,
    Deny,
    Override,
    Complete,
    Cancel,
}

impl ScanAction {
    /// Get display label for prompts
    pub fn label(&self) -> &'static str {
        match self {
            ScanAction::AddStudent => "Add student",
            ScanAction::Deny => "Deny entry",
            ScanAction::Override => "Attend with override",
            ScanAction::Complete => "Completed at center",
            ScanAction::Cancel => "Cancel attendance",
        }
    }

    /// Attendance value once the action is committed
    pub fn attendance_after(&self) -> &'static str {
        match self {
            ScanAction::AddStudent | ScanAction::Override | ScanAction::Complete => {
                crate::session::ATTEND
            }
            ScanAction::Deny | ScanAction::Cancel => "",
        }
    }

    /// Audit line written to notes, `tag` being `[HH:MM:SS]`
    pub fn audit_note(&self, tag: &str, missing_desc: &str) -> String {
        let or = |fallback: &'static str| {
            if missing_desc.is_empty() {
                fallback.to_string()
            } else {
                missing_desc.to_string()
            }
        };
        match self {
            ScanAction::Complete => format!("{} Completed {} at center.", tag, or("task")),
            ScanAction::Override => {
                format!("{} Attended with override (missing {}).", tag, or("task"))
            }
            ScanAction::Deny => format!("{} Denied Entry: No {}.", tag, or("requirements")),
            ScanAction::Cancel => format!("{} Canceled.", tag),
            ScanAction::AddStudent => format!("{} Added.", tag),
        }
    }
}

impl fmt::Display for ScanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of resolving a scan token or an opened record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResolution {
    /// Normalized card id that was looked up
    pub card_id: String,
    pub status: ScanStatus,
    /// Indices of matching records, exact stored id first
    pub matches: Vec<usize>,
    pub already_attended: bool,
}

impl ScanResolution {
    /// The single matched record, if the lookup was unambiguous
    pub fn record_index(&self) -> Option<usize> {
        match self.matches.as_slice() {
            [index] => Some(*index),
            _ => None,
        }
    }

    /// Whether attendance should be committed without asking
    pub fn auto_attend(&self) -> bool {
        self.status == ScanStatus::Ok && !self.already_attended
    }

    /// Actions the operator may pick
    pub fn actions(&self) -> Vec<ScanAction> {
        match &self.status {
            ScanStatus::NotFound => vec![ScanAction::AddStudent],
            ScanStatus::Duplicate => Vec::new(),
            ScanStatus::Ok if self.already_attended => vec![ScanAction::Cancel],
            ScanStatus::Ok => Vec::new(),
            ScanStatus::MissingRequirement(_) => {
                vec![ScanAction::Deny, ScanAction::Override, ScanAction::Complete]
            }
        }
    }
}
