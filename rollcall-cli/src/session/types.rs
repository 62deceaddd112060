//! Student record types

use serde::Serialize;

/// Attendance value written for a present student
pub const ATTEND: &str = "attend";

/// Width numeric card ids are padded to
pub const CARD_ID_WIDTH: usize = 8;

/// Normalize a scanned or stored card id
///
/// Surrounding whitespace is dropped; purely numeric ids are left-padded
/// with zeros to eight characters, anything else is kept verbatim.
pub fn normalize_card(raw: &str) -> String {
    let text = raw.trim();
    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>width$}", text, width = CARD_ID_WIDTH)
    } else {
        text.to_string()
    }
}

/// One student row of a session, projected through the column map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    pub card_id: String,
    pub student_id: String,
    pub name: String,
    pub phone: String,
    /// `attend` or empty
    pub attendance: String,
    /// Append-only history of `[HH:MM:SS] ...` lines
    pub notes: String,
    /// Time of the last committed change
    pub timestamp: String,
    /// Exam grade, present when the exam restriction is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam: Option<String>,
    /// Homework grade, present when the homework restriction is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homework: Option<String>,
}

impl StudentRecord {
    /// Create a record with only a card id
    pub fn with_card(card_id: impl Into<String>) -> Self {
        StudentRecord {
            card_id: card_id.into(),
            ..Default::default()
        }
    }

    pub fn is_attended(&self) -> bool {
        self.attendance.trim().eq_ignore_ascii_case(ATTEND)
    }

    /// Normalized form of the stored card id
    pub fn normalized_card(&self) -> String {
        normalize_card(&self.card_id)
    }

    /// Best label for this student: name, student id, card id
    pub fn display_name(&self) -> &str {
        [&self.name, &self.student_id, &self.card_id]
            .into_iter()
            .map(|s| s.as_str())
            .find(|s| !s.is_empty())
            .unwrap_or("Student")
    }

    /// Every value, for free-text search
    pub fn values(&self) -> Vec<&str> {
        let mut values = vec![
            self.card_id.as_str(),
            self.student_id.as_str(),
            self.name.as_str(),
            self.phone.as_str(),
            self.attendance.as_str(),
            self.notes.as_str(),
            self.timestamp.as_str(),
        ];
        values.extend(self.exam.as_deref());
        values.extend(self.homework.as_deref());
        values
    }
}

/// Details entered for a student added during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStudent {
    pub student_id: String,
    pub name: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pads_numeric_ids() {
        assert_eq!(normalize_card("4521"), "00004521");
        assert_eq!(normalize_card(" 7 \n"), "00000007");
        assert_eq!(normalize_card("12345678"), "12345678");
        for len in 1..=8 {
            let token = "9".repeat(len);
            let normalized = normalize_card(&token);
            assert_eq!(normalized.len(), 8);
            assert!(normalized.ends_with(&token));
        }
    }

    #[test]
    fn test_normalize_keeps_non_numeric_and_long_ids() {
        assert_eq!(normalize_card(" AB12 "), "AB12");
        assert_eq!(normalize_card("Unknown 3"), "Unknown 3");
        assert_eq!(normalize_card("123456789"), "123456789");
        assert_eq!(normalize_card("-12"), "-12");
        assert_eq!(normalize_card("   "), "");
    }

    #[test]
    fn test_is_attended_ignores_case() {
        let mut record = StudentRecord::with_card("1");
        assert!(!record.is_attended());
        record.attendance = "Attend".into();
        assert!(record.is_attended());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut record = StudentRecord::with_card("00000001");
        assert_eq!(record.display_name(), "00000001");
        record.student_id = "S-9".into();
        assert_eq!(record.display_name(), "S-9");
        record.name = "Mona".into();
        assert_eq!(record.display_name(), "Mona");
        assert_eq!(StudentRecord::default().display_name(), "Student");
    }
}
