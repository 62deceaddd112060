use serde::Serialize;

use crate::config::Restrictions;
use crate::session::StudentRecord;

/// End-of-run statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub total: usize,
    pub attended: usize,
    /// `x.y%`, or `0%` for an empty session
    pub attendance_rate: String,
    pub manual_additions: usize,
    pub cancellations: usize,
    /// Records without an exam grade, when the exam restriction is on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_exam: Option<usize>,
    /// Records without a homework grade, when the homework restriction is on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_hw: Option<usize>,
}

impl SessionSummary {
    pub fn compute(
        records: &[StudentRecord],
        restrictions: Restrictions,
        manual_additions: usize,
        cancellations: usize,
    ) -> Self {
        let total = records.len();
        let attended = records.iter().filter(|r| r.is_attended()).count();
        let attendance_rate = if total == 0 {
            "0%".to_string()
        } else {
            format!("{:.1}%", attended as f64 / total as f64 * 100.0)
        };

        let blank = |grade: &Option<String>| grade.as_deref().unwrap_or("").is_empty();
        let missing_exam = restrictions
            .exam
            .then(|| records.iter().filter(|r| blank(&r.exam)).count());
        let missing_hw = restrictions
            .homework
            .then(|| records.iter().filter(|r| blank(&r.homework)).count());

        SessionSummary {
            total,
            attended,
            attendance_rate,
            manual_additions,
            cancellations,
            missing_exam,
            missing_hw,
        }
    }

    /// Label and value pairs in display order
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Total rows", self.total.to_string()),
            ("Attended", self.attended.to_string()),
            ("Attendance %", self.attendance_rate.clone()),
            ("Manual additions", self.manual_additions.to_string()),
            ("Cancellations", self.cancellations.to_string()),
        ];
        if let Some(count) = self.missing_exam {
            rows.push(("Missing exam", count.to_string()));
        }
        if let Some(count) = self.missing_hw {
            rows.push(("Missing H.W.", count.to_string()));
        }
        rows
    }
}
