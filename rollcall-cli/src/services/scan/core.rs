//! Core scan resolution functions
//! Pure over the in-memory records; nothing here touches the disk

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{Requirement, ScanResolution, ScanStatus};
use crate::config::Restrictions;
use crate::session::{StudentRecord, normalize_card};
use crate::store::clean_value;

/// Format of the timestamp column
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

static UNKNOWN_CARD: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^Unknown (\d+)$").ok());

/// Indices of records whose card id normalizes to the token
/// Records whose stored id is already the normalized form come first
pub fn find_matches(records: &[StudentRecord], token: &str) -> Vec<usize> {
    let normalized = normalize_card(token);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.normalized_card() == normalized)
        .map(|(i, _)| i)
        .collect();
    matches.sort_by_key(|&i| records[i].card_id.trim() != normalized);
    matches
}

/// Requirements an enabled restriction finds unmet: grade empty or "0"
pub fn missing_requirements(record: &StudentRecord, restrictions: Restrictions) -> Vec<Requirement> {
    let unmet = |grade: &Option<String>| {
        let grade = grade.as_deref().unwrap_or("").trim();
        grade.is_empty() || grade == "0"
    };

    let mut missing = Vec::new();
    if restrictions.exam && unmet(&record.exam) {
        missing.push(Requirement::Exam);
    }
    if restrictions.homework && unmet(&record.homework) {
        missing.push(Requirement::Homework);
    }
    missing
}

/// Human description of a requirement set: `Exam`, `Homework`, `Exam & Homework`
pub fn describe_requirements(missing: &[Requirement]) -> String {
    missing
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(" & ")
}

/// Append a note line after existing notes, never overwriting them
pub fn append_note(original: &str, addition: &str) -> String {
    let original = clean_value(original);
    let addition = clean_value(addition);
    if addition.is_empty() {
        return original;
    }
    if original.is_empty() {
        return addition;
    }
    format!("{}\n{}", original.trim_end(), addition)
}

/// `[HH:MM:SS]` tag for audit lines
pub fn now_tag(now: NaiveDateTime) -> String {
    format!("[{}]", now.format("%H:%M:%S"))
}

/// Value written to the timestamp column
pub fn format_timestamp(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Resolve a raw scan token against the loaded records
/// Returns None when the token is blank
pub fn resolve_scan(
    records: &[StudentRecord],
    raw: &str,
    restrictions: Restrictions,
) -> Option<ScanResolution> {
    let card_id = normalize_card(raw);
    if card_id.is_empty() {
        return None;
    }

    let matches = find_matches(records, &card_id);
    let resolution = match matches.as_slice() {
        [] => ScanResolution {
            card_id,
            status: ScanStatus::NotFound,
            matches,
            already_attended: false,
        },
        [index] => {
            let mut resolution = resolve_record(records, *index, restrictions)?;
            resolution.card_id = card_id;
            resolution
        }
        _ => ScanResolution {
            card_id,
            status: ScanStatus::Duplicate,
            matches,
            already_attended: false,
        },
    };

    log::debug!(
        "Scan {} resolved to {} ({} matches)",
        resolution.card_id,
        resolution.status,
        resolution.matches.len()
    );
    Some(resolution)
}

/// Resolve one record directly, as when the operator opens it from a list
pub fn resolve_record(
    records: &[StudentRecord],
    index: usize,
    restrictions: Restrictions,
) -> Option<ScanResolution> {
    let record = records.get(index)?;
    let missing = missing_requirements(record, restrictions);
    let status = if missing.is_empty() {
        ScanStatus::Ok
    } else {
        ScanStatus::MissingRequirement(missing)
    };

    Some(ScanResolution {
        card_id: record.normalized_card(),
        status,
        matches: vec![index],
        already_attended: record.is_attended(),
    })
}

/// Highest `Unknown N` suffix among the records, 0 when there is none
pub fn max_unknown_suffix(records: &[StudentRecord]) -> u32 {
    let Some(pattern) = UNKNOWN_CARD.as_ref() else {
        return 0;
    };
    records
        .iter()
        .filter_map(|r| pattern.captures(r.card_id.trim()))
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scan::ScanAction;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn student(card: &str, exam: &str, homework: &str) -> StudentRecord {
        StudentRecord {
            card_id: card.into(),
            exam: Some(exam.into()),
            homework: Some(homework.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_matches_tolerates_unpadded_ids() {
        let records = vec![
            student("4521", "9", "9"),
            student("AB", "9", "9"),
            student("00004521", "9", "9"),
        ];
        assert_eq!(find_matches(&records, "4521"), vec![2, 0]);
        assert_eq!(find_matches(&records, " AB "), vec![1]);
        assert!(find_matches(&records, "ab").is_empty());
        assert!(find_matches(&records, "  ").is_empty());
    }

    #[test]
    fn test_missing_requirements() {
        let both = Restrictions::default();
        assert!(missing_requirements(&student("1", "7", "3"), both).is_empty());
        assert_eq!(
            missing_requirements(&student("1", "0", ""), both),
            vec![Requirement::Exam, Requirement::Homework]
        );
        assert_eq!(
            missing_requirements(&student("1", "5", "0"), both),
            vec![Requirement::Homework]
        );
        assert!(missing_requirements(&student("1", "", ""), Restrictions::none()).is_empty());

        let exam_only = Restrictions {
            exam: true,
            homework: false,
        };
        let no_grades = StudentRecord::with_card("1");
        assert_eq!(missing_requirements(&no_grades, exam_only), vec![Requirement::Exam]);
    }

    #[test]
    fn test_describe_requirements() {
        assert_eq!(describe_requirements(&[]), "");
        assert_eq!(describe_requirements(&[Requirement::Homework]), "Homework");
        assert_eq!(
            describe_requirements(&[Requirement::Exam, Requirement::Homework]),
            "Exam & Homework"
        );
    }

    #[test]
    fn test_append_note() {
        assert_eq!(append_note("", "[10:00:00] Attended."), "[10:00:00] Attended.");
        assert_eq!(append_note("first  ", "second"), "first\nsecond");
        assert_eq!(append_note("a\nb", "c"), "a\nb\nc");
        assert_eq!(append_note("keep", "  "), "keep");
        assert_eq!(append_note("nan", "x"), "x");
    }

    #[test]
    fn test_tags() {
        assert_eq!(now_tag(at(9, 5, 7)), "[09:05:07]");
        assert_eq!(format_timestamp(at(9, 5, 7)), "16/10/2026, 09:05:07");
    }

    #[test]
    fn test_resolve_statuses() {
        let restrictions = Restrictions::default();
        let mut attended = student("00000002", "8", "8");
        attended.attendance = "attend".into();
        let records = vec![
            student("00000001", "8", "8"),
            attended,
            student("00000003", "", "8"),
            student("5", "8", "8"),
            student("00000005", "8", "8"),
        ];

        assert_eq!(resolve_scan(&records, "", restrictions), None);

        let ok = resolve_scan(&records, "1", restrictions).unwrap();
        assert_eq!(ok.status, ScanStatus::Ok);
        assert_eq!(ok.card_id, "00000001");
        assert!(ok.auto_attend());
        assert!(ok.actions().is_empty());

        let again = resolve_scan(&records, "2", restrictions).unwrap();
        assert!(!again.auto_attend());
        assert_eq!(again.actions(), vec![ScanAction::Cancel]);

        let missing = resolve_scan(&records, "3", restrictions).unwrap();
        assert_eq!(missing.status, ScanStatus::MissingRequirement(vec![Requirement::Exam]));
        assert_eq!(missing.status.label(), "missing_requirement");
        assert_eq!(
            missing.actions(),
            vec![ScanAction::Deny, ScanAction::Override, ScanAction::Complete]
        );

        let dup = resolve_scan(&records, "5", restrictions).unwrap();
        assert_eq!(dup.status, ScanStatus::Duplicate);
        assert_eq!(dup.matches, vec![4, 3]);
        assert_eq!(dup.record_index(), None);
        assert!(dup.actions().is_empty());

        let none = resolve_scan(&records, "AB12", restrictions).unwrap();
        assert_eq!(none.status, ScanStatus::NotFound);
        assert_eq!(none.card_id, "AB12");
        assert_eq!(none.actions(), vec![ScanAction::AddStudent]);
    }

    #[test]
    fn test_audit_notes() {
        let tag = "[10:00:00]";
        assert_eq!(
            ScanAction::Complete.audit_note(tag, "Exam & Homework"),
            "[10:00:00] Completed Exam & Homework at center."
        );
        assert_eq!(ScanAction::Complete.audit_note(tag, ""), "[10:00:00] Completed task at center.");
        assert_eq!(
            ScanAction::Override.audit_note(tag, "Exam"),
            "[10:00:00] Attended with override (missing Exam)."
        );
        assert_eq!(
            ScanAction::Deny.audit_note(tag, ""),
            "[10:00:00] Denied Entry: No requirements."
        );
        assert_eq!(ScanAction::Cancel.audit_note(tag, "Exam"), "[10:00:00] Canceled.");
        assert_eq!(ScanAction::Deny.attendance_after(), "");
        assert_eq!(ScanAction::Override.attendance_after(), "attend");
    }

    #[test]
    fn test_max_unknown_suffix() {
        let records = vec![
            StudentRecord::with_card("Unknown 2"),
            StudentRecord::with_card("Unknown 11"),
            StudentRecord::with_card("Unknown x"),
            StudentRecord::with_card("00000001"),
        ];
        assert_eq!(max_unknown_suffix(&records), 11);
        assert_eq!(max_unknown_suffix(&[]), 0);
    }
}
