//! Session record store backed by a spreadsheet file
//!
//! Loads project rows through the column map; every upsert re-reads the
//! file, edits one row and writes the whole table back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::types::{StudentRecord, normalize_card};
use crate::config::{ColumnMap, LogicalField, Restrictions};
use crate::store::{self, StoreError, Table, clean_value};

/// Records read from a session file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedSession {
    /// One record per data row, in file order
    pub records: Vec<StudentRecord>,
    /// Card ids that appear on more than one row
    pub duplicates: Vec<DuplicateCard>,
}

/// A card id shared by several rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCard {
    pub card_id: String,
    /// Zero-based data row indices
    pub rows: Vec<usize>,
}

/// What an upsert did to the stored table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Updated { row: usize },
    Appended { row: usize },
}

/// A session bound to one spreadsheet file
#[derive(Debug, Clone)]
pub struct SessionStore {
    name: String,
    path: PathBuf,
    column_map: ColumnMap,
    restrictions: Restrictions,
}

impl SessionStore {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        column_map: ColumnMap,
        restrictions: Restrictions,
    ) -> Self {
        SessionStore {
            name: name.into(),
            path: path.into(),
            column_map,
            restrictions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn restrictions(&self) -> Restrictions {
        self.restrictions
    }

    /// Read the session file and project every row into a record
    pub fn load(&self) -> Result<LoadedSession> {
        let table = store::load(&self.path)?;
        let loaded = project(&table, &self.column_map, self.restrictions);

        for dup in &loaded.duplicates {
            log::warn!(
                "Session '{}': card id {} appears on {} rows",
                self.name,
                dup.card_id,
                dup.rows.len()
            );
        }
        log::info!(
            "Session '{}' loaded {} records from {}",
            self.name,
            loaded.records.len(),
            self.path.display()
        );
        Ok(loaded)
    }

    /// Write one record's attendance, notes and timestamp to the file
    ///
    /// The file is read fresh, so edits made outside this process since the
    /// last load are kept. Nothing is written if any step fails.
    pub fn upsert(&self, record: &StudentRecord) -> Result<UpsertOutcome> {
        let mut table = store::load(&self.path)?;
        let outcome = apply_upsert(&mut table, &self.column_map, record)?;
        store::save(&table, &self.path)?;

        log::debug!(
            "Session '{}': {:?} for card {}",
            self.name,
            outcome,
            record.card_id
        );
        Ok(outcome)
    }

    /// Whether a student id or phone number is already on file
    pub fn student_exists(&self, student_id: &str, phone: &str) -> Result<(bool, bool)> {
        let table = store::load(&self.path)?;
        let contains = |field: LogicalField, needle: &str| -> bool {
            let header = self.column_map.header_for(field);
            !needle.is_empty()
                && (0..table.len()).any(|row| {
                    table
                        .get(row, header)
                        .is_some_and(|v| clean_value(v) == needle)
                })
        };
        Ok((
            contains(LogicalField::StudentId, student_id.trim()),
            contains(LogicalField::Phone, phone.trim()),
        ))
    }
}

/// Project table rows into records through the column map
///
/// Exam and homework are only read when their restriction is enabled.
/// Absent columns read as empty. Rows sharing a card id are all kept and
/// reported in `duplicates`.
pub fn project(table: &Table, column_map: &ColumnMap, restrictions: Restrictions) -> LoadedSession {
    let read = |row: usize, field: LogicalField| -> String {
        table
            .get(row, column_map.header_for(field))
            .map(clean_value)
            .unwrap_or_default()
    };

    let mut records = Vec::with_capacity(table.len());
    let mut by_card: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for row in 0..table.len() {
        let record = StudentRecord {
            card_id: read(row, LogicalField::CardId),
            student_id: read(row, LogicalField::StudentId),
            name: read(row, LogicalField::Name),
            phone: read(row, LogicalField::Phone),
            attendance: read(row, LogicalField::Attendance),
            notes: read(row, LogicalField::Notes),
            timestamp: read(row, LogicalField::Timestamp),
            exam: restrictions.exam.then(|| read(row, LogicalField::Exam)),
            homework: restrictions.homework.then(|| read(row, LogicalField::Homework)),
        };

        let normalized = record.normalized_card();
        if !normalized.is_empty() {
            by_card.entry(normalized).or_default().push(row);
        }
        records.push(record);
    }

    let duplicates = by_card
        .into_iter()
        .filter(|(_, rows)| rows.len() > 1)
        .map(|(card_id, rows)| DuplicateCard { card_id, rows })
        .collect();

    LoadedSession {
        records,
        duplicates,
    }
}

/// Apply one record to a table in memory
///
/// An existing row gets attendance and
/// notes overwritten, and its timestamp only when the record carries one.
/// Rows whose stored card id equals the record's exactly take precedence
/// over rows that only match after normalization.
/// Otherwise a row is appended with the identity columns that exist in the
/// table filled from the record and every other column empty.
pub fn apply_upsert(
    table: &mut Table,
    column_map: &ColumnMap,
    record: &StudentRecord,
) -> Result<UpsertOutcome, StoreError> {
    let card_id = normalize_card(&record.card_id);
    let matches = matching_rows(table, column_map, &clean_value(&record.card_id), &card_id);
    if matches.len() > 1 {
        return Err(StoreError::AmbiguousCard {
            card_id,
            rows: matches,
        });
    }

    let att_col = table.ensure_column(column_map.header_for(LogicalField::Attendance));
    let notes_col = table.ensure_column(column_map.header_for(LogicalField::Notes));
    let ts_col = table.ensure_column(column_map.header_for(LogicalField::Timestamp));

    let outcome = match matches.first() {
        Some(&row) => UpsertOutcome::Updated { row },
        None => {
            let row = table.push_empty_row();
            let identity = [
                (LogicalField::CardId, &record.card_id),
                (LogicalField::StudentId, &record.student_id),
                (LogicalField::Name, &record.name),
                (LogicalField::Phone, &record.phone),
            ];
            for (field, value) in identity {
                if let Some(col) = table.column_index(column_map.header_for(field)) {
                    table.set_cell(row, col, value.as_str());
                }
            }
            UpsertOutcome::Appended { row }
        }
    };

    let row = match outcome {
        UpsertOutcome::Updated { row } | UpsertOutcome::Appended { row } => row,
    };
    table.set_cell(row, att_col, record.attendance.as_str());
    table.set_cell(row, notes_col, record.notes.as_str());
    if !record.timestamp.is_empty() {
        table.set_cell(row, ts_col, record.timestamp.as_str());
    }

    Ok(outcome)
}

fn matching_rows(table: &Table, column_map: &ColumnMap, stored: &str, normalized: &str) -> Vec<usize> {
    let header = column_map.header_for(LogicalField::CardId);
    if normalized.is_empty() || table.column_index(header).is_none() {
        return Vec::new();
    }
    let cards: Vec<(usize, String)> = (0..table.len())
        .filter_map(|row| table.get(row, header).map(|cell| (row, clean_value(cell))))
        .collect();

    let exact: Vec<usize> = cards
        .iter()
        .filter(|(_, cell)| cell == stored)
        .map(|(row, _)| *row)
        .collect();
    if !exact.is_empty() {
        return exact;
    }
    cards
        .iter()
        .filter(|(_, cell)| normalize_card(cell) == normalized)
        .map(|(row, _)| *row)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn rfid_map() -> ColumnMap {
        ColumnMap::from_pairs([
            (LogicalField::CardId, "RFID"),
            (LogicalField::StudentId, "Code"),
            (LogicalField::Name, "Student"),
            (LogicalField::Phone, "Mobile"),
            (LogicalField::Attendance, "Present"),
            (LogicalField::Notes, "Remarks"),
            (LogicalField::Timestamp, "When"),
            (LogicalField::Exam, "Quiz"),
            (LogicalField::Homework, "HW"),
        ])
    }

    fn roster() -> Table {
        Table::from_rows(
            strings(&["RFID", "Code", "Student", "Mobile", "Quiz", "HW", "Present", "Remarks", "When", "Group"]),
            vec![
                strings(&["00004521", "S1", "Mona", "0100", "9", "", "", "", "T1", "A"]),
                strings(&["00000007", "S2", "Omar", "0111", "0", "5", "attend", "[08:00:00] Attended.", "T0", "B"]),
            ],
        )
    }

    #[test]
    fn test_project_maps_headers_and_restrictions() {
        let loaded = project(&roster(), &rfid_map(), Restrictions::default());
        assert_eq!(loaded.records.len(), 2);
        let mona = &loaded.records[0];
        assert_eq!(mona.card_id, "00004521");
        assert_eq!(mona.name, "Mona");
        assert_eq!(mona.exam.as_deref(), Some("9"));
        assert_eq!(mona.homework.as_deref(), Some(""));
        assert!(loaded.records[1].is_attended());
        assert!(loaded.duplicates.is_empty());

        let plain = project(&roster(), &rfid_map(), Restrictions::none());
        assert_eq!(plain.records[0].exam, None);
        assert_eq!(plain.records[0].homework, None);
    }

    #[test]
    fn test_project_missing_columns_read_empty() {
        let table = Table::from_rows(strings(&["RFID"]), vec![strings(&["12"])]);
        let loaded = project(&table, &rfid_map(), Restrictions::default());
        let record = &loaded.records[0];
        assert_eq!(record.card_id, "12");
        assert_eq!(record.name, "");
        assert_eq!(record.exam.as_deref(), Some(""));
    }

    #[test]
    fn test_project_flags_duplicate_cards() {
        let table = Table::from_rows(
            strings(&["RFID", "Student"]),
            vec![
                strings(&["4521", "Mona"]),
                strings(&["00004521", "Mona again"]),
                strings(&["", "blank"]),
                strings(&["", "blank"]),
                strings(&["9", "Omar"]),
            ],
        );
        let loaded = project(&table, &rfid_map(), Restrictions::none());
        assert_eq!(loaded.records.len(), 5);
        assert_eq!(
            loaded.duplicates,
            vec![DuplicateCard {
                card_id: "00004521".into(),
                rows: vec![0, 1],
            }]
        );
    }

    #[test]
    fn test_upsert_existing_row_changes_only_tracked_columns() {
        let mut table = roster();
        let before = table.clone();
        let mut record = StudentRecord::with_card("00004521");
        record.attendance = "attend".into();
        record.notes = "[09:00:00] Attended.".into();
        record.timestamp = "T2".into();
        record.name = "Ignored".into();

        let outcome = apply_upsert(&mut table, &rfid_map(), &record).unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated { row: 0 });
        assert_eq!(table.len(), before.len());
        assert_eq!(table.headers(), before.headers());
        assert_eq!(table.get(0, "Present"), Some("attend"));
        assert_eq!(table.get(0, "Remarks"), Some("[09:00:00] Attended."));
        assert_eq!(table.get(0, "When"), Some("T2"));
        assert_eq!(table.get(0, "Student"), Some("Mona"));
        assert_eq!(table.get(0, "Group"), Some("A"));
        assert_eq!(table.rows()[1], before.rows()[1]);
    }

    #[test]
    fn test_upsert_keeps_timestamp_when_record_has_none() {
        let mut table = roster();
        let mut record = StudentRecord::with_card("00004521");
        record.notes = "note".into();

        apply_upsert(&mut table, &rfid_map(), &record).unwrap();
        assert_eq!(table.get(0, "When"), Some("T1"));
        assert_eq!(table.get(0, "Remarks"), Some("note"));
    }

    #[test]
    fn test_upsert_matches_legacy_unpadded_ids() {
        let mut table = Table::from_rows(
            strings(&["RFID", "Present"]),
            vec![strings(&["4521", ""])],
        );
        let mut record = StudentRecord::with_card("00004521");
        record.attendance = "attend".into();
        let outcome = apply_upsert(&mut table, &rfid_map(), &record).unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated { row: 0 });
        assert_eq!(table.get(0, "RFID"), Some("4521"));
    }

    #[test]
    fn test_upsert_appends_new_card_with_identity_columns_only() {
        let mut table = roster();
        let record = StudentRecord {
            card_id: "00009999".into(),
            student_id: "S3".into(),
            name: "Laila".into(),
            phone: "0122".into(),
            attendance: "attend".into(),
            notes: "manual addition".into(),
            timestamp: "T3".into(),
            exam: Some("10".into()),
            homework: Some("10".into()),
        };

        let outcome = apply_upsert(&mut table, &rfid_map(), &record).unwrap();
        assert_eq!(outcome, UpsertOutcome::Appended { row: 2 });
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(2, "RFID"), Some("00009999"));
        assert_eq!(table.get(2, "Code"), Some("S3"));
        assert_eq!(table.get(2, "Mobile"), Some("0122"));
        assert_eq!(table.get(2, "Quiz"), Some(""));
        assert_eq!(table.get(2, "HW"), Some(""));
        assert_eq!(table.get(2, "Group"), Some(""));
        assert_eq!(table.get(2, "Present"), Some("attend"));
        assert_eq!(table.get(2, "When"), Some("T3"));
    }

    #[test]
    fn test_upsert_adds_missing_tracking_columns() {
        let mut table = Table::from_rows(strings(&["RFID"]), vec![strings(&["00000001"])]);
        let mut record = StudentRecord::with_card("1");
        record.attendance = "attend".into();
        record.timestamp = "T".into();
        apply_upsert(&mut table, &rfid_map(), &record).unwrap();
        assert_eq!(table.headers(), strings(&["RFID", "Present", "Remarks", "When"]).as_slice());
        assert_eq!(table.get(0, "Present"), Some("attend"));
    }

    #[test]
    fn test_upsert_refuses_ambiguous_card() {
        let mut table = Table::from_rows(
            strings(&["RFID", "Present"]),
            vec![strings(&["00000001", ""]), strings(&["1", ""])],
        );
        let before = table.clone();
        let err = apply_upsert(&mut table, &rfid_map(), &StudentRecord::with_card("01")).unwrap_err();
        assert_eq!(
            err,
            StoreError::AmbiguousCard {
                card_id: "00000001".into(),
                rows: vec![0, 1],
            }
        );
        assert_eq!(table, before);
    }

    #[test]
    fn test_upsert_prefers_exact_stored_card() {
        let mut table = Table::from_rows(
            strings(&["RFID", "Present"]),
            vec![strings(&["00000001", ""]), strings(&["1", ""])],
        );
        let mut record = StudentRecord::with_card("1");
        record.attendance = "attend".into();
        let outcome = apply_upsert(&mut table, &rfid_map(), &record).unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated { row: 1 });
        assert_eq!(table.get(0, "Present"), Some(""));
        assert_eq!(table.get(1, "Present"), Some("attend"));

        record.card_id = "00000001".into();
        let outcome = apply_upsert(&mut table, &rfid_map(), &record).unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated { row: 0 });
    }

    #[test]
    fn test_upsert_refuses_repeated_exact_card() {
        let mut table = Table::from_rows(
            strings(&["RFID", "Present"]),
            vec![strings(&["7", ""]), strings(&["7", ""])],
        );
        let err = apply_upsert(&mut table, &rfid_map(), &StudentRecord::with_card("7")).unwrap_err();
        assert!(matches!(err, StoreError::AmbiguousCard { rows, .. } if rows == vec![0, 1]));
    }

    #[test]
    fn test_scanned_short_id_updates_mapped_row_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.csv");
        let map = ColumnMap::from_pairs([
            (LogicalField::CardId, "RFID"),
            (LogicalField::Attendance, "Present"),
        ]);
        let table = Table::from_rows(
            strings(&["RFID", "Present", "Other"]),
            vec![strings(&["00004521", "", "keep"])],
        );
        store::save(&table, &path).unwrap();

        let session = SessionStore::new("s", &path, map, Restrictions::none());
        let mut record = StudentRecord::with_card(normalize_card("4521"));
        record.attendance = "attend".into();
        record.timestamp = "16/10/2026, 09:00:00".into();
        assert_eq!(session.upsert(&record).unwrap(), UpsertOutcome::Updated { row: 0 });

        let stored = store::load(&path).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.get(0, "Present"), Some("attend"));
        assert_eq!(stored.get(0, "Other"), Some("keep"));
        assert_eq!(stored.get(0, "timestamp"), Some("16/10/2026, 09:00:00"));
    }

    #[test]
    fn test_upsert_sees_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.csv");
        store::save(
            &Table::from_rows(strings(&["RFID", "Present"]), vec![strings(&["00000001", ""])]),
            &path,
        )
        .unwrap();
        let session = SessionStore::new("s", &path, rfid_map(), Restrictions::none());
        let loaded = session.load().unwrap();
        assert_eq!(loaded.records.len(), 1);

        // Another program appends a row after the load
        std::fs::write(&path, "RFID,Present\n00000001,\n00000002,\n").unwrap();

        session.upsert(&StudentRecord::with_card("00000003")).unwrap();
        let stored = store::load(&path).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored.get(1, "RFID"), Some("00000002"));
    }

    #[test]
    fn test_failed_upsert_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.csv");
        std::fs::write(&path, "RFID,Present\n00000001,\n1,\n").unwrap();
        let session = SessionStore::new("s", &path, rfid_map(), Restrictions::none());

        assert!(session.upsert(&StudentRecord::with_card("1")).is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "RFID,Present\n00000001,\n1,\n"
        );

        let missing = SessionStore::new("gone", dir.path().join("gone.csv"), rfid_map(), Restrictions::none());
        assert!(missing.upsert(&StudentRecord::with_card("1")).is_err());
        assert!(!dir.path().join("gone.csv").exists());
    }

    #[test]
    fn test_student_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.xlsx");
        store::save(&roster(), &path).unwrap();
        let session = SessionStore::new("s", &path, rfid_map(), Restrictions::default());

        assert_eq!(session.student_exists("S1", "9999").unwrap(), (true, false));
        assert_eq!(session.student_exists("S9", "0111").unwrap(), (false, true));
        assert_eq!(session.student_exists("", "").unwrap(), (false, false));
    }
}
