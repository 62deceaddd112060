//! An active attendance run
//!
//! The in-memory records are the source of truth while the run is open.
//! Every change is written to the session file before it is applied in
//! memory, so a failed write leaves both sides as they were.

use anyhow::Result;
use chrono::NaiveDateTime;

use super::summary::SessionSummary;
use super::{AttendanceError, DEFAULT_MANUAL_NOTE};
use crate::services::scan::{
    self, ScanAction, ScanResolution, append_note, describe_requirements, format_timestamp,
    now_tag,
};
use crate::session::{
    ATTEND, DuplicateCard, NewStudent, SessionStore, StudentRecord, normalize_card,
};
use crate::store::clean_value;

/// What happened when a card was scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub resolution: ScanResolution,
    /// Attendance was committed without operator input
    pub auto_attended: bool,
}

pub struct AttendanceRun {
    store: SessionStore,
    records: Vec<StudentRecord>,
    duplicates: Vec<DuplicateCard>,
    read_only: bool,
    manual_additions: usize,
    cancellations: usize,
    unknown_counter: Option<u32>,
}

impl AttendanceRun {
    /// Load the session file and start a run
    pub fn open(store: SessionStore, read_only: bool) -> Result<Self> {
        let loaded = store.load()?;
        log::info!(
            "Attendance run for '{}' started ({} records{})",
            store.name(),
            loaded.records.len(),
            if read_only { ", read-only" } else { "" }
        );
        Ok(AttendanceRun {
            store,
            records: loaded.records,
            duplicates: loaded.duplicates,
            read_only,
            manual_additions: 0,
            cancellations: 0,
            unknown_counter: None,
        })
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&StudentRecord> {
        self.records.get(index)
    }

    /// Card ids shared by several rows when the session was loaded
    pub fn duplicates(&self) -> &[DuplicateCard] {
        &self.duplicates
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Resolve a scanned token, auto-attending an unattended student with
    /// nothing missing
    ///
    /// Returns `Ok(None)` for a blank token.
    pub fn scan(
        &mut self,
        raw: &str,
        typed_note: &str,
        now: NaiveDateTime,
    ) -> Result<Option<ScanReport>, AttendanceError> {
        self.ensure_writable()?;
        let Some(resolution) = scan::resolve_scan(&self.records, raw, self.store.restrictions())
        else {
            return Ok(None);
        };

        let auto_attended = match resolution.record_index() {
            Some(index) if resolution.auto_attend() => {
                self.mark_attended(index, typed_note, now)?;
                true
            }
            _ => false,
        };

        Ok(Some(ScanReport {
            resolution,
            auto_attended,
        }))
    }

    /// Resolve one record picked from a list, with the same auto-attend
    /// rule as a scan
    pub fn open_record(
        &mut self,
        index: usize,
        typed_note: &str,
        now: NaiveDateTime,
    ) -> Result<ScanReport, AttendanceError> {
        self.ensure_writable()?;
        let resolution = self.resolve(index)?;
        let auto_attended = resolution.auto_attend();
        if auto_attended {
            self.mark_attended(index, typed_note, now)?;
        }
        Ok(ScanReport {
            resolution,
            auto_attended,
        })
    }

    /// Mark a record as attending with an `Attended.` audit line
    pub fn mark_attended(
        &mut self,
        index: usize,
        typed_note: &str,
        now: NaiveDateTime,
    ) -> Result<&StudentRecord, AttendanceError> {
        self.ensure_writable()?;
        let record = self.get(index)?;
        if record.is_attended() {
            return Err(AttendanceError::AlreadyAttended {
                name: record.display_name().to_string(),
            });
        }

        let audit = format!("{} Attended.", now_tag(now));
        let notes = append_note(&append_note(&record.notes, &audit), typed_note);
        self.commit(index, ATTEND, notes, now)
    }

    /// Apply an operator action to a resolved record
    pub fn apply(
        &mut self,
        index: usize,
        action: ScanAction,
        typed_note: &str,
        now: NaiveDateTime,
    ) -> Result<&StudentRecord, AttendanceError> {
        self.ensure_writable()?;
        let resolution = self.resolve(index)?;
        if !resolution.actions().contains(&action) {
            return Err(AttendanceError::ActionNotAvailable {
                action,
                status: resolution.status,
            });
        }

        let record = self.get(index)?;
        let attendance = action.attendance_after();
        if attendance == ATTEND && record.is_attended() {
            return Err(AttendanceError::AlreadyAttended {
                name: record.display_name().to_string(),
            });
        }

        let desc = describe_requirements(resolution.status.missing());
        let audit = action.audit_note(&now_tag(now), &desc);
        let notes = append_note(&append_note(&record.notes, &audit), typed_note);

        self.commit(index, attendance, notes, now)?;
        if action == ScanAction::Cancel {
            self.cancellations += 1;
        }
        log::info!("{} applied to record {}", action.label(), index);
        self.get(index)
    }

    /// Add a student who is not on the roster, attending
    ///
    /// Without a card the id becomes `Unknown N`. Notes default to
    /// `manual addition`. Returns the new record's index.
    pub fn add_student(
        &mut self,
        card_id: Option<&str>,
        student: &NewStudent,
        notes: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<usize, AttendanceError> {
        self.ensure_writable()?;

        let student_id = clean_value(&student.student_id);
        let name = clean_value(&student.name);
        let phone = clean_value(&student.phone);
        let missing: Vec<&'static str> = [
            ("student id", &student_id),
            ("name", &name),
            ("phone", &phone),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(label, _)| label)
        .collect();
        if !missing.is_empty() {
            return Err(AttendanceError::IncompleteStudent { missing });
        }

        let (id_taken, phone_taken) = self
            .store
            .student_exists(&student_id, &phone)
            .map_err(AttendanceError::Storage)?;
        if id_taken || phone_taken {
            return Err(AttendanceError::DuplicateStudent {
                student_id: id_taken,
                phone: phone_taken,
            });
        }

        let card = card_id.map(normalize_card).filter(|c| !c.is_empty());
        let (card_id, next_unknown) = match card {
            Some(card) => {
                if !scan::find_matches(&self.records, &card).is_empty() {
                    return Err(AttendanceError::CardAlreadyLinked(card));
                }
                (card, None)
            }
            None => {
                let next = self.next_unknown();
                (format!("Unknown {}", next), Some(next))
            }
        };

        let notes = notes
            .map(clean_value)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_MANUAL_NOTE.to_string());
        let restrictions = self.store.restrictions();
        let record = StudentRecord {
            card_id,
            student_id,
            name,
            phone,
            attendance: ATTEND.to_string(),
            notes,
            timestamp: format_timestamp(now),
            exam: restrictions.exam.then(String::new),
            homework: restrictions.homework.then(String::new),
        };

        if let Err(source) = self.store.upsert(&record) {
            return Err(AttendanceError::CommitFailed {
                record: Box::new(record),
                source,
            });
        }

        if next_unknown.is_some() {
            self.unknown_counter = next_unknown;
        }
        self.manual_additions += 1;
        log::info!("Added {} with card {}", record.display_name(), record.card_id);
        self.records.push(record);
        Ok(self.records.len() - 1)
    }

    /// Indices of records containing every whitespace-separated term,
    /// ignoring case
    pub fn search(&self, query: &str) -> Vec<usize> {
        let query = query.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();

        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                let haystack = record.values().join(" ").to_lowercase();
                terms.iter().all(|term| haystack.contains(term))
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::compute(
            &self.records,
            self.store.restrictions(),
            self.manual_additions,
            self.cancellations,
        )
    }

    fn ensure_writable(&self) -> Result<(), AttendanceError> {
        if self.read_only {
            return Err(AttendanceError::ReadOnly);
        }
        Ok(())
    }

    fn get(&self, index: usize) -> Result<&StudentRecord, AttendanceError> {
        self.records
            .get(index)
            .ok_or(AttendanceError::UnknownRecord(index))
    }

    fn resolve(&self, index: usize) -> Result<ScanResolution, AttendanceError> {
        scan::resolve_record(&self.records, index, self.store.restrictions())
            .ok_or(AttendanceError::UnknownRecord(index))
    }

    /// Next `Unknown N` suffix, seeded from the loaded records on first use
    fn next_unknown(&self) -> u32 {
        let current = self
            .unknown_counter
            .unwrap_or_else(|| scan::max_unknown_suffix(&self.records));
        current + 1
    }

    /// Write attendance, notes and timestamp for one record, then apply
    /// them in memory
    fn commit(
        &mut self,
        index: usize,
        attendance: &str,
        notes: String,
        now: NaiveDateTime,
    ) -> Result<&StudentRecord, AttendanceError> {
        let mut updated = self.get(index)?.clone();
        updated.attendance = attendance.to_string();
        updated.notes = notes;
        updated.timestamp = format_timestamp(now);

        if let Err(source) = self.store.upsert(&updated) {
            log::error!("Commit for card {} failed: {:#}", updated.card_id, source);
            return Err(AttendanceError::CommitFailed {
                record: Box::new(updated),
                source,
            });
        }

        self.records[index] = updated;
        Ok(&self.records[index])
    }
}
