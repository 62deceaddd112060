//! Sessions: student records bound to one spreadsheet file

pub mod import;
pub mod store;
pub mod types;

pub use import::{SessionName, SetupError, create_or_open, import_roster};
pub use store::{DuplicateCard, LoadedSession, SessionStore, UpsertOutcome};
pub use types::{ATTEND, NewStudent, StudentRecord, normalize_card};
