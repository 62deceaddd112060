// Scan resolution service
//
// Turns a raw card token into a status and the set of actions the
// operator may take, independent of how the result is presented.

pub mod core;
pub mod models;

pub use self::core::{
    append_note, describe_requirements, find_matches, format_timestamp, max_unknown_suffix,
    missing_requirements, now_tag, resolve_record, resolve_scan,
};
pub use models::{Requirement, ScanAction, ScanResolution, ScanStatus};
