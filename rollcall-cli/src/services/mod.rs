// Business logic services layer
//
// Scan resolution and attendance runs, kept free of any terminal I/O so
// the CLI only decides how results are shown and which action to take.

pub mod attendance;
pub mod scan;
