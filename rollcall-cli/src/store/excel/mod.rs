//! Excel (xlsx) I/O for string tables

mod reader;
mod writer;

pub use reader::read_excel;
pub use writer::write_excel;
