pub mod reader;
pub mod utils;
pub mod writer;

pub use reader::read_first_sheet;
pub use writer::write_workbook;
