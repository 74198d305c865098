//! External file formats: multi-sheet workbooks and the group-name list.

pub mod group_names;
pub mod workbook;

pub use group_names::{load_group_names, parse_group_names, validate_group_names};
pub use workbook::{
    read_sheet, read_workbook, renamed_sheet_name, sanitize_sheet_name, write_workbook, Sheet,
};
