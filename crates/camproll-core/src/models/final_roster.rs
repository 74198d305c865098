use serde::{Deserialize, Serialize};

use super::attendee::{Attendee, CellValue};
use crate::io::Sheet;

pub const GROUP_NAME_COLUMN: &str = "Group Name";
pub const ROOM_NAME_COLUMN: &str = "Room Name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRow {
    pub attendee: Attendee,
    /// Empty when the attendee appears in no group
    pub group_name: String,
    /// Empty when the attendee appears in no room
    pub room_name: String,
}

/// The original roster, in original row order, with group and room names appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalRoster {
    /// Original columns only; the two derived columns are appended on export
    pub columns: Vec<String>,
    pub rows: Vec<FinalRow>,
}

impl FinalRoster {
    pub fn row(&self, serial: &str) -> Option<&FinalRow> {
        self.rows.iter().find(|r| r.attendee.serial == serial)
    }

    pub fn to_sheet(&self, name: &str) -> Sheet {
        let mut columns = self.columns.clone();
        columns.push(GROUP_NAME_COLUMN.to_string());
        columns.push(ROOM_NAME_COLUMN.to_string());

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = row.attendee.cells.clone();
                cells.push(CellValue::from(row.group_name.as_str()));
                cells.push(CellValue::from(row.room_name.as_str()));
                cells
            })
            .collect();

        Sheet {
            name: name.to_string(),
            columns,
            rows,
        }
    }
}
