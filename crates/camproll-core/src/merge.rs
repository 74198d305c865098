//! Joins group and room assignments back onto the original roster.

use std::collections::HashSet;

use tracing::info;

use crate::models::{Cohort, FinalRoster, FinalRow, Roster};

/// Stamp `name` onto every row whose serial is in `cohort`. Later cohorts
/// overwrite earlier ones if a serial was (erroneously) allocated twice.
fn assign<C: Cohort>(rows: &mut [FinalRow], cohorts: &[C], field: fn(&mut FinalRow) -> &mut String) {
    for cohort in cohorts {
        let serials: HashSet<&str> = cohort.members().iter().map(|m| m.serial.as_str()).collect();
        for row in rows.iter_mut().filter(|r| serials.contains(r.attendee.serial.as_str())) {
            *field(row) = cohort.name().to_string();
        }
    }
}

/// Produce the master roster: original rows in original order, plus group
/// and room names looked up by serial. Unassigned rows keep empty names.
pub fn merge_roster<G: Cohort, R: Cohort>(roster: &Roster, groups: &[G], rooms: &[R]) -> FinalRoster {
    let mut rows: Vec<FinalRow> = roster
        .attendees
        .iter()
        .map(|attendee| FinalRow {
            attendee: attendee.clone(),
            group_name: String::new(),
            room_name: String::new(),
        })
        .collect();

    assign(&mut rows, groups, |row| &mut row.group_name);
    assign(&mut rows, rooms, |row| &mut row.room_name);

    let grouped = rows.iter().filter(|r| !r.group_name.is_empty()).count();
    let roomed = rows.iter().filter(|r| !r.room_name.is_empty()).count();
    info!(rows = rows.len(), grouped, roomed, "Roster merged");

    FinalRoster {
        columns: roster.columns.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attendee, CellValue, Gender, Group, Room, GROUP_NAME_COLUMN, ROOM_NAME_COLUMN};

    fn attendee(serial: &str) -> Attendee {
        Attendee {
            serial: serial.to_string(),
            name: Some(format!("P{}", serial)),
            gender: Gender::Male,
            church: None,
            location: None,
            cells: vec![CellValue::Text(serial.to_string()), CellValue::Text(format!("P{}", serial))],
        }
    }

    fn roster(serials: &[&str]) -> Roster {
        Roster {
            columns: vec!["S. No.".to_string(), "Name".to_string()],
            attendees: serials.iter().map(|s| attendee(s)).collect(),
        }
    }

    fn room(name: &str, serials: &[&str]) -> Room {
        Room {
            name: name.to_string(),
            sex: Gender::Male,
            capacity: serials.len(),
            members: serials.iter().map(|s| attendee(s)).collect(),
        }
    }

    #[test]
    fn test_merge_assigns_group_and_room() {
        let roster = roster(&["1", "2", "3"]);
        let groups = vec![
            Group::new("A", vec![attendee("3"), attendee("1")]),
            Group::new("B", vec![attendee("2")]),
        ];
        let rooms = vec![room("Male Room 1", &["1", "2"]), room("Male Room 2", &["3"])];

        let merged = merge_roster(&roster, &groups, &rooms);
        assert_eq!(merged.row("1").unwrap().group_name, "A");
        assert_eq!(merged.row("2").unwrap().group_name, "B");
        assert_eq!(merged.row("3").unwrap().group_name, "A");
        assert_eq!(merged.row("1").unwrap().room_name, "Male Room 1");
        assert_eq!(merged.row("3").unwrap().room_name, "Male Room 2");
    }

    #[test]
    fn test_merge_keeps_original_row_order() {
        let roster = roster(&["5", "4", "9"]);
        let groups = vec![Group::new("A", vec![attendee("9"), attendee("4"), attendee("5")])];
        let merged = merge_roster::<Group, Room>(&roster, &groups, &[]);
        let order: Vec<&str> = merged.rows.iter().map(|r| r.attendee.serial.as_str()).collect();
        assert_eq!(order, vec!["5", "4", "9"]);
    }

    #[test]
    fn test_unassigned_rows_keep_empty_fields() {
        let roster = roster(&["1", "2"]);
        let groups = vec![Group::new("A", vec![attendee("1")])];
        let merged = merge_roster::<Group, Room>(&roster, &groups, &[]);
        assert_eq!(merged.row("2").unwrap().group_name, "");
        assert_eq!(merged.row("1").unwrap().room_name, "");
    }

    #[test]
    fn test_duplicate_assignment_resolves_by_order() {
        let roster = roster(&["1"]);
        let groups = vec![
            Group::new("A", vec![attendee("1")]),
            Group::new("B", vec![attendee("1")]),
        ];
        let merged = merge_roster::<Group, Room>(&roster, &groups, &[]);
        assert_eq!(merged.row("1").unwrap().group_name, "B");
    }

    #[test]
    fn test_merged_sheet_appends_two_columns() {
        let roster = roster(&["1"]);
        let groups = vec![Group::new("A", vec![attendee("1")])];
        let rooms = vec![room("Male Room 1", &["1"])];
        let sheet = merge_roster(&roster, &groups, &rooms).to_sheet("Outsiders");

        assert_eq!(sheet.name, "Outsiders");
        assert_eq!(
            sheet.columns,
            vec!["S. No.", "Name", GROUP_NAME_COLUMN, ROOM_NAME_COLUMN]
        );
        assert_eq!(sheet.rows[0][2], CellValue::Text("A".to_string()));
        assert_eq!(sheet.rows[0][3], CellValue::Text("Male Room 1".to_string()));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let roster = roster(&["1", "2"]);
        let groups = vec![Group::new("A", vec![attendee("1"), attendee("2")])];
        let rooms = vec![room("Male Room 1", &["2"])];
        let first = merge_roster(&roster, &groups, &rooms);
        let second = merge_roster(&roster, &groups, &rooms);
        assert_eq!(first, second);
    }
}
