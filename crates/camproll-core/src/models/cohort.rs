use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::attendee::{Attendee, Gender, Roster};

/// A named collection of attendees produced by one of the allocators.
pub trait Cohort {
    fn name(&self) -> &str;
    fn members(&self) -> &[Attendee];

    fn len(&self) -> usize {
        self.members().len()
    }

    fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    fn contains(&self, serial: &str) -> bool {
        self.members().iter().any(|m| m.serial == serial)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub members: Vec<Attendee>,
}

impl Group {
    pub fn new(name: impl Into<String>, members: Vec<Attendee>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Origin keys held by more than one member, with the serials holding them.
    pub fn origin_collisions(&self) -> BTreeMap<String, Vec<String>> {
        let mut by_origin: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for member in &self.members {
            if let Some(key) = member.origin_key() {
                by_origin
                    .entry(key.to_string())
                    .or_default()
                    .push(member.serial.clone());
            }
        }
        by_origin.retain(|_, serials| serials.len() > 1);
        by_origin
    }

    pub fn from_roster(name: &str, roster: Roster) -> Self {
        Self::new(name, roster.attendees)
    }
}

impl Cohort for Group {
    fn name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> &[Attendee] {
        &self.members
    }
}

pub const MALE_ROOM_PREFIX: &str = "Male Room";
pub const FEMALE_ROOM_PREFIX: &str = "Female Room";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub sex: Gender,
    /// Size the allocator sliced this room to, before any round-robin extras
    pub capacity: usize,
    pub members: Vec<Attendee>,
}

impl Room {
    /// `Male Room 1`, `Female Room 3`, ... (1-based)
    pub fn room_name(sex: &Gender, number: usize) -> String {
        match sex {
            Gender::Male => format!("{} {}", MALE_ROOM_PREFIX, number),
            Gender::Female => format!("{} {}", FEMALE_ROOM_PREFIX, number),
            Gender::Other(label) => format!("{} Room {}", label, number),
        }
    }

    /// Rebuild a room from a persisted sheet; sex comes from the sheet name prefix.
    pub fn from_roster(name: &str, roster: Roster) -> Self {
        let sex = if name.starts_with(MALE_ROOM_PREFIX) {
            Gender::Male
        } else if name.starts_with(FEMALE_ROOM_PREFIX) {
            Gender::Female
        } else {
            Gender::Other(String::new())
        };
        Self {
            name: name.to_string(),
            sex,
            capacity: roster.attendees.len(),
            members: roster.attendees,
        }
    }
}

impl Cohort for Room {
    fn name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> &[Attendee] {
        &self.members
    }
}

/// Lookup from attendee serial to room name.
#[derive(Debug, Clone, Default)]
pub struct RoomMapping {
    rooms: HashMap<String, String>,
}

impl RoomMapping {
    /// Scan every room's membership; a serial seen twice maps to the last room.
    pub fn from_rooms(rooms: &[Room]) -> Self {
        let mut mapping = HashMap::new();
        for room in rooms {
            for member in room.members.iter().filter(|m| !m.serial.is_empty()) {
                mapping.insert(member.serial.clone(), room.name.clone());
            }
        }
        Self { rooms: mapping }
    }

    pub fn room_for(&self, serial: &str) -> Option<&str> {
        self.rooms.get(serial).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn attendee(serial: &str, church: Option<&str>) -> Attendee {
        Attendee {
            serial: serial.to_string(),
            name: None,
            gender: Gender::Male,
            church: church.map(str::to_string),
            location: None,
            cells: vec![CellValue::Text(serial.to_string())],
        }
    }

    #[test]
    fn test_origin_collisions_lists_shared_keys() {
        let group = Group::new(
            "A",
            vec![
                attendee("1", Some("X")),
                attendee("2", Some("Y")),
                attendee("3", Some("X")),
                attendee("4", None),
            ],
        );
        let collisions = group.origin_collisions();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions["X"], vec!["1".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_room_names() {
        assert_eq!(Room::room_name(&Gender::Male, 1), "Male Room 1");
        assert_eq!(Room::room_name(&Gender::Female, 2), "Female Room 2");
    }

    #[test]
    fn test_room_from_roster_infers_sex() {
        let roster = Roster {
            columns: vec!["S. No.".to_string()],
            attendees: vec![attendee("1", None)],
        };
        let room = Room::from_roster("Female Room 4", roster);
        assert_eq!(room.sex, Gender::Female);
        assert_eq!(room.capacity, 1);
        assert!(room.contains("1"));
    }

    #[test]
    fn test_room_mapping_skips_blank_serials() {
        let rooms = vec![
            Room {
                name: "Male Room 1".to_string(),
                sex: Gender::Male,
                capacity: 2,
                members: vec![attendee("1", None), attendee("", None)],
            },
            Room {
                name: "Male Room 2".to_string(),
                sex: Gender::Male,
                capacity: 1,
                members: vec![attendee("2", None)],
            },
        ];
        let mapping = RoomMapping::from_rooms(&rooms);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.room_for("1"), Some("Male Room 1"));
        assert_eq!(mapping.room_for("2"), Some("Male Room 2"));
        assert_eq!(mapping.room_for("3"), None);
    }
}
