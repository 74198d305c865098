//! Data models for roster entities.
//!
//! - `Attendee`, `Roster`: roster rows with their original columns
//! - `Group`, `Room`: allocator outputs, both exposed through `Cohort`
//! - `RoomMapping`: serial → room name lookup used by merge and cards
//! - `FinalRoster`: the merged master roster

pub mod attendee;
pub mod cohort;
pub mod final_roster;

pub use attendee::{
    Attendee, CellValue, Gender, Roster, CHURCH_COLUMN, GENDER_COLUMN, LOCATION_COLUMN,
    NAME_COLUMN, SERIAL_COLUMN,
};
pub use cohort::{Cohort, Group, Room, RoomMapping, FEMALE_ROOM_PREFIX, MALE_ROOM_PREFIX};
pub use final_roster::{FinalRoster, FinalRow, GROUP_NAME_COLUMN, ROOM_NAME_COLUMN};
