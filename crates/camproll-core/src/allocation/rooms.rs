use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CampError, Result};
use crate::models::{Attendee, Gender, Room};

/// Number of rooms requested for each sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCounts {
    pub male: usize,
    pub female: usize,
}

impl RoomCounts {
    pub fn new(male: usize, female: usize) -> Self {
        Self { male, female }
    }

    /// Reject zero counts before any slicing happens.
    pub fn validate(&self) -> Result<()> {
        if self.male == 0 {
            return Err(CampError::ZeroRooms("male"));
        }
        if self.female == 0 {
            return Err(CampError::ZeroRooms("female"));
        }
        Ok(())
    }
}

/// Sizes for `count` rooms over `total` people: `total / count` each, with
/// the first `total % count` rooms one larger.
pub fn room_sizes(total: usize, count: usize) -> Vec<usize> {
    let base = total / count;
    let extra = total % count;
    (0..count)
        .map(|i| base + usize::from(i < extra))
        .collect()
}

fn slice_into_rooms<R: Rng + ?Sized>(
    sex: Gender,
    mut subset: Vec<Attendee>,
    count: usize,
    rng: &mut R,
) -> Vec<Room> {
    subset.shuffle(rng);

    let mut rest = subset.into_iter();
    room_sizes(rest.len(), count)
        .into_iter()
        .enumerate()
        .map(|(i, size)| {
            let members: Vec<Attendee> = rest.by_ref().take(size).collect();
            Room {
                name: Room::room_name(&sex, i + 1),
                sex: sex.clone(),
                capacity: size,
                members,
            }
        })
        .collect()
}

/// Split attendees by sex into the requested number of male and female rooms.
///
/// Male rooms come first in the returned list, then female rooms. Attendees
/// whose gender is neither are appended round-robin over that combined list,
/// indexed by their position in `attendees`.
pub fn allocate_rooms<R: Rng + ?Sized>(
    attendees: &[Attendee],
    counts: RoomCounts,
    rng: &mut R,
) -> Result<Vec<Room>> {
    counts.validate()?;

    let males: Vec<Attendee> = attendees
        .iter()
        .filter(|a| a.gender == Gender::Male)
        .cloned()
        .collect();
    let females: Vec<Attendee> = attendees
        .iter()
        .filter(|a| a.gender == Gender::Female)
        .cloned()
        .collect();

    debug!(male = males.len(), female = females.len(), "Split roster by gender");

    let mut rooms = slice_into_rooms(Gender::Male, males, counts.male, rng);
    rooms.extend(slice_into_rooms(Gender::Female, females, counts.female, rng));

    let room_total = rooms.len();
    for (position, attendee) in attendees.iter().enumerate() {
        if let Gender::Other(raw) = &attendee.gender {
            let room = &mut rooms[position % room_total];
            warn!(
                serial = %attendee.serial,
                gender = %raw,
                room = %room.name,
                "Unrecognised gender, placing round-robin"
            );
            room.members.push(attendee.clone());
        }
    }

    info!(
        male_rooms = counts.male,
        female_rooms = counts.female,
        attendees = attendees.len(),
        "Room allocation complete"
    );
    Ok(rooms)
}
