//! Allocation of attendees into activity groups and sleeping rooms.
//!
//! Both allocators take the randomness source as a parameter so a run can
//! be reproduced from a seed.

pub mod groups;
pub mod rooms;

pub use groups::allocate_groups;
pub use rooms::{allocate_rooms, room_sizes, RoomCounts};
