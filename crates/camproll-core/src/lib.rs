//! camproll core library.
//!
//! Turns a camp attendee roster into balanced discussion groups and
//! single-sex rooms, joins both back onto the roster, and prints colour-coded
//! ID cards per group.
//!
//! # Modules
//!
//! - `models`: roster, attendee, group and room types
//! - `allocation`: group and room allocators
//! - `merge`: master roster assembly
//! - `cards`: card layout and PDF rendering
//! - `io`: workbook and group-name file access
//! - `pipeline`: stage orchestration
//! - `config`, `prompt`: run configuration and operator input

pub mod allocation;
pub mod cards;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod utils;

pub use allocation::{allocate_groups, allocate_rooms, RoomCounts};
pub use cards::{CardLayout, CardRenderer, DocumentSink, PdfSink};
pub use config::Config;
pub use error::{CampError, Result};
pub use merge::merge_roster;
pub use models::{Attendee, Cohort, FinalRoster, Gender, Group, Room, RoomMapping, Roster};
pub use pipeline::{Pipeline, PipelineReport, Stage, StageResult, StageSummary};
pub use prompt::{FixedRoomCounts, InteractivePrompt, RoomCountProvider};
