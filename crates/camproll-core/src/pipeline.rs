//! Stage orchestration.
//!
//! The four stages run in a fixed order and hand off through files: each
//! stage reads what the previous one wrote, so any stage can also be run on
//! its own against existing outputs.

use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allocation::{allocate_groups, allocate_rooms};
use crate::cards::{CardRenderer, PdfSink};
use crate::config::Config;
use crate::error::{CampError, Result};
use crate::io::{load_group_names, read_sheet, read_workbook, write_workbook};
use crate::merge::merge_roster;
use crate::models::{Group, Room, RoomMapping, Roster};
use crate::prompt::RoomCountProvider;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Groups,
    Rooms,
    Merge,
    Cards,
}

impl Stage {
    /// Every stage, in run order.
    pub const ALL: [Stage; 4] = [Stage::Groups, Stage::Rooms, Stage::Merge, Stage::Cards];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Groups => "groups",
            Stage::Rooms => "rooms",
            Stage::Merge => "merge",
            Stage::Cards => "cards",
        }
    }

    /// Whether the stage waits on the operator.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Stage::Rooms)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a stage produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageSummary {
    Groups { groups: usize, attendees: usize },
    Rooms { rooms: usize, attendees: usize },
    Merge { rows: usize, grouped: usize, roomed: usize },
    Cards { files: usize, cards: usize, pages: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub stage: Stage,
    pub summary: StageSummary,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageResult>,
}

impl PipelineReport {
    pub fn total_duration_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.duration_ms).sum()
    }
}

fn load_roster(config: &Config) -> Result<Roster> {
    let sheet = read_sheet(&config.roster_path, &config.roster_sheet)?;
    Roster::from_sheet(&sheet)
}

fn load_groups(config: &Config) -> Result<Vec<Group>> {
    read_workbook(&config.group_output)?
        .iter()
        .map(|sheet| Ok(Group::from_roster(&sheet.name, Roster::from_sheet(sheet)?)))
        .collect()
}

fn load_rooms(config: &Config) -> Result<Vec<Room>> {
    read_workbook(&config.room_output)?
        .iter()
        .map(|sheet| Ok(Room::from_roster(&sheet.name, Roster::from_sheet(sheet)?)))
        .collect()
}

/// Allocate the roster into the named groups and write one sheet per group.
pub fn run_groups<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<StageSummary> {
    let roster = load_roster(config)?;
    let names = load_group_names(&config.group_names_path)?;
    let groups = allocate_groups(&roster.attendees, &names, rng)?;

    let sheets: Vec<_> = groups
        .iter()
        .map(|g| roster.sheet_for(&g.name, &g.members))
        .collect();
    write_workbook(&config.group_output, &sheets)?;

    info!(path = %config.group_output.display(), groups = groups.len(), "Group workbook written");
    Ok(StageSummary::Groups {
        groups: groups.len(),
        attendees: roster.len(),
    })
}

/// Ask for room counts, allocate rooms and write one sheet per room.
pub fn run_rooms<R: Rng + ?Sized>(
    config: &Config,
    provider: &mut dyn RoomCountProvider,
    rng: &mut R,
) -> Result<StageSummary> {
    let roster = load_roster(config)?;
    let counts = provider.room_counts()?;
    let rooms = allocate_rooms(&roster.attendees, counts, rng)?;

    let sheets: Vec<_> = rooms
        .iter()
        .map(|r| roster.sheet_for(&r.name, &r.members))
        .collect();
    write_workbook(&config.room_output, &sheets)?;

    let attendees = rooms.iter().map(|r| r.members.len()).sum();
    info!(path = %config.room_output.display(), rooms = rooms.len(), "Room workbook written");
    Ok(StageSummary::Rooms {
        rooms: rooms.len(),
        attendees,
    })
}

/// Join group and room names onto the roster and write the master workbook.
pub fn run_merge(config: &Config) -> Result<StageSummary> {
    let roster = load_roster(config)?;
    let groups = load_groups(config)?;
    let rooms = load_rooms(config)?;

    let merged = merge_roster(&roster, &groups, &rooms);
    write_workbook(&config.final_output, &[merged.to_sheet(&config.roster_sheet)])?;

    Ok(StageSummary::Merge {
        rows: merged.rows.len(),
        grouped: merged.rows.iter().filter(|r| !r.group_name.is_empty()).count(),
        roomed: merged.rows.iter().filter(|r| !r.room_name.is_empty()).count(),
    })
}

/// Render one PDF of ID cards per group.
pub fn run_cards(config: &Config) -> Result<StageSummary> {
    let groups = load_groups(config)?;
    let rooms = RoomMapping::from_rooms(&load_rooms(config)?);
    let renderer = CardRenderer::new(config.cards.clone());

    let mut cards = 0;
    let mut pages = 0;
    for group in &groups {
        let mut sink = PdfSink::new(config.card_path(&group.name));
        let summary = renderer.render_group(group, &rooms, &mut sink)?;
        info!(group = %group.name, path = %sink.path().display(), cards = summary.cards, "Card sheet written");
        cards += summary.cards;
        pages += summary.pages;
    }

    Ok(StageSummary::Cards {
        files: groups.len(),
        cards,
        pages,
    })
}

/// Runs stages against one configuration. Room counts come from `provider`.
pub struct Pipeline<'a> {
    config: &'a Config,
    provider: &'a mut dyn RoomCountProvider,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, provider: &'a mut dyn RoomCountProvider) -> Self {
        Self { config, provider }
    }

    /// Run a single stage. Failures come back as `CampError::Stage`.
    pub fn run_stage<R: Rng + ?Sized>(&mut self, stage: Stage, rng: &mut R) -> Result<StageResult> {
        info!(stage = %stage, "Executing stage");
        let start = Instant::now();

        let outcome = match stage {
            Stage::Groups => run_groups(self.config, rng),
            Stage::Rooms => run_rooms(self.config, &mut *self.provider, rng),
            Stage::Merge => run_merge(self.config),
            Stage::Cards => run_cards(self.config),
        };
        let summary = outcome.map_err(|e| CampError::in_stage(stage.name(), e))?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(stage = %stage, duration_ms, "Stage complete");
        Ok(StageResult {
            stage,
            summary,
            duration_ms,
        })
    }

    /// Run every stage in order, stopping at the first failure. Outputs of
    /// stages that already finished stay on disk.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<PipelineReport> {
        let started_at = Utc::now();
        info!("Starting pipeline");

        let mut stages = Vec::with_capacity(Stage::ALL.len());
        for stage in Stage::ALL {
            stages.push(self.run_stage(stage, rng)?);
        }

        let report = PipelineReport {
            started_at,
            finished_at: Utc::now(),
            stages,
        };
        info!(duration_ms = report.total_duration_ms(), "Pipeline complete");
        Ok(report)
    }
}
