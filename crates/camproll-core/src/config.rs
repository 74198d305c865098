//! Run configuration.
//!
//! Configuration is JSON with every field optional. It is looked up at an
//! explicit path, then `./camproll.json`, then
//! `~/.config/camproll/config.json`; with none present the defaults apply.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cards::CardLayout;
use crate::error::{CampError, Result};

/// Application name used for the config directory path
const APP_NAME: &str = "camproll";

/// Config file name inside the config directory
const CONFIG_FILE: &str = "config.json";

/// Config file name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "camproll.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master roster workbook
    pub roster_path: PathBuf,
    /// Sheet of the roster workbook holding attendees; also the final sheet name
    pub roster_sheet: String,
    /// One group name per line
    pub group_names_path: PathBuf,
    pub group_output: PathBuf,
    pub room_output: PathBuf,
    pub final_output: PathBuf,
    pub card_dir: PathBuf,
    /// Fixed seed for reproducible allocations
    pub seed: Option<u64>,
    pub cards: CardLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roster_path: PathBuf::from("attendees.xlsx"),
            roster_sheet: "Outsiders".to_string(),
            group_names_path: PathBuf::from("groups.txt"),
            group_output: PathBuf::from("group_data.xlsx"),
            room_output: PathBuf::from("rooms_data.xlsx"),
            final_output: PathBuf::from("final_data.xlsx"),
            card_dir: PathBuf::from("id_cards"),
            seed: None,
            cards: CardLayout::default(),
        }
    }
}

impl Config {
    /// Load from `explicit` if given (it must exist), otherwise from the
    /// first config file found on the search path, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CampError::FileNotFound(path.to_path_buf()));
            }
            return Self::load_from(path);
        }

        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_NAME).join(CONFIG_FILE));
        }
        paths
    }

    /// Reject values that would only fail later, mid-pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.roster_sheet.trim().is_empty() {
            return Err(CampError::InvalidConfig("roster_sheet is empty".to_string()));
        }
        self.cards.validate()
    }

    /// Seeded RNG when a seed is configured, entropy otherwise.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Output path of a group's card sheet.
    pub fn card_path(&self, group_name: &str) -> PathBuf {
        let file_stem: String = group_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.card_dir.join(format!("{}.pdf", file_stem))
    }
}
