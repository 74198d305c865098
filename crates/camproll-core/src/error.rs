use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CampError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("Missing required column '{column}' in sheet '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    #[error("No group names configured - at least one group is required")]
    NoGroups,

    #[error("Group names '{first}' and '{second}' would share the sheet '{sheet}'")]
    GroupNameClash {
        first: String,
        second: String,
        sheet: String,
    },

    #[error("Room count for {0} attendees must be at least 1")]
    ZeroRooms(&'static str),

    #[error("Operator input ended before room counts were supplied")]
    PromptClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read workbook: {0}")]
    WorkbookRead(#[from] calamine::Error),

    #[error("Failed to write workbook: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to render PDF: {0}")]
    Pdf(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<CampError>,
    },
}

pub type Result<T> = std::result::Result<T, CampError>;

impl CampError {
    /// Wrap an error with the name of the pipeline stage that raised it.
    pub fn in_stage(stage: &'static str, source: CampError) -> Self {
        CampError::Stage {
            stage,
            source: Box::new(source),
        }
    }

    /// Name of the failing stage, if this error came out of the pipeline.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            CampError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}
