use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CampError, Result};
use crate::io::Sheet;

/// Identifier column, required on every roster sheet
pub const SERIAL_COLUMN: &str = "S. No.";
pub const NAME_COLUMN: &str = "Name";
pub const GENDER_COLUMN: &str = "Gender";
pub const CHURCH_COLUMN: &str = "Church";
pub const LOCATION_COLUMN: &str = "Location";

/// A single spreadsheet cell, kept as read so extra columns round-trip untouched.
///
/// Dates and durations keep the workbook's serial number (days since
/// 1899-12-30) so they are written back as the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(f64),
    Duration(f64),
}

const MS_PER_DAY: f64 = 86_400_000.0;

fn excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Calendar date-time of a workbook date serial.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let millis = TimeDelta::try_milliseconds((serial * MS_PER_DAY).round() as i64)?;
    excel_epoch()?.checked_add_signed(millis)
}

/// Workbook date serial of a calendar date-time.
pub fn datetime_to_serial(datetime: NaiveDateTime) -> Option<f64> {
    let delta = datetime.signed_duration_since(excel_epoch()?);
    Some(delta.num_milliseconds() as f64 / MS_PER_DAY)
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) | CellValue::DateTime(n) | CellValue::Duration(n) => n.is_nan(),
            CellValue::Bool(_) => false,
        }
    }

    /// Non-empty text form of the cell.
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Parse an ISO 8601 date or date-time (`2008-05-17`, `2008-05-17T10:30:00`).
    pub fn from_iso_datetime(raw: &str) -> Option<Self> {
        let datetime = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })?;
        datetime_to_serial(datetime).map(CellValue::DateTime)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            // Integral numbers print without ".0" so serials read as 12 and "12" match
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(serial) => match serial_to_datetime(*serial) {
                Some(dt) if serial.fract() == 0.0 => write!(f, "{}", dt.format("%Y-%m-%d")),
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{}", serial),
            },
            CellValue::Duration(days) => {
                let total = (days * 86_400.0).round() as i64;
                write!(f, "{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other(String),
}

impl Gender {
    /// Parse a gender cell. Comparison is case-insensitive; anything
    /// unrecognised is kept as `Other` with the raw value.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Other(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// One roster row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub serial: String,
    pub name: Option<String>,
    pub gender: Gender,
    pub church: Option<String>,
    pub location: Option<String>,
    /// Every cell of the row, aligned with the roster's column list
    pub cells: Vec<CellValue>,
}

impl Attendee {
    /// The uniqueness key used by group allocation: church first, location as fallback.
    pub fn origin_key(&self) -> Option<&str> {
        self.church
            .as_deref()
            .or(self.location.as_deref())
    }

    /// Whether this attendee's church or location equals `key`.
    pub fn has_origin_value(&self, key: &str) -> bool {
        self.church.as_deref() == Some(key) || self.location.as_deref() == Some(key)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("N/A")
    }
}

/// Column layout of a roster sheet, resolved once per sheet.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    serial: usize,
    name: Option<usize>,
    gender: Option<usize>,
    church: Option<usize>,
    location: Option<usize>,
}

impl ColumnIndex {
    fn resolve(sheet: &Sheet) -> Result<Self> {
        let serial = sheet
            .column(SERIAL_COLUMN)
            .ok_or_else(|| CampError::MissingColumn {
                sheet: sheet.name.clone(),
                column: SERIAL_COLUMN.to_string(),
            })?;

        Ok(Self {
            serial,
            name: sheet.column(NAME_COLUMN),
            gender: sheet.column(GENDER_COLUMN),
            church: sheet.column(CHURCH_COLUMN),
            location: sheet.column(LOCATION_COLUMN),
        })
    }

    fn text(row: &[CellValue], index: Option<usize>) -> Option<String> {
        index
            .and_then(|i| row.get(i))
            .and_then(CellValue::as_text)
    }

    fn attendee(&self, row: &[CellValue], width: usize) -> Attendee {
        let mut cells = row.to_vec();
        cells.resize(width, CellValue::Empty);

        let gender = Self::text(row, self.gender)
            .map(|g| Gender::parse(&g))
            .unwrap_or_else(|| Gender::Other(String::new()));

        Attendee {
            serial: Self::text(row, Some(self.serial)).unwrap_or_default(),
            name: Self::text(row, self.name),
            gender,
            church: Self::text(row, self.church),
            location: Self::text(row, self.location),
            cells,
        }
    }
}

/// The attendee dataset with its original column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub columns: Vec<String>,
    pub attendees: Vec<Attendee>,
}

impl Roster {
    /// Build a roster from a sheet. Only the identifier column is required;
    /// a sheet without a header row is an empty roster.
    ///
    /// Rows with every cell blank are not attendees and are dropped, so the
    /// roster (and every output built from it) can be shorter than the
    /// sheet. The number dropped is logged.
    pub fn from_sheet(sheet: &Sheet) -> Result<Self> {
        if sheet.columns.is_empty() {
            return Ok(Self::default());
        }

        let index = ColumnIndex::resolve(sheet)?;
        let width = sheet.columns.len();
        let attendees: Vec<Attendee> = sheet
            .rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|row| index.attendee(row, width))
            .collect();

        let blank = sheet.rows.len() - attendees.len();
        if blank > 0 {
            debug!(sheet = %sheet.name, blank, "Skipped blank rows");
        }

        Ok(Self {
            columns: sheet.columns.clone(),
            attendees,
        })
    }

    /// Sheet holding `attendees` under this roster's columns.
    pub fn sheet_for(&self, name: &str, attendees: &[Attendee]) -> Sheet {
        Sheet {
            name: name.to_string(),
            columns: self.columns.clone(),
            rows: attendees.iter().map(|a| a.cells.clone()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.attendees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attendees.is_empty()
    }
}
