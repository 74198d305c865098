use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{CampError, Result};
use crate::io::workbook::sanitize_sheet_name;

/// Parse a group-name list: one name per line, trimmed, blank lines skipped.
pub fn parse_group_names(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reject names that land on the same worksheet once sanitised. Excel
/// compares sheet names case-insensitively.
pub fn validate_group_names(names: &[String]) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(names.len());
    for name in names {
        let sheet = sanitize_sheet_name(name);
        if let Some(first) = seen.insert(sheet.to_lowercase(), name) {
            return Err(CampError::GroupNameClash {
                first: first.to_string(),
                second: name.clone(),
                sheet,
            });
        }
    }
    Ok(())
}

/// Load the group-name list. An empty list, or names that would collide as
/// sheet names, are rejected here so no workbook is written.
pub fn load_group_names(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(CampError::FileNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    let names = parse_group_names(&contents);
    if names.is_empty() {
        return Err(CampError::NoGroups);
    }
    validate_group_names(&names)?;

    debug!(path = %path.display(), count = names.len(), "Loaded group names");
    Ok(names)
}
