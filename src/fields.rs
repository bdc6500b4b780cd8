//! Enumerations shared across the export pipeline.
//!
//! This module defines the story kinds reported by the API, the derived status
//! label shown in each report row, and the output formats the exporter can write.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

/// Type of a story attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum StoryKind {
    /// A user-authored comment; the only kind rendered into reports.
    Comment,
    /// A system-generated event (assignment, due date change, ...).
    System,
    /// Any other story type, kept verbatim.
    Other(String),
}

impl From<String> for StoryKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "comment" => StoryKind::Comment,
            "system" => StoryKind::System,
            _ => StoryKind::Other(s),
        }
    }
}

impl From<&str> for StoryKind {
    fn from(s: &str) -> Self {
        StoryKind::from(s.to_string())
    }
}

/// Status label derived for a report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Completed,
    Overdue,
    None,
}

impl RowStatus {
    pub fn label(self) -> &'static str {
        match self {
            RowStatus::Completed => "Completed",
            RowStatus::Overdue => "Overdue",
            RowStatus::None => "",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// File format of the generated report, chosen from the output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Workbook,
}

impl OutputFormat {
    /// `.xlsx` and `.xls` (any case) select a workbook; everything else is CSV.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("xlsx") | Some("xls") => OutputFormat::Workbook,
            _ => OutputFormat::Csv,
        }
    }
}
