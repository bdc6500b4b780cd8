//! The export command: fetch the project tree, order it, flatten it and write
//! the report.

use std::path::Path;

use chrono::NaiveDate;

use crate::api::Fetch;
use crate::error::ExportError;
use crate::export::write_report;
use crate::fields::OutputFormat;
use crate::report::{flatten_all, partition_and_sort};
use crate::task::build_project;

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub format: OutputFormat,
    pub open_tasks: usize,
    pub closed_tasks: usize,
    pub rows: usize,
}

/// Export every task of `project_id` to `output`.
///
/// Only a failure to fetch the project task list or to write the output is
/// returned as an error; missing details, stories or subtasks are logged and
/// left out of the report.
pub fn run_export(
    fetch: &dyn Fetch,
    project_id: &str,
    output: &Path,
    today: NaiveDate,
) -> Result<ExportSummary, ExportError> {
    let tasks = build_project(fetch, project_id).map_err(ExportError::TaskList)?;
    let (open, closed) = partition_and_sort(tasks);
    tracing::info!(open = open.len(), closed = closed.len(), "Built task trees");

    let open_rows = flatten_all(&open, today);
    let closed_rows = flatten_all(&closed, today);

    let format = OutputFormat::from_path(output);
    let rows = write_report(output, format, &open_rows, &closed_rows, today)?;
    tracing::info!(path = %output.display(), ?format, rows, "Report written");

    Ok(ExportSummary {
        format,
        open_tasks: open.len(),
        closed_tasks: closed.len(),
        rows,
    })
}
