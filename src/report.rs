//! Flattening task trees into report rows and ordering the top-level tasks.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::fields::RowStatus;
use crate::task::TaskRecord;

/// Column headers, in row order.
pub const HEADER: [&str; 8] = [
    "Task Name",
    "Created On",
    "Assignee",
    "Due Date",
    "Description",
    "Status",
    "Complete Date",
    "Comments",
];

/// Prefix applied to every subtask name, whatever its depth.
pub const SUBTASK_INDENT: &str = "    ";

/// One rendered line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub created_on: Option<NaiveDate>,
    pub assignee: String,
    pub due_on: Option<NaiveDate>,
    pub description: String,
    pub status: RowStatus,
    pub completed_on: Option<NaiveDate>,
    pub comments: Option<String>,
}

/// A single report cell, before format-specific rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Date(NaiveDate),
    Empty,
}

impl ReportRow {
    pub fn cells(&self) -> [Cell<'_>; 8] {
        fn date(d: Option<NaiveDate>) -> Cell<'static> {
            d.map_or(Cell::Empty, Cell::Date)
        }
        [
            Cell::Text(&self.name),
            date(self.created_on),
            Cell::Text(&self.assignee),
            date(self.due_on),
            Cell::Text(&self.description),
            Cell::Text(self.status.label()),
            date(self.completed_on),
            self.comments.as_deref().map_or(Cell::Empty, Cell::Text),
        ]
    }
}

/// Derive the status label of a task as of `today`.
pub fn task_status(task: &TaskRecord, today: NaiveDate) -> RowStatus {
    if task.completed() {
        RowStatus::Completed
    } else if task.due_on().is_some_and(|due| due < today) {
        RowStatus::Overdue
    } else {
        RowStatus::None
    }
}

/// Flatten a task tree into rows, pre-order depth-first.
///
/// The node's own row comes first, followed by each subtask's rows in order.
pub fn flatten(task: &TaskRecord, depth: usize, today: NaiveDate) -> Vec<ReportRow> {
    let mut rows = Vec::with_capacity(task.node_count());
    flatten_into(task, depth, today, &mut rows);
    rows
}

fn flatten_into(task: &TaskRecord, depth: usize, today: NaiveDate, rows: &mut Vec<ReportRow>) {
    let name = if depth > 0 {
        format!("{}{}", SUBTASK_INDENT, task.name())
    } else {
        task.name().to_string()
    };

    rows.push(ReportRow {
        name,
        created_on: task.created_at(),
        assignee: task.assignee().to_string(),
        due_on: task.due_on(),
        description: task.description().to_string(),
        status: task_status(task, today),
        completed_on: task.completed_on(),
        comments: task.stories().comment_text(),
    });

    for subtask in task.subtasks() {
        flatten_into(subtask, depth + 1, today, rows);
    }
}

/// Flatten a list of top-level tasks, concatenating their rows.
pub fn flatten_all(tasks: &[TaskRecord], today: NaiveDate) -> Vec<ReportRow> {
    tasks.iter().flat_map(|t| flatten(t, 0, today)).collect()
}

/// Descending order on an optional date with missing dates last.
fn desc_nulls_last(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Split tasks into `(open, closed)`.
///
/// Open tasks are sorted newest-created first, closed tasks most recently
/// completed first. Tasks without the sort date go last; ties keep input order.
pub fn partition_and_sort(tasks: Vec<TaskRecord>) -> (Vec<TaskRecord>, Vec<TaskRecord>) {
    let (mut closed, mut open): (Vec<_>, Vec<_>) =
        tasks.into_iter().partition(TaskRecord::completed);
    open.sort_by(|a, b| desc_nulls_last(a.created_at(), b.created_at()));
    closed.sort_by(|a, b| desc_nulls_last(a.completed_on(), b.completed_on()));
    (open, closed)
}
