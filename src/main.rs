//! # task-export
//!
//! Export the tasks of a project from an Asana-style task API into a report
//! for human review.
//!
//! Each top-level task is fetched together with its stories and, recursively,
//! its subtasks. Open and closed tasks are reported separately: open tasks
//! newest-created first, closed tasks most recently completed first. Every task
//! becomes one row, followed directly by the rows of its subtasks (indented).
//!
//! ## Usage
//!
//! ```bash
//! # CSV report
//! task-export <API_KEY> <PROJECT_ID> tasks.csv
//!
//! # Excel workbook with "Open Tasks <date>" and "Closed Tasks <date>" sheets
//! task-export <API_KEY> <PROJECT_ID> tasks.xlsx
//! ```
//!
//! Columns: Task Name, Created On, Assignee, Due Date, Description, Status,
//! Complete Date, Comments. Status is `Completed`, `Overdue` (open and past its
//! due date) or empty. Comments are listed as `[date] author: text`, one per line.
//!
//! Set `RUST_LOG=debug` to trace every request.

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod api;
pub mod cli;
pub mod cmd;
pub mod error;
pub mod export;
pub mod fields;
pub mod report;
pub mod story;
pub mod task;

use api::ApiClient;
use cli::Cli;
use cmd::run_export;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let client = match ApiClient::new(cli.api_config()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to set up API client: {}", e);
            std::process::exit(1);
        }
    };

    let today = Local::now().date_naive();
    match run_export(&client, &cli.project_id, &cli.output, today) {
        Ok(summary) => {
            println!(
                "Exported {} task row(s) ({} open, {} closed tasks) to {}",
                summary.rows,
                summary.open_tasks,
                summary.closed_tasks,
                cli.output.display()
            );
        }
        Err(e) => {
            eprintln!("Export failed: {}", e);
            std::process::exit(1);
        }
    }
}
