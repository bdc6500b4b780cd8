use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::api::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS};

/// Export a project's tasks, subtasks and comments to CSV or Excel.
/// The output format follows the file extension: .xlsx/.xls for a workbook, CSV otherwise.
#[derive(Parser, Debug)]
#[command(name = "task-export", version, about = "Export project tasks to CSV or Excel")]
pub struct Cli {
    /// API key, sent as the basic-auth username.
    pub api_key: String,

    /// Project whose tasks are exported.
    pub project_id: String,

    /// Output file (.xlsx/.xls for a workbook, anything else for CSV).
    pub output: PathBuf,

    /// Base URL of the task API.
    #[arg(long, env = "TASK_EXPORT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Extra attempts for a request that failed on the network or with a 5xx.
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,
}

impl Cli {
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.retries,
            ..ApiConfig::new(self.api_key.clone())
        }
    }
}
