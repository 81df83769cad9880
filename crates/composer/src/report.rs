use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::assets::AssetsPresent;
use crate::command::CompositionOptions;
use crate::error::SubmitError;
use crate::submit::CompositionOutput;

/// Record of one submission, written next to the output on request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    // Identity
    pub id: String,

    // Timestamps
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    // Inputs
    pub options: CompositionOptions,
    pub assets: AssetsPresent,

    // Outcome
    pub status: SubmissionStatus,
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Running,
    Succeeded,
    Failed,
}

impl SubmissionReport {
    pub fn begin(options: CompositionOptions, assets: AssetsPresent, command: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            options,
            assets,
            status: SubmissionStatus::Running,
            command,
            output_bytes: None,
            error: None,
        }
    }

    pub fn succeed(&mut self, output: &CompositionOutput) {
        self.status = SubmissionStatus::Succeeded;
        self.finished_at = Some(Utc::now());
        self.command = output.command.clone();
        self.output_bytes = Some(output.bytes.len() as u64);
    }

    pub fn fail(&mut self, err: &SubmitError) {
        self.fail_with(err.to_string());
    }

    /// Record a failure that happened outside the submission itself,
    /// e.g. while delivering the output
    pub fn fail_with(&mut self, message: impl Into<String>) {
        self.status = SubmissionStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.output_bytes = None;
        self.error = Some(message.into());
    }
}

pub fn save_report(report: &SubmissionReport, path: &Path) -> Result<()> {
    use std::fs;
    use std::io::Write;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(report)?;

    // Write atomically using a temporary file
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_file = Path::new(&temp_name);

    let mut file = fs::File::create(temp_file)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp_file, path)?;

    Ok(())
}

pub fn load_report(path: &Path) -> Result<SubmissionReport> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
