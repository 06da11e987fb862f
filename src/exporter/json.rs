// file: src/exporter/json.rs
// description: json export of search runs

use crate::error::Result;
use crate::pipeline::PipelineOutput;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ReportExporter {
    output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ExportedReport<'a> {
    pub run_id: String,
    pub exported_at: String,
    #[serde(flatten)]
    pub output: &'a PipelineOutput,
}

impl ReportExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Writes `search-<timestamp>-<id>.json` and returns its path.
    pub fn export(&self, output: &PipelineOutput, pretty: bool) -> Result<PathBuf> {
        let now = Utc::now();
        let run_id = Uuid::new_v4().to_string();

        let report = ExportedReport {
            run_id: run_id.clone(),
            exported_at: now.to_rfc3339(),
            output,
        };

        let body = if pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };

        let file_name = format!(
            "search-{}-{}.json",
            now.format("%Y%m%dT%H%M%S"),
            &run_id[..8]
        );
        let path = self.output_dir.join(file_name);
        fs::write(&path, body)?;

        info!(
            "Exported {} companies to {}",
            output.companies.len(),
            path.display()
        );
        Ok(path)
    }
}
