use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::{ApplyReport, ResolvedOutput};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::stack::Target;

/// Record of a successful deploy, written next to the config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub stack: String,
    pub region: String,
    pub account: String,
    pub backend: String,
    pub deployed_at: DateTime<Utc>,
    /// Node ids in the order they were applied
    pub order: Vec<String>,
    pub outputs: Vec<ResolvedOutput>,
}

impl DeploymentReport {
    pub fn new(stack: &str, target: &Target, backend: &str, report: &ApplyReport) -> Self {
        Self {
            stack: stack.to_string(),
            region: target.region.clone(),
            account: target.account.clone(),
            backend: backend.to_string(),
            deployed_at: Utc::now(),
            order: report.order.clone(),
            outputs: report.outputs.clone(),
        }
    }

    /// Look up an output value by name
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }

    /// Load a report from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read report: {}", path.display()))?;
        let report = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse report: {}", path.display()))?;
        log::debug!("Loaded report from {}", path.display());
        Ok(report)
    }

    /// Save the report, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        log::debug!("Saved report to {}", path.display());
        Ok(())
    }
}
