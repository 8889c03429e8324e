use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use nback_core::{SummaryRecord, TrialRecord};

/// Owns the per-trial table and knows where both output files go. Rows are
/// appended in memory as trials complete; `flush_partial` persists what is
/// there (the abort path), `finish` writes both files at run end.
#[derive(Debug)]
pub struct ResultsWriter {
    trial_path: PathBuf,
    summary_path: PathBuf,
    records: Vec<TrialRecord>,
}

impl ResultsWriter {
    pub fn new(trial_path: PathBuf, summary_path: PathBuf) -> Self {
        Self {
            trial_path,
            summary_path,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Index for the next appended row.
    pub fn next_index(&self) -> usize {
        self.records.len()
    }

    /// Persist the per-trial table as collected so far. Used on abort, so
    /// an interrupted run still leaves its data on disk.
    pub fn flush_partial(&self) -> Result<()> {
        self.write_trials()
    }

    /// Persist the per-trial table and the one-row summary.
    pub fn finish(&self, summary: &SummaryRecord) -> Result<()> {
        self.write_trials()?;

        ensure_parent(&self.summary_path)?;
        let mut writer = csv::Writer::from_path(&self.summary_path)
            .with_context(|| format!("creating {}", self.summary_path.display()))?;
        writer.serialize(summary)?;
        writer.flush()?;
        info!("wrote summary to {}", self.summary_path.display());
        Ok(())
    }

    fn write_trials(&self) -> Result<()> {
        ensure_parent(&self.trial_path)?;
        let mut writer = csv::Writer::from_path(&self.trial_path)
            .with_context(|| format!("creating {}", self.trial_path.display()))?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        info!(
            "wrote {} trial rows to {}",
            self.records.len(),
            self.trial_path.display()
        );
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    Ok(())
}
