use std::path::PathBuf;

use chrono::Local;
use nback_core::RunMode;

/// Everything the driver needs to know before the first screen goes up:
/// who is being tested, which session this is, and where files live.
/// Built once at startup and passed in, nothing global.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub participant: String,
    pub mode: RunMode,
    /// Directory holding the per-mode fixture CSVs.
    pub fixture_dir: PathBuf,
    /// Root under which the per-mode output directories are created.
    pub output_root: PathBuf,
    /// Timestamp baked into output filenames, `YYYY_Mon_DD_HHMM`.
    pub session_date: String,
}

impl TaskConfig {
    pub fn new(
        participant: impl Into<String>,
        mode: RunMode,
        fixture_dir: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            participant: participant.into(),
            mode,
            fixture_dir: fixture_dir.into(),
            output_root: output_root.into(),
            session_date: Local::now().format("%Y_%b_%d_%H%M").to_string(),
        }
    }

    pub fn fixture_path(&self) -> PathBuf {
        let file = match self.mode {
            RunMode::Scanner => "nback_AB.csv",
            RunMode::Practice => "nback_practice.csv",
            RunMode::Backup => "nback_B.csv",
        };
        self.fixture_dir.join(file)
    }

    pub fn output_dir(&self) -> PathBuf {
        match self.mode {
            RunMode::Scanner => self.output_root.join("tfMRI_output"),
            RunMode::Practice => self.output_root.join("practice"),
            RunMode::Backup => self.output_root.join("tfMRI_output").join("backup"),
        }
    }

    fn base_name(&self) -> String {
        format!("{}_Nback_{}", self.participant, self.session_date)
    }

    pub fn trial_output_path(&self) -> PathBuf {
        self.output_dir().join(format!("{}.csv", self.base_name()))
    }

    pub fn summary_output_path(&self) -> PathBuf {
        self.output_dir()
            .join(format!("{}_Summary.csv", self.base_name()))
    }
}
