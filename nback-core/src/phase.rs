use serde::{Deserialize, Serialize};

/// Which session is being run. Each mode selects its own fixture file,
/// output directory and pre-sequence screen arrangement; the trial logic
/// is identical across all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// In-scanner session, fixture covers both run halves (A then B).
    Scanner,
    /// Behavioral practice outside the scanner.
    Practice,
    /// Backup session covering the B half only.
    Backup,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Scanner => "Scanner",
            RunMode::Practice => "Practice",
            RunMode::Backup => "Backup",
        }
    }
}

/// Screens a run moves through, in order. `Trials` covers the whole
/// stimulus/fixation sequence; the mid-run pause in Scanner mode is a
/// sub-state of the driver, not a phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Instructions,
    ExperimenterWait,
    TriggerWait,
    Trials,
    Thanks,
    Done,
}

impl RunPhase {
    /// Entry screen for a mode: Backup skips the instructions, the other
    /// two start with them.
    pub fn first(mode: RunMode) -> Self {
        match mode {
            RunMode::Scanner | RunMode::Practice => RunPhase::Instructions,
            RunMode::Backup => RunPhase::ExperimenterWait,
        }
    }

    /// Next screen for a mode. Practice goes straight from the
    /// instructions into the trials, with no experimenter/trigger waits.
    pub fn next(self, mode: RunMode) -> Self {
        use RunPhase::*;
        match (self, mode) {
            (Instructions, RunMode::Practice) => Trials,
            (Instructions, _) => ExperimenterWait,
            (ExperimenterWait, _) => TriggerWait,
            (TriggerWait, _) => Trials,
            (Trials, _) => Thanks,
            (Thanks, _) => Done,
            (Done, _) => Done,
        }
    }

    pub fn is_trials(&self) -> bool {
        matches!(self, RunPhase::Trials)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, RunPhase::Done)
    }
}
