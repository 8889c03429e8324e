use serde::{Deserialize, Serialize};

/// Per-trial display states. The response window opens at stimulus onset
/// and stays open through the fixation display; classification takes the
/// trial away, so there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Stimulus,
    Fixation,
}

/// Run-half marker carried by the Scanner fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunHalf {
    A,
    B,
}

/// One row of the trial fixture. Rows come in (stimulus, fixation) pairs;
/// the expected-answer columns are only meaningful on the stimulus row.
///
/// `corr_resp_left` is the scoring column: `None` marks a non-scored row
/// (instruction slide), `Some(0)` means no response is expected, any other
/// value is a key the subject should press.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrialRow {
    pub image_name: String,
    /// Display duration in seconds.
    pub trial_dur: f64,
    /// Expected right-hand key, if any.
    #[serde(default)]
    pub corr_resp: Option<u32>,
    /// Expected left-hand key; see type-level docs.
    #[serde(default)]
    pub corr_resp_left: Option<u32>,
    /// 1 on the first trial of a block.
    #[serde(default)]
    pub new_block: u8,
    /// Run-half indicator, Scanner fixture only.
    #[serde(default, rename = "A_or_B")]
    pub run_half: Option<RunHalf>,
}

impl TrialRow {
    /// Whether this row participates in classification at all.
    pub fn is_scored(&self) -> bool {
        self.corr_resp_left.is_some()
    }

    pub fn opens_block(&self) -> bool {
        self.new_block == 1
    }
}

/// A stimulus row and its paired fixation row, consumed together.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialPair {
    pub stimulus: TrialRow,
    pub fixation: TrialRow,
}
