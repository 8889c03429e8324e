use serde::{Deserialize, Serialize};

use crate::stats::{RunningTotals, Statistics, TrialCounts};

/// One row of the per-trial output table. Column names match the legacy
/// task's files so downstream analysis scripts keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Leading index column, one per appended row.
    pub trial: usize,
    /// JSON-encoded list of (key, reaction time) pairs seen in the window.
    pub subj_key_resp: String,
    pub subj_key_resp_first: Option<u32>,
    pub rxn_time: Option<f64>,
    pub corr_resp: Option<u32>,
    pub corr_resp_left: Option<u32>,
    /// Block clock reading, present only on trials that open a block.
    pub running_time: Option<f64>,
    pub hits: u32,
    pub corr_skips: u32,
    pub false_alarm: u32,
    pub misses: u32,
    pub total_hits: u32,
    pub total_corr_skips: u32,
    pub total_false_alarm: u32,
    pub total_misses: u32,
    pub overall_accuracy: Option<f64>,
    pub hit_accuracy: Option<f64>,
    pub false_alarm_rate: Option<f64>,
    pub avg_rxn_time: Option<f64>,
}

impl TrialRecord {
    pub fn counts(&self) -> TrialCounts {
        TrialCounts {
            hits: self.hits,
            correct_skips: self.corr_skips,
            false_alarms: self.false_alarm,
            misses: self.misses,
        }
    }
}

/// The single summary row written at run end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub total_hits: u32,
    pub total_corr_skips: u32,
    pub total_false_alarm: u32,
    pub total_misses: u32,
    pub total_accuracy: Option<f64>,
    pub hit_accuracy: Option<f64>,
    pub false_alarm_rate: Option<f64>,
    pub avg_rxn_time: Option<f64>,
}

impl SummaryRecord {
    pub fn new(totals: &RunningTotals, stats: &Statistics) -> Self {
        Self {
            total_hits: totals.hits,
            total_corr_skips: totals.correct_skips,
            total_false_alarm: totals.false_alarms,
            total_misses: totals.misses,
            total_accuracy: stats.overall_accuracy,
            hit_accuracy: stats.hit_rate,
            false_alarm_rate: stats.false_alarm_rate,
            avg_rxn_time: stats.mean_rt,
        }
    }
}
