use crate::outcome::Outcome;

/// Per-trial counts, each 0 or 1. Written out alongside the running totals
/// so a single output row shows both what this trial was and where the run
/// stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialCounts {
    pub hits: u32,
    pub correct_skips: u32,
    pub false_alarms: u32,
    pub misses: u32,
}

impl TrialCounts {
    pub fn from_outcome(outcome: Outcome) -> Self {
        let mut counts = Self::default();
        match outcome {
            Outcome::NoScore => {}
            Outcome::Hit => counts.hits = 1,
            Outcome::CorrectSkip => counts.correct_skips = 1,
            Outcome::FalseAlarm => counts.false_alarms = 1,
            Outcome::Miss => counts.misses = 1,
        }
        counts
    }
}

/// Monotone counters accumulated across the whole run. Never reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningTotals {
    pub hits: u32,
    pub correct_skips: u32,
    pub false_alarms: u32,
    pub misses: u32,
    /// Sum of first-press reaction times, seconds.
    pub rt_sum: f64,
    /// Number of trials with a press, scored or not.
    pub responses: u32,
}

impl RunningTotals {
    /// Fold one classified trial in. Scored outcomes bump exactly one
    /// counter; `NoScore` bumps none.
    pub fn record(&mut self, outcome: Outcome) -> TrialCounts {
        let counts = TrialCounts::from_outcome(outcome);
        self.hits += counts.hits;
        self.correct_skips += counts.correct_skips;
        self.false_alarms += counts.false_alarms;
        self.misses += counts.misses;
        counts
    }

    /// Accumulate a first-press reaction time. This is fed for every trial
    /// with a press, including non-scored instruction rows, so the mean RT
    /// matches files produced by the legacy task.
    pub fn record_reaction_time(&mut self, rt_seconds: f64) {
        self.rt_sum += rt_seconds;
        self.responses += 1;
    }

    /// Number of classified trials so far.
    pub fn scored_trials(&self) -> u32 {
        self.hits + self.correct_skips + self.false_alarms + self.misses
    }
}

/// The four derived statistics, recomputed fresh from the totals after each
/// trial. Each is `None` when its denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// (hits + correct skips) * 100 / all scored trials.
    pub overall_accuracy: Option<f64>,
    /// hits * 100 / (hits + misses).
    pub hit_rate: Option<f64>,
    /// false alarms * 100 / (false alarms + correct skips).
    pub false_alarm_rate: Option<f64>,
    /// Mean first-press reaction time, seconds.
    pub mean_rt: Option<f64>,
}

impl Statistics {
    /// Pure function of the totals: calling it twice on the same totals
    /// yields identical values.
    pub fn from_totals(totals: &RunningTotals) -> Self {
        let total = totals.scored_trials();
        let positives = totals.hits + totals.misses;
        let negatives = totals.false_alarms + totals.correct_skips;

        Self {
            overall_accuracy: ratio(totals.hits + totals.correct_skips, total),
            hit_rate: ratio(totals.hits, positives),
            false_alarm_rate: ratio(totals.false_alarms, negatives),
            mean_rt: if totals.responses == 0 {
                None
            } else {
                Some(totals.rt_sum / f64::from(totals.responses))
            },
        }
    }
}

fn ratio(numerator: u32, denominator: u32) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(f64::from(numerator) * 100.0 / f64::from(denominator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{classify, Outcome};

    #[test]
    fn fresh_totals_leave_every_statistic_undefined() {
        let stats = Statistics::from_totals(&RunningTotals::default());
        assert_eq!(stats.overall_accuracy, None);
        assert_eq!(stats.hit_rate, None);
        assert_eq!(stats.false_alarm_rate, None);
        assert_eq!(stats.mean_rt, None);
    }

    #[test]
    fn scored_trials_grow_by_one_per_classified_trial() {
        let mut totals = RunningTotals::default();
        let trials = [
            (Some(4), Some(2), Some(4)), // hit
            (Some(0), Some(0), None),    // correct skip
            (Some(0), Some(0), Some(1)), // false alarm
            (Some(4), Some(1), None),    // miss
            (None, None, Some(1)),       // instruction row, not scored
        ];
        for (i, (right, left, key)) in trials.iter().enumerate() {
            let before = totals.scored_trials();
            let outcome = classify(*right, *left, *key);
            totals.record(outcome);
            let expected = if outcome.is_scored() { 1 } else { 0 };
            assert_eq!(totals.scored_trials(), before + expected, "trial {i}");
        }
        assert_eq!(totals.scored_trials(), 4);
        assert_eq!(
            (totals.hits, totals.correct_skips, totals.false_alarms, totals.misses),
            (1, 1, 1, 1)
        );
    }

    #[test]
    fn ratios_match_their_definitions() {
        let totals = RunningTotals {
            hits: 3,
            correct_skips: 5,
            false_alarms: 1,
            misses: 1,
            rt_sum: 1.5,
            responses: 4,
        };
        let stats = Statistics::from_totals(&totals);
        assert_eq!(stats.overall_accuracy, Some(80.0));
        assert_eq!(stats.hit_rate, Some(75.0));
        assert_eq!(stats.false_alarm_rate, Some(100.0 / 6.0));
        assert_eq!(stats.mean_rt, Some(0.375));
    }

    #[test]
    fn hit_rate_undefined_without_targets() {
        let mut totals = RunningTotals::default();
        totals.record(Outcome::CorrectSkip);
        totals.record(Outcome::FalseAlarm);
        let stats = Statistics::from_totals(&totals);
        assert_eq!(stats.hit_rate, None);
        assert_eq!(stats.false_alarm_rate, Some(50.0));
        assert_eq!(stats.overall_accuracy, Some(50.0));
    }

    #[test]
    fn false_alarm_rate_undefined_without_non_targets() {
        let mut totals = RunningTotals::default();
        totals.record(Outcome::Hit);
        totals.record(Outcome::Miss);
        let stats = Statistics::from_totals(&totals);
        assert_eq!(stats.false_alarm_rate, None);
        assert_eq!(stats.hit_rate, Some(50.0));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let mut totals = RunningTotals::default();
        totals.record(Outcome::Hit);
        totals.record(Outcome::Miss);
        totals.record_reaction_time(0.42);
        let first = Statistics::from_totals(&totals);
        let second = Statistics::from_totals(&totals);
        assert_eq!(first, second);
    }

    #[test]
    fn reaction_times_accumulate_independently_of_scoring() {
        let mut totals = RunningTotals::default();
        totals.record(Outcome::NoScore);
        totals.record_reaction_time(0.3);
        totals.record_reaction_time(0.5);
        assert_eq!(totals.scored_trials(), 0);
        let stats = Statistics::from_totals(&totals);
        assert_eq!(stats.mean_rt, Some(0.4));
        assert_eq!(stats.overall_accuracy, None);
    }
}
