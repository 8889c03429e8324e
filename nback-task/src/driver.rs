use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use nback_core::{
    classify, DisplayState, KeyPress, MessageScreen, ObservedResponse, RunHalf, RunMode, RunPhase,
    RunningTotals, Statistics, SummaryRecord, TrialPair, TrialRecord, TrialState,
};
use nback_timing::{Deadline, Timer};

use crate::config::TaskConfig;
use crate::fixture::TrialSequence;
use crate::output::ResultsWriter;

const NS_PER_SEC: f64 = 1_000_000_000.0;

/// Keys the task reacts to, after the front end has mapped raw keyboard
/// input. Digits 1 and 4 are the response buttons; 2 and 3 only advance
/// the instruction screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKey {
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Space,
    Plus,
}

impl TaskKey {
    fn response_value(self) -> Option<u32> {
        match self {
            TaskKey::Digit1 => Some(1),
            TaskKey::Digit4 => Some(4),
            _ => None,
        }
    }

    fn advances_instructions(self) -> bool {
        matches!(
            self,
            TaskKey::Digit1 | TaskKey::Digit2 | TaskKey::Digit3 | TaskKey::Digit4 | TaskKey::Space
        )
    }
}

/// Scanner-mode mid-run pause: the experimenter screen, then the trigger
/// screen, then the B half continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PauseStep {
    Experimenter,
    Trigger,
}

#[derive(Debug)]
struct ActiveTrial {
    state: TrialState,
    /// Stimulus onset; response timestamps are measured from here.
    onset_ns: u64,
    deadline: Deadline,
    presses: Vec<KeyPress>,
    /// Block clock reading, only on block-opening trials.
    running_time: Option<f64>,
}

/// Sequences one run: screens, trial pairs, classification, persistence.
/// Pumped from the outside; `update` is called once per front-end frame
/// and `handle_key` whenever a mapped key goes down, so the whole thing
/// runs against a fake clock with no display attached.
pub struct TaskDriver<T: Timer> {
    config: TaskConfig,
    timer: T,
    sequence: TrialSequence,
    phase: RunPhase,
    pause: Option<PauseStep>,
    pause_taken: bool,
    pair_index: usize,
    trial: Option<ActiveTrial>,
    totals: RunningTotals,
    writer: ResultsWriter,
    block_clock_start: Option<u64>,
}

impl<T: Timer> TaskDriver<T> {
    pub fn new(config: TaskConfig, sequence: TrialSequence, timer: T) -> Self {
        let writer = ResultsWriter::new(config.trial_output_path(), config.summary_output_path());
        let phase = RunPhase::first(config.mode);
        info!(
            "starting {} run for participant {}: {} trial pairs",
            config.mode.as_str(),
            config.participant,
            sequence.len()
        );
        Self {
            config,
            timer,
            sequence,
            phase,
            pause: None,
            pause_taken: false,
            pair_index: 0,
            trial: None,
            totals: RunningTotals::default(),
            writer,
            block_clock_start: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase.is_done()
    }

    pub fn totals(&self) -> &RunningTotals {
        &self.totals
    }

    pub fn records(&self) -> &[TrialRecord] {
        self.writer.records()
    }

    /// What the front end should draw right now.
    pub fn display(&self) -> DisplayState<'_> {
        match self.phase {
            RunPhase::Instructions => DisplayState::Message(MessageScreen::Instructions),
            RunPhase::ExperimenterWait => DisplayState::Message(MessageScreen::ExperimenterWait),
            RunPhase::TriggerWait => DisplayState::Message(MessageScreen::TriggerWait),
            RunPhase::Thanks => DisplayState::Message(MessageScreen::Thanks),
            RunPhase::Done => DisplayState::Blank,
            RunPhase::Trials => match (&self.pause, &self.trial) {
                (Some(PauseStep::Experimenter), _) => {
                    DisplayState::Message(MessageScreen::ExperimenterWait)
                }
                (Some(PauseStep::Trigger), _) => DisplayState::Message(MessageScreen::TriggerWait),
                (None, Some(trial)) => {
                    let pair = &self.sequence.pairs()[self.pair_index];
                    match trial.state {
                        TrialState::Stimulus => DisplayState::Stimulus(&pair.stimulus.image_name),
                        TrialState::Fixation => DisplayState::Fixation(&pair.fixation.image_name),
                    }
                }
                (None, None) => DisplayState::Blank,
            },
        }
    }

    /// Advance deadlines. Call once per pump iteration; this is also where
    /// the end of the sequence is detected and the tables get written.
    pub fn update(&mut self) -> Result<()> {
        if !self.phase.is_trials() || self.pause.is_some() {
            return Ok(());
        }
        let now = self.timer.now();

        let (state, expired) = match &self.trial {
            None => return self.begin_pair(now),
            Some(trial) => (trial.state, trial.deadline.expired(now)),
        };
        if !expired {
            return Ok(());
        }

        match state {
            TrialState::Stimulus => {
                let fixation_dur = self.sequence.pairs()[self.pair_index].fixation.trial_dur;
                if let Some(trial) = &mut self.trial {
                    trial.state = TrialState::Fixation;
                    trial.deadline = Deadline::after_secs(now, fixation_dur);
                }
                Ok(())
            }
            TrialState::Fixation => self.complete_trial(),
        }
    }

    /// Back off between pump iterations. Fixture durations land between
    /// frames, so an unexpired deadline is slept toward with the precise
    /// timer instead of spinning; the cap keeps key latency bounded, since
    /// input only arrives between calls.
    pub fn pace(&self) {
        const CAP: Duration = Duration::from_millis(2);
        let wait = match &self.trial {
            Some(trial) if self.phase.is_trials() && self.pause.is_none() => {
                trial.deadline.remaining(self.timer.now()).min(CAP)
            }
            _ => CAP,
        };
        if !wait.is_zero() {
            self.timer.sleep(wait);
        }
    }

    pub fn handle_key(&mut self, key: TaskKey) {
        match self.phase {
            RunPhase::Instructions if key.advances_instructions() => self.advance_phase(),
            RunPhase::ExperimenterWait if key == TaskKey::Space => self.advance_phase(),
            RunPhase::TriggerWait if matches!(key, TaskKey::Plus | TaskKey::Space) => {
                self.advance_phase()
            }
            RunPhase::Trials => self.handle_trials_key(key),
            RunPhase::Thanks if key == TaskKey::Space => {
                self.phase = RunPhase::Done;
            }
            _ => {}
        }
    }

    /// User-initiated abort: persist what has been collected and stop.
    /// Normal termination, not an error.
    pub fn abort(&mut self) -> Result<()> {
        info!(
            "run aborted; flushing {} collected trial rows",
            self.writer.records().len()
        );
        self.writer.flush_partial()?;
        self.phase = RunPhase::Done;
        Ok(())
    }

    fn handle_trials_key(&mut self, key: TaskKey) {
        match self.pause {
            Some(PauseStep::Experimenter) => {
                if key == TaskKey::Space {
                    self.pause = Some(PauseStep::Trigger);
                }
            }
            Some(PauseStep::Trigger) => {
                if matches!(key, TaskKey::Plus | TaskKey::Space) {
                    debug!("trigger received, resuming trials");
                    self.pause = None;
                }
            }
            None => {
                let Some(value) = key.response_value() else {
                    return;
                };
                let now = self.timer.now();
                if let Some(trial) = &mut self.trial {
                    let rt_seconds = (now.saturating_sub(trial.onset_ns)) as f64 / NS_PER_SEC;
                    trial.presses.push(KeyPress {
                        key: value,
                        rt_seconds,
                    });
                }
            }
        }
    }

    fn advance_phase(&mut self) {
        self.phase = self.phase.next(self.config.mode);
        debug!("phase -> {:?}", self.phase);
        if self.phase.is_trials() {
            self.block_clock_start = Some(self.timer.now());
        }
    }

    fn begin_pair(&mut self, now: u64) -> Result<()> {
        if self.pair_index >= self.sequence.len() {
            return self.finish();
        }

        let pair = &self.sequence.pairs()[self.pair_index];
        if self.should_pause_before(pair) {
            info!("reached B half, pausing for experimenter and trigger");
            self.pause = Some(PauseStep::Experimenter);
            self.pause_taken = true;
            return Ok(());
        }

        let running_time = if pair.stimulus.opens_block() {
            let start = self.block_clock_start.unwrap_or(now);
            Some(now.saturating_sub(start) as f64 / NS_PER_SEC)
        } else {
            None
        };

        debug!(
            "pair {}: stimulus {} for {}s",
            self.pair_index, pair.stimulus.image_name, pair.stimulus.trial_dur
        );
        self.trial = Some(ActiveTrial {
            state: TrialState::Stimulus,
            onset_ns: now,
            deadline: Deadline::after_secs(now, pair.stimulus.trial_dur),
            presses: Vec::new(),
            running_time,
        });
        Ok(())
    }

    fn should_pause_before(&self, pair: &TrialPair) -> bool {
        self.config.mode == RunMode::Scanner
            && !self.pause_taken
            && pair.stimulus.run_half == Some(RunHalf::B)
    }

    /// Close the response window, classify, and append the output row.
    fn complete_trial(&mut self) -> Result<()> {
        let Some(trial) = self.trial.take() else {
            return Ok(());
        };
        let pair = &self.sequence.pairs()[self.pair_index];
        let response = ObservedResponse::new(trial.presses);

        if let Some(rt) = response.reaction_time() {
            self.totals.record_reaction_time(rt);
        }

        let outcome = classify(
            pair.stimulus.corr_resp,
            pair.stimulus.corr_resp_left,
            response.first_key(),
        );
        let counts = self.totals.record(outcome);
        let stats = Statistics::from_totals(&self.totals);
        debug!(
            "pair {} -> {:?}, totals {}/{}/{}/{}",
            self.pair_index,
            outcome,
            self.totals.hits,
            self.totals.correct_skips,
            self.totals.false_alarms,
            self.totals.misses
        );

        let raw: Vec<(u32, f64)> = response
            .presses()
            .iter()
            .map(|p| (p.key, p.rt_seconds))
            .collect();
        let record = TrialRecord {
            trial: self.writer.next_index(),
            subj_key_resp: serde_json::to_string(&raw)?,
            subj_key_resp_first: response.first_key(),
            rxn_time: response.reaction_time(),
            corr_resp: pair.stimulus.corr_resp,
            corr_resp_left: pair.stimulus.corr_resp_left,
            running_time: trial.running_time,
            hits: counts.hits,
            corr_skips: counts.correct_skips,
            false_alarm: counts.false_alarms,
            misses: counts.misses,
            total_hits: self.totals.hits,
            total_corr_skips: self.totals.correct_skips,
            total_false_alarm: self.totals.false_alarms,
            total_misses: self.totals.misses,
            overall_accuracy: stats.overall_accuracy,
            hit_accuracy: stats.hit_rate,
            false_alarm_rate: stats.false_alarm_rate,
            avg_rxn_time: stats.mean_rt,
        };
        self.writer.push(record);
        self.pair_index += 1;
        Ok(())
    }

    /// End of the sequence: write both tables and show the thanks screen.
    fn finish(&mut self) -> Result<()> {
        let stats = Statistics::from_totals(&self.totals);
        let summary = SummaryRecord::new(&self.totals, &stats);
        self.writer.finish(&summary)?;
        info!(
            "run complete: {} hits, {} skips, {} false alarms, {} misses",
            self.totals.hits,
            self.totals.correct_skips,
            self.totals.false_alarms,
            self.totals.misses
        );
        self.phase = RunPhase::Thanks;
        Ok(())
    }
}
