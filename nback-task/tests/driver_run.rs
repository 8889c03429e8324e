//! Headless runs of the trial driver against a hand-cranked clock.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use nback_core::{DisplayState, MessageScreen, RunMode, RunPhase};
use nback_task::{TaskConfig, TaskDriver, TaskKey, TrialSequence};
use nback_timing::Timer;

#[derive(Clone, Default)]
struct TestClock {
    now: Rc<Cell<u64>>,
}

impl TestClock {
    fn advance_secs(&self, secs: f64) {
        self.now.set(self.now.get() + (secs * 1e9) as u64);
    }
}

impl Timer for TestClock {
    fn now(&self) -> u64 {
        self.now.get()
    }

    fn sleep(&self, d: Duration) {
        self.now.set(self.now.get() + d.as_nanos() as u64);
    }
}

const PRACTICE_FIXTURE: &str = "\
image_name,trial_dur,corr_resp,corr_resp_left,new_block
stim/instr_0back.png,2.0,,,1
stim/fixation.png,0.5,,,0
stim/B.png,2.0,4,0,0
stim/fixation.png,0.5,,,0
stim/A.png,2.0,4,2,0
stim/fixation.png,0.5,,,0
";

const SCANNER_FIXTURE: &str = "\
image_name,trial_dur,corr_resp,corr_resp_left,new_block,A_or_B
stim/B.png,2.0,4,0,1,A
stim/fixation.png,0.5,,,0,A
stim/C.png,2.0,4,0,0,B
stim/fixation.png,0.5,,,0,B
";

fn driver_for(
    mode: RunMode,
    fixture: &str,
    output_root: &std::path::Path,
    clock: TestClock,
) -> TaskDriver<TestClock> {
    let sequence = TrialSequence::from_reader(fixture.as_bytes()).unwrap();
    let mut config = TaskConfig::new("t01", mode, output_root.join("fixtures"), output_root);
    config.session_date = "2026_Aug_27_0900".to_string();
    TaskDriver::new(config, sequence, clock)
}

/// Drive one (stimulus, fixation) pair to completion, optionally pressing
/// a key partway through the stimulus display.
fn run_pair(
    driver: &mut TaskDriver<TestClock>,
    clock: &TestClock,
    stim_dur: f64,
    fix_dur: f64,
    press: Option<(TaskKey, f64)>,
) {
    driver.update().unwrap(); // arms the stimulus deadline
    match press {
        Some((key, at)) => {
            clock.advance_secs(at);
            driver.handle_key(key);
            clock.advance_secs(stim_dur - at + 0.001);
        }
        None => clock.advance_secs(stim_dur + 0.001),
    }
    driver.update().unwrap(); // stimulus -> fixation
    clock.advance_secs(fix_dur + 0.001);
    driver.update().unwrap(); // fixation -> classified
}

#[test]
fn practice_run_classifies_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::default();
    let mut driver = driver_for(
        RunMode::Practice,
        PRACTICE_FIXTURE,
        dir.path(),
        clock.clone(),
    );

    assert_eq!(driver.phase(), RunPhase::Instructions);
    assert_eq!(
        driver.display(),
        DisplayState::Message(MessageScreen::Instructions)
    );
    driver.handle_key(TaskKey::Space);
    assert_eq!(driver.phase(), RunPhase::Trials);

    // Instruction pair: no press, appended but not scored.
    run_pair(&mut driver, &clock, 2.0, 0.5, None);
    // Non-target: correctly skipped.
    run_pair(&mut driver, &clock, 2.0, 0.5, None);
    // Target (left = 2, right = 4): press 4 at 0.42 s.
    run_pair(&mut driver, &clock, 2.0, 0.5, Some((TaskKey::Digit4, 0.42)));

    driver.update().unwrap(); // end of sequence
    assert_eq!(driver.phase(), RunPhase::Thanks);

    let records = driver.records();
    assert_eq!(records.len(), 3);

    let instr = &records[0];
    assert_eq!(
        (instr.hits, instr.corr_skips, instr.false_alarm, instr.misses),
        (0, 0, 0, 0)
    );
    assert_eq!(instr.overall_accuracy, None);
    // Block clock opened with this pair, at the start of the sequence.
    let block_time = instr.running_time.unwrap();
    assert!(block_time < 0.01, "block clock read {block_time}");

    let skip = &records[1];
    assert_eq!(skip.corr_skips, 1);
    assert_eq!(skip.running_time, None);
    assert_eq!(skip.overall_accuracy, Some(100.0));
    assert_eq!(skip.hit_accuracy, None);
    assert_eq!(skip.false_alarm_rate, Some(0.0));

    let hit = &records[2];
    assert_eq!(hit.hits, 1);
    assert_eq!(hit.subj_key_resp_first, Some(4));
    let rt = hit.rxn_time.unwrap();
    assert!((rt - 0.42).abs() < 1e-6, "rt was {rt}");
    assert_eq!(hit.subj_key_resp, "[[4,0.42]]");
    assert_eq!(hit.total_hits, 1);
    assert_eq!(hit.total_corr_skips, 1);
    assert_eq!(hit.overall_accuracy, Some(100.0));
    assert_eq!(hit.hit_accuracy, Some(100.0));

    // The invariant: totals sum to the number of scored rows.
    let totals = driver.totals();
    assert_eq!(totals.scored_trials(), 2);

    // Both tables hit the disk at run end.
    let trial_path = dir
        .path()
        .join("practice")
        .join("t01_Nback_2026_Aug_27_0900.csv");
    let summary_path = dir
        .path()
        .join("practice")
        .join("t01_Nback_2026_Aug_27_0900_Summary.csv");
    assert!(trial_path.exists());
    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.lines().nth(1).unwrap().starts_with("1,1,0,0,100.0"));

    driver.handle_key(TaskKey::Space);
    assert!(driver.is_done());
}

#[test]
fn press_on_non_target_is_a_false_alarm() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::default();
    let fixture = "\
image_name,trial_dur,corr_resp,corr_resp_left,new_block
stim/B.png,2.0,4,0,1
stim/fixation.png,0.5,,,0
";
    let mut driver = driver_for(RunMode::Practice, fixture, dir.path(), clock.clone());
    driver.handle_key(TaskKey::Digit1); // any task key advances instructions
    run_pair(&mut driver, &clock, 2.0, 0.5, Some((TaskKey::Digit1, 0.3)));

    let record = &driver.records()[0];
    assert_eq!(record.false_alarm, 1);
    assert_eq!(record.hits + record.corr_skips + record.misses, 0);
    assert!((record.rxn_time.unwrap() - 0.3).abs() < 1e-6);
    assert_eq!(record.false_alarm_rate, Some(100.0));
    assert!((record.avg_rxn_time.unwrap() - 0.3).abs() < 1e-6);
}

#[test]
fn wrong_key_and_silence_both_count_as_misses() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::default();
    let fixture = "\
image_name,trial_dur,corr_resp,corr_resp_left,new_block
stim/A.png,2.0,4,2,1
stim/fixation.png,0.5,,,0
stim/C.png,2.0,4,2,0
stim/fixation.png,0.5,,,0
";
    let mut driver = driver_for(RunMode::Practice, fixture, dir.path(), clock.clone());
    driver.handle_key(TaskKey::Space);

    // Wrong key on a target falls through to miss.
    run_pair(&mut driver, &clock, 2.0, 0.5, Some((TaskKey::Digit1, 0.5)));
    // Silence on a target is also a miss.
    run_pair(&mut driver, &clock, 2.0, 0.5, None);

    assert_eq!(driver.totals().misses, 2);
    assert_eq!(driver.totals().scored_trials(), 2);
    assert_eq!(driver.records()[0].hit_accuracy, Some(0.0));
    // The wrong-key press still feeds the reaction-time mean.
    assert!((driver.records()[1].avg_rxn_time.unwrap() - 0.5).abs() < 1e-6);
}

#[test]
fn scanner_pauses_once_before_the_b_half() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::default();
    let mut driver = driver_for(RunMode::Scanner, SCANNER_FIXTURE, dir.path(), clock.clone());

    driver.handle_key(TaskKey::Space); // instructions
    assert_eq!(driver.phase(), RunPhase::ExperimenterWait);
    driver.handle_key(TaskKey::Space);
    assert_eq!(driver.phase(), RunPhase::TriggerWait);
    driver.handle_key(TaskKey::Plus);
    assert_eq!(driver.phase(), RunPhase::Trials);

    run_pair(&mut driver, &clock, 2.0, 0.5, None);
    assert_eq!(driver.records().len(), 1);

    // The B half does not start until the experimenter and trigger
    // screens are acknowledged again.
    driver.update().unwrap();
    assert_eq!(
        driver.display(),
        DisplayState::Message(MessageScreen::ExperimenterWait)
    );
    clock.advance_secs(30.0);
    driver.update().unwrap();
    assert_eq!(driver.records().len(), 1);

    driver.handle_key(TaskKey::Space);
    assert_eq!(
        driver.display(),
        DisplayState::Message(MessageScreen::TriggerWait)
    );
    driver.handle_key(TaskKey::Plus);

    driver.update().unwrap();
    assert_eq!(driver.display(), DisplayState::Stimulus("stim/C.png"));
    clock.advance_secs(2.001);
    driver.update().unwrap();
    assert_eq!(driver.display(), DisplayState::Fixation("stim/fixation.png"));
    clock.advance_secs(0.501);
    driver.update().unwrap();

    driver.update().unwrap();
    assert_eq!(driver.phase(), RunPhase::Thanks);
    assert_eq!(driver.records().len(), 2);
}

#[test]
fn abort_persists_partial_results_without_a_summary() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::default();
    let mut driver = driver_for(
        RunMode::Backup,
        PRACTICE_FIXTURE,
        dir.path(),
        clock.clone(),
    );

    driver.handle_key(TaskKey::Space); // experimenter
    driver.handle_key(TaskKey::Plus); // trigger
    assert_eq!(driver.phase(), RunPhase::Trials);
    run_pair(&mut driver, &clock, 2.0, 0.5, None);

    driver.abort().unwrap();
    assert!(driver.is_done());

    let out_dir = dir.path().join("tfMRI_output").join("backup");
    let trial_path = out_dir.join("t01_Nback_2026_Aug_27_0900.csv");
    let summary_path = out_dir.join("t01_Nback_2026_Aug_27_0900_Summary.csv");
    assert!(trial_path.exists());
    assert!(!summary_path.exists());

    let text = std::fs::read_to_string(&trial_path).unwrap();
    assert_eq!(text.lines().count(), 2); // header plus the one collected row
}

#[test]
fn responses_during_fixation_still_count() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::default();
    let fixture = "\
image_name,trial_dur,corr_resp,corr_resp_left,new_block
stim/A.png,2.0,4,2,1
stim/fixation.png,0.5,,,0
";
    let mut driver = driver_for(RunMode::Practice, fixture, dir.path(), clock.clone());
    driver.handle_key(TaskKey::Space);

    driver.update().unwrap();
    clock.advance_secs(2.001);
    driver.update().unwrap(); // fixation showing, window still open
    clock.advance_secs(0.2);
    driver.handle_key(TaskKey::Digit4);
    clock.advance_secs(0.301);
    driver.update().unwrap();

    let record = &driver.records()[0];
    assert_eq!(record.hits, 1);
    // Reaction time stays anchored at stimulus onset.
    assert!((record.rxn_time.unwrap() - 2.201).abs() < 1e-3);
}

#[test]
fn pacing_sleeps_toward_the_stimulus_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::default();
    let mut driver = driver_for(
        RunMode::Practice,
        PRACTICE_FIXTURE,
        dir.path(),
        clock.clone(),
    );
    driver.handle_key(TaskKey::Space);
    driver.update().unwrap(); // arms the 2 s stimulus deadline

    // Each pump iteration sleeps one capped slice on the timer.
    let before = clock.now();
    for _ in 0..50 {
        driver.pace();
        driver.update().unwrap();
    }
    let slept = (clock.now() - before) as f64 / 1e9;
    assert!((slept - 0.1).abs() < 1e-9, "slept {slept}");
    assert_eq!(driver.display(), DisplayState::Stimulus("stim/instr_0back.png"));

    // Once the deadline is within the cap, the sleep lands exactly on it.
    clock.advance_secs(1.899);
    driver.pace();
    driver.update().unwrap();
    assert_eq!(driver.display(), DisplayState::Fixation("stim/fixation.png"));
}
