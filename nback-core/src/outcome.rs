/// Four-way classification of one trial, plus the non-scored case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Instruction row (no expected-left answer): nothing is counted.
    NoScore,
    /// Correct key press when a response was expected.
    Hit,
    /// No key press when a response was expected.
    Miss,
    /// Key press when no response was expected.
    FalseAlarm,
    /// No key press when none was expected.
    CorrectSkip,
}

impl Outcome {
    pub fn is_scored(&self) -> bool {
        !matches!(self, Outcome::NoScore)
    }
}

/// Classify one trial from its expected answers and the first key pressed.
///
/// A press that matches neither expected value while a response was
/// expected counts as a miss, matching the legacy task's fall-through.
/// Whether that reflects experimental intent is an open question; it is
/// kept as-is so scores stay comparable with previously collected data.
pub fn classify(
    expected_right: Option<u32>,
    expected_left: Option<u32>,
    first_key: Option<u32>,
) -> Outcome {
    match (expected_left, first_key) {
        (None, _) => Outcome::NoScore,
        (Some(0), None) => Outcome::CorrectSkip,
        (Some(0), Some(_)) => Outcome::FalseAlarm,
        (Some(left), Some(key)) if key == left || Some(key) == expected_right => Outcome::Hit,
        _ => Outcome::Miss,
    }
}
