use serde::{Deserialize, Serialize};

/// One filtered key press with its time since stimulus onset, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: u32,
    pub rt_seconds: f64,
}

/// Everything the subject did during one trial's response window. Built up
/// while the window is open, never mutated after it closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedResponse {
    presses: Vec<KeyPress>,
}

impl ObservedResponse {
    pub fn new(presses: Vec<KeyPress>) -> Self {
        Self { presses }
    }

    pub fn presses(&self) -> &[KeyPress] {
        &self.presses
    }

    /// First key pressed in the window, if any.
    pub fn first_key(&self) -> Option<u32> {
        self.presses.first().map(|p| p.key)
    }

    /// Reaction time of the first key press.
    pub fn reaction_time(&self) -> Option<f64> {
        self.presses.first().map(|p| p.rt_seconds)
    }

    pub fn is_empty(&self) -> bool {
        self.presses.is_empty()
    }
}
