pub mod display;
pub mod outcome;
pub mod phase;
pub mod record;
pub mod response;
pub mod stats;
pub mod trial;

pub use display::{DisplayState, MessageScreen};
pub use outcome::{classify, Outcome};
pub use phase::{RunMode, RunPhase};
pub use record::{SummaryRecord, TrialRecord};
pub use response::{KeyPress, ObservedResponse};
pub use stats::{RunningTotals, Statistics, TrialCounts};
pub use trial::{RunHalf, TrialPair, TrialRow, TrialState};
