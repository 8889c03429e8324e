pub mod deadline;
pub mod timer;

pub use deadline::Deadline;
pub use timer::{HighPrecisionTimer, Timer};
