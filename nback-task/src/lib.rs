pub mod config;
pub mod driver;
pub mod fixture;
pub mod output;

pub use config::TaskConfig;
pub use driver::{TaskDriver, TaskKey};
pub use fixture::TrialSequence;
pub use output::ResultsWriter;
