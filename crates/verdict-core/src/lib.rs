mod context;
mod dataset;
mod error;
mod outcome;
mod runner;

pub use context::{BatchContext, RecordResult};
pub use dataset::load_dataset;
pub use error::BatchError;
pub use outcome::{BatchOutcome, BatchSummary};
pub use runner::BatchRunner;
